//! Binary snapshots of compiled schemes.
//!
//! A snapshot holds the compiled rules and the whole declaration cache, so
//! a warm cache survives restarts. The format is a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"CSTY"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Block, CompiledScheme, DependentRules, Rule, SchemeOptions};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"CSTY";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`CompiledScheme`] to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode scheme: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`CompiledScheme`] from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a condstyle snapshot: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemeSnapshot {
    metadata: SnapshotMetadata,
    name: String,
    options: SchemeOptions,
    properties: Vec<String>,
    rules: BTreeMap<String, Vec<Rule>>,
    dependents: BTreeMap<String, DependentRules>,
    base_key: String,
    blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotMetadata {
    property_count: usize,
    rule_count: usize,
    block_count: usize,
}

fn scheme_to_snapshot(scheme: &CompiledScheme) -> SchemeSnapshot {
    SchemeSnapshot {
        metadata: SnapshotMetadata {
            property_count: scheme.properties.len(),
            rule_count: scheme.rules.values().map(Vec::len).sum(),
            block_count: scheme.blocks.len(),
        },
        name: scheme.name.clone(),
        options: scheme.options.clone(),
        properties: scheme.properties.iter().cloned().collect(),
        rules: scheme.rules.clone(),
        dependents: scheme.dependents.clone(),
        base_key: scheme.base_key.clone(),
        blocks: scheme.blocks.clone(),
    }
}

fn snapshot_to_scheme(snapshot: SchemeSnapshot) -> Result<CompiledScheme, DeserializeError> {
    validate(&snapshot)?;

    let index = snapshot
        .blocks
        .iter()
        .enumerate()
        .map(|(i, block)| (block.key.clone(), i))
        .collect();
    let flushed = snapshot.blocks.len();

    Ok(CompiledScheme {
        name: snapshot.name,
        options: snapshot.options,
        properties: snapshot.properties.into_iter().collect(),
        rules: snapshot.rules,
        dependents: snapshot.dependents,
        base_key: snapshot.base_key,
        blocks: snapshot.blocks,
        index,
        flushed,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(message: impl Into<String>) -> DeserializeError {
    DeserializeError::Validation(message.into())
}

fn validate(snapshot: &SchemeSnapshot) -> Result<(), DeserializeError> {
    let properties: BTreeSet<&str> = snapshot.properties.iter().map(String::as_str).collect();

    // Metadata consistency
    if snapshot.metadata.property_count != snapshot.properties.len() {
        return Err(invalid(format!(
            "metadata says {} properties but payload has {}",
            snapshot.metadata.property_count,
            snapshot.properties.len()
        )));
    }
    if properties.len() != snapshot.properties.len() {
        return Err(invalid("duplicate property names"));
    }
    let rule_count: usize = snapshot.rules.values().map(Vec::len).sum();
    if snapshot.metadata.rule_count != rule_count {
        return Err(invalid(format!(
            "metadata says {} rules but payload has {rule_count}",
            snapshot.metadata.rule_count
        )));
    }
    if snapshot.metadata.block_count != snapshot.blocks.len() {
        return Err(invalid(format!(
            "metadata says {} blocks but payload has {}",
            snapshot.metadata.block_count,
            snapshot.blocks.len()
        )));
    }

    // The base block comes first
    match snapshot.blocks.first() {
        Some(base) if base.key == snapshot.base_key => {}
        Some(base) => {
            return Err(invalid(format!(
                "first block '{}' is not the base block '{}'",
                base.key, snapshot.base_key
            )));
        }
        None => return Err(invalid("snapshot has no base block")),
    }

    // Cache keys are unique and carry the scheme's prefix
    let mut keys = HashSet::with_capacity(snapshot.blocks.len());
    for block in &snapshot.blocks {
        if !block.key.starts_with(&snapshot.options.key_prefix) {
            return Err(invalid(format!(
                "block key '{}' lacks prefix '{}'",
                block.key, snapshot.options.key_prefix
            )));
        }
        if !keys.insert(block.key.as_str()) {
            return Err(invalid(format!("duplicate block key '{}'", block.key)));
        }
    }

    // Rules only read registered properties
    for (property, rules) in &snapshot.rules {
        validate_rules(property, rules, &properties)?;
    }
    for (property, dependent) in &snapshot.dependents {
        validate_rules(property, &dependent.rules, &properties)?;
        if !dependent.properties.windows(2).all(|w| w[0] < w[1]) {
            return Err(invalid(format!(
                "dependency list of '{property}' is not sorted"
            )));
        }
        for name in &dependent.properties {
            if !properties.contains(name.as_str()) {
                return Err(invalid(format!(
                    "dependency '{name}' of '{property}' is not registered"
                )));
            }
        }
    }

    Ok(())
}

fn validate_rules(
    property: &str,
    rules: &[Rule],
    properties: &BTreeSet<&str>,
) -> Result<(), DeserializeError> {
    if !properties.contains(property) {
        return Err(invalid(format!(
            "rules for unregistered property '{property}'"
        )));
    }
    for rule in rules {
        if rule.property() != property {
            return Err(invalid(format!(
                "rule '{rule}' filed under property '{property}'"
            )));
        }
        if let Some(other) = rule.dependency() {
            if !properties.contains(other) {
                return Err(invalid(format!(
                    "rule '{rule}' reads unregistered property '{other}'"
                )));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version (informational, not used for checks)
    // bytes[8..12] is flags (reserved)
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

fn encode_snapshot(snapshot: &SchemeSnapshot) -> Result<Vec<u8>, SerializeError> {
    let payload = bincode::serde::encode_to_vec(snapshot, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn encode(scheme: &CompiledScheme) -> Result<Vec<u8>, SerializeError> {
    encode_snapshot(&scheme_to_snapshot(scheme))
}

pub(crate) fn decode(bytes: &[u8]) -> Result<CompiledScheme, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_start = HEADER_SIZE;
    let payload_end = payload_start + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[payload_start..payload_end];

    // Integrity check
    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (snapshot, _): (SchemeSnapshot, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    snapshot_to_scheme(snapshot)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
