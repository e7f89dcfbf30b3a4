//! BLAKE3 cache keys: the configured prefix followed by 16 hex digits.

use crate::{Props, Value};

const KEY_HEX_LEN: usize = 16;

fn finish(prefix: &str, hasher: &blake3::Hasher) -> String {
    let hex = hasher.finalize().to_hex();
    let mut key = String::with_capacity(prefix.len() + KEY_HEX_LEN);
    key.push_str(prefix);
    key.push_str(&hex[..KEY_HEX_LEN]);
    key
}

fn feed(hasher: &mut blake3::Hasher, property: &str, value: &Value) {
    hasher.update(property.as_bytes());
    hasher.update(&[0]);
    hasher.update(value.fingerprint_text().as_bytes());
    hasher.update(&[0]);
}

/// Key for one property's value.
pub(crate) fn value_key(prefix: &str, property: &str, value: &Value) -> String {
    let mut hasher = blake3::Hasher::new();
    feed(&mut hasher, property, value);
    finish(prefix, &hasher)
}

/// Key over the values of every property in `properties`.
pub(crate) fn dependency_key(prefix: &str, properties: &[String], props: &Props) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"deps\0");
    for property in properties {
        feed(&mut hasher, property, props.get(property));
    }
    finish(prefix, &hasher)
}

/// Content address of a block of text.
pub(crate) fn content_key(prefix: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    finish(prefix, &hasher)
}
