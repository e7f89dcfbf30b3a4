use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::condition::{Fact, Test};
use super::error::CompileError;
use super::props::Props;
use super::rule::{Block, DependentRules, Rule};

/// Output values and key format of a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemeOptions {
    /// Value of an active flag. `initial` makes `var(--flag, x)` fall back to `x`.
    pub on: String,
    /// Value of an inactive flag. A single space makes `var(--flag, x)` empty.
    pub off: String,
    /// Prepended to every generated cache key.
    pub key_prefix: String,
}

impl Default for SchemeOptions {
    fn default() -> Self {
        Self {
            on: "initial".to_owned(),
            off: " ".to_owned(),
            key_prefix: "c".to_owned(),
        }
    }
}

/// Builder for a [`Scheme`] with non-default [`SchemeOptions`].
///
/// # Example
///
/// ```
/// use condstyle::Scheme;
///
/// let scheme = Scheme::builder("button")
///     .on("initial")
///     .off(" ")
///     .key_prefix("btn-")
///     .build();
/// assert_eq!(scheme.options().key_prefix, "btn-");
/// ```
#[derive(Debug)]
pub struct SchemeBuilder {
    name: String,
    options: SchemeOptions,
}

impl SchemeBuilder {
    #[must_use]
    pub fn on(mut self, value: impl Into<String>) -> Self {
        self.options.on = value.into();
        self
    }

    #[must_use]
    pub fn off(mut self, value: impl Into<String>) -> Self {
        self.options.off = value.into();
        self
    }

    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.key_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn build(self) -> Scheme {
        Scheme {
            name: self.name,
            options: self.options,
            properties: BTreeSet::new(),
            conditions: BTreeMap::new(),
            prepared: BTreeMap::new(),
        }
    }
}

/// One named scope in its accumulation phase.
///
/// Parsing registers facts and prepared conditions here. Once every source
/// has been parsed, [`prepare_styles`](Self::prepare_styles) consumes the
/// scheme and compiles it into a [`CompiledScheme`].
#[derive(Debug, Clone)]
pub struct Scheme {
    pub(crate) name: String,
    pub(crate) options: SchemeOptions,
    pub(crate) properties: BTreeSet<String>,
    pub(crate) conditions: BTreeMap<String, BTreeSet<Test>>,
    pub(crate) prepared: BTreeMap<String, String>,
}

impl Scheme {
    /// A scheme with default options.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemeBuilder {
        SchemeBuilder {
            name: name.into(),
            options: SchemeOptions::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &SchemeOptions {
        &self.options
    }

    /// Register a fact. Facts are deduplicated; a fact that reads another
    /// property registers that property too.
    pub fn add_condition(&mut self, fact: Fact) {
        if let Some(dependency) = fact.dependency() {
            self.properties.insert(dependency.to_owned());
        }
        self.properties.insert(fact.property.clone());
        self.conditions
            .entry(fact.property)
            .or_default()
            .insert(fact.test);
    }

    /// Register a named, pre-serialized condition value. A later value for
    /// the same name replaces the earlier one.
    pub fn add_prepared_condition(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.prepared.insert(name.into(), value.into());
    }

    /// Every property referenced so far, sorted.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }

    /// Every registered fact, sorted by property then test.
    pub fn conditions(&self) -> impl Iterator<Item = Fact> + '_ {
        self.conditions.iter().flat_map(|(property, tests)| {
            tests.iter().map(move |test| Fact {
                property: property.clone(),
                test: test.clone(),
            })
        })
    }

    #[must_use]
    pub fn has_condition(&self, fact: &Fact) -> bool {
        self.conditions
            .get(&fact.property)
            .is_some_and(|tests| tests.contains(&fact.test))
    }

    #[must_use]
    pub fn prepared_condition(&self, name: &str) -> Option<&str> {
        self.prepared.get(name).map(String::as_str)
    }

    /// Every prepared condition, sorted by name.
    pub fn prepared_conditions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prepared.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compile the accumulated facts into rules and the base block.
    #[must_use]
    pub fn prepare_styles(self) -> CompiledScheme {
        crate::compile::compile(self)
    }
}

/// Result of [`CompiledScheme::serialize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Serialized {
    /// Space-separated keys of every per-property block that applies.
    pub matched: String,
    /// Keys of the dependent blocks, one per property with dependent rules.
    pub dependencies: Vec<String>,
}

/// A compiled scheme: per-property rules plus an append-only,
/// content-addressed declaration cache.
///
/// `serialize` takes `&mut self` because it fills the cache. Wrap the scheme
/// in a lock to share it across threads.
#[derive(Debug)]
pub struct CompiledScheme {
    pub(crate) name: String,
    pub(crate) options: SchemeOptions,
    pub(crate) properties: BTreeSet<String>,
    pub(crate) rules: BTreeMap<String, Vec<Rule>>,
    pub(crate) dependents: BTreeMap<String, DependentRules>,
    pub(crate) base_key: String,
    pub(crate) blocks: Vec<Block>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) flushed: usize,
}

impl CompiledScheme {
    /// Serialize a property bag into matched cache keys, generating any
    /// block not seen before.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnregisteredProperty`] if the bag holds a
    /// property no condition ever referenced.
    #[tracing::instrument(level = "trace", skip_all, fields(scheme = %self.name))]
    pub fn serialize(&mut self, props: &Props) -> Result<Serialized, CompileError> {
        if let Some((property, _)) = props.iter().find(|(p, _)| !self.properties.contains(*p)) {
            return Err(CompileError::UnregisteredProperty {
                scheme: self.name.clone(),
                property: property.to_owned(),
            });
        }

        // Blocks are generated from key representatives only.
        let props = &props.normalized();
        let mut out = Serialized::default();
        for (property, value) in props.iter() {
            if let Some(rules) = self.rules.get(property) {
                let key = crate::fingerprint::value_key(&self.options.key_prefix, property, value);
                if !self.index.contains_key(&key) {
                    let mut declarations = crate::evaluate::Declarations::new(&self.options);
                    crate::evaluate::apply(rules, props, &mut declarations);
                    let declarations = declarations.finish();
                    tracing::debug!(%property, %key, "generated block");
                    self.insert(key.clone(), declarations);
                }
                if !out.matched.is_empty() {
                    out.matched.push(' ');
                }
                out.matched.push_str(&key);
            }

            if let Some(dependent) = self.dependents.get(property) {
                let key = crate::fingerprint::dependency_key(
                    &self.options.key_prefix,
                    &dependent.properties,
                    props,
                );
                if !self.index.contains_key(&key) {
                    let mut declarations = crate::evaluate::Declarations::new(&self.options);
                    crate::evaluate::apply(&dependent.rules, props, &mut declarations);
                    let declarations = declarations.finish();
                    tracing::debug!(%property, %key, "generated dependent block");
                    self.insert(key.clone(), declarations);
                }
                out.dependencies.push(key);
            }
        }
        Ok(out)
    }

    pub(crate) fn insert(&mut self, key: String, declarations: String) {
        self.index.insert(key.clone(), self.blocks.len());
        self.blocks.push(Block { key, declarations });
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &SchemeOptions {
        &self.options
    }

    /// The block holding prepared conditions and every flag's default state.
    #[must_use]
    pub fn base(&self) -> &Block {
        // The base block is inserted first by `compile` and never removed.
        &self.blocks[0]
    }

    #[must_use]
    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    /// The compiled rules of one property.
    #[must_use]
    pub fn rules(&self, property: &str) -> Option<&[Rule]> {
        self.rules.get(property).map(Vec::as_slice)
    }

    #[must_use]
    pub fn dependent_rules(&self, property: &str) -> Option<&DependentRules> {
        self.dependents.get(property)
    }

    #[must_use]
    pub fn block(&self, key: &str) -> Option<&Block> {
        self.index.get(key).map(|&i| &self.blocks[i])
    }

    /// Every block in creation order, base block first.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks created since the last flush, in creation order.
    pub fn flush(&mut self) -> &[Block] {
        let start = self.flushed;
        self.flushed = self.blocks.len();
        &self.blocks[start..]
    }
}

impl fmt::Display for CompiledScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledScheme({}: {} properties, {} rules, {} blocks)",
            self.name,
            self.properties.len(),
            self.rules.values().map(Vec::len).sum::<usize>(),
            self.blocks.len(),
        )
    }
}

#[cfg(feature = "binary-cache")]
impl CompiledScheme {
    /// Serialize the compiled rules and the declaration cache to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self)
    }

    /// Restore a scheme previously written by [`to_bytes`](Self::to_bytes).
    /// Every restored block counts as already flushed.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize and write to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file written by [`to_binary_file`](Self::to_binary_file).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompareOp, Literal, Operand};

    fn large() -> Operand {
        Operand::Literal(Literal::string("large"))
    }

    #[test]
    fn builder_sets_options() {
        let scheme = Scheme::builder("button")
            .on("1")
            .off("0")
            .key_prefix("b")
            .build();
        assert_eq!(scheme.name(), "button");
        assert_eq!(
            scheme.options(),
            &SchemeOptions {
                on: "1".into(),
                off: "0".into(),
                key_prefix: "b".into(),
            }
        );
    }

    #[test]
    fn conditions_are_deduplicated() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare("size", CompareOp::Eq, large()));
        scheme.add_condition(Fact::compare("size", CompareOp::Eq, large()));
        scheme.add_condition(Fact::truthy("disabled", true));
        assert_eq!(scheme.conditions().count(), 2);
        assert!(scheme.has_condition(&Fact::truthy("disabled", true)));
        assert!(!scheme.has_condition(&Fact::truthy("disabled", false)));
        assert_eq!(scheme.properties().collect::<Vec<_>>(), ["disabled", "size"]);
    }

    #[test]
    fn dependency_is_registered_as_property() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare(
            "a",
            CompareOp::Gt,
            Operand::Property {
                name: "b".into(),
                negated: false,
            },
        ));
        assert_eq!(scheme.properties().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn prepared_conditions_replace() {
        let mut scheme = Scheme::new("s");
        scheme.add_prepared_condition("if-a∧b", "x");
        scheme.add_prepared_condition("if-a∧b", "var(--a,var(--b))");
        assert_eq!(scheme.prepared_condition("if-a∧b"), Some("var(--a,var(--b))"));
        assert_eq!(scheme.prepared_conditions().count(), 1);
    }

    #[test]
    fn serialize_rejects_unregistered_property() {
        let mut scheme = Scheme::new("button");
        scheme.add_condition(Fact::truthy("disabled", false));
        let mut compiled = scheme.prepare_styles();
        let err = compiled
            .serialize(&Props::new().set("size", "large"))
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnregisteredProperty {
                scheme: "button".into(),
                property: "size".into(),
            }
        );
    }

    #[test]
    fn serialize_generates_each_block_once() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare("size", CompareOp::Eq, large()));
        let mut compiled = scheme.prepare_styles();
        assert_eq!(compiled.flush().len(), 1);

        let props = Props::new().set("size", "large");
        let first = compiled.serialize(&props).unwrap();
        let second = compiled.serialize(&props).unwrap();
        assert_eq!(first, second);
        assert_eq!(compiled.blocks().len(), 2);

        let fresh = compiled.flush();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].key, first.matched);
        assert!(compiled.flush().is_empty());
    }

    #[test]
    fn matched_keys_are_sorted_by_property() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::truthy("b", false));
        scheme.add_condition(Fact::truthy("a", false));
        let mut compiled = scheme.prepare_styles();
        let one = compiled
            .serialize(&Props::new().set("b", true).set("a", false))
            .unwrap();
        let two = compiled
            .serialize(&Props::new().set("a", false).set("b", true))
            .unwrap();
        assert_eq!(one, two);
        assert_eq!(one.matched.split(' ').count(), 2);
    }

    #[test]
    fn dependent_rules_produce_dependency_key() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare(
            "a",
            CompareOp::Lt,
            Operand::Property {
                name: "b".into(),
                negated: false,
            },
        ));
        let mut compiled = scheme.prepare_styles();
        let out = compiled
            .serialize(&Props::new().set("a", 1).set("b", 2))
            .unwrap();
        assert!(out.matched.is_empty());
        assert_eq!(out.dependencies.len(), 1);
        let block = compiled.block(&out.dependencies[0]).unwrap();
        assert_eq!(block.declarations, "--a⋖b:initial;");
    }
}
