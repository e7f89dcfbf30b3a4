use std::collections::BTreeMap;

use super::Value;

static UNDEFINED: Value = Value::Undefined;

/// Runtime property bag mapping property names to [`Value`]s.
///
/// Iteration is always in name order, so anything derived from a bag (cache
/// keys, matched markers) is independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    data: BTreeMap<String, Value>,
}

impl Props {
    /// Create an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property. A later value for the same name replaces the earlier one.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Insert a property (mutable reference version).
    pub fn insert(&mut self, name: &str, value: Value) {
        self.data.insert(name.to_owned(), value);
    }

    /// Look up a property. Missing properties read as [`Value::Undefined`].
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.data.get(name).unwrap_or(&UNDEFINED)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A copy with every value replaced by its cache-key representative.
    #[must_use]
    pub(crate) fn normalized(&self) -> Self {
        Self {
            data: self
                .data
                .iter()
                .map(|(k, v)| (k.clone(), v.normalized()))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
