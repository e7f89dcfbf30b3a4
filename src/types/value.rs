use std::cmp::Ordering;
use std::fmt;

use super::op::CompareOp;

/// A runtime property value, as supplied by the consumer at query time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The property is absent.
    Undefined,
    Null,
    Bool(bool),
    /// All numbers are 64-bit floats.
    Number(f64),
    String(String),
    /// An opaque callable, identified only by name.
    Function(String),
}

impl Value {
    /// `false`, `0`, `NaN`, `''`, `null` and undefined are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Function(_) => true,
        }
    }

    /// The `typeof` class name of this value.
    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    /// Equality without coercion between types, except that `null` and
    /// undefined are equal to each other.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }

    /// Compare this value to another using the given operator.
    /// Ordering operators are `false` for values that have no common order.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Value) -> bool {
        match op {
            CompareOp::Eq => self.loose_eq(other),
            CompareOp::Neq => !self.loose_eq(other),
            _ => self.partial_cmp_value(other).is_some_and(|ord| match op {
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Gte => ord != Ordering::Less,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Lte => ord != Ordering::Greater,
                CompareOp::Eq | CompareOp::Neq => unreachable!("handled above"),
            }),
        }
    }

    fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// The representative of this value's cache key. The empty string reads
    /// as undefined and every function as one anonymous function, so rules
    /// evaluated on it agree for all values sharing a key.
    #[must_use]
    pub(crate) fn normalized(&self) -> Value {
        match self {
            Value::String(s) if s.is_empty() => Value::Undefined,
            Value::Function(_) => Value::Function(String::new()),
            other => other.clone(),
        }
    }

    /// Type-tagged text used for cache fingerprints. Undefined and the empty
    /// string share one sentinel, every function shares another.
    pub(crate) fn fingerprint_text(&self) -> String {
        match self {
            Value::Undefined => EMPTY_SENTINEL.to_owned(),
            Value::String(s) if s.is_empty() => EMPTY_SENTINEL.to_owned(),
            Value::Function(_) => FUNCTION_SENTINEL.to_owned(),
            Value::Null => "null".to_owned(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Number(n) => format!("n:{}", format_number(*n)),
            Value::String(s) => format!("s:{s}"),
        }
    }
}

pub(crate) const EMPTY_SENTINEL: &str = "\u{2205}";
pub(crate) const FUNCTION_SENTINEL: &str = "\u{0192}";

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Undefined, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => f.write_str(&format_number(*v)),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::Function(name) => write!(f, "function {name}"),
        }
    }
}
