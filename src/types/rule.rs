use std::fmt;

use super::condition::Operand;
use super::op::CompareOp;

/// One compiled flag policy for a property.
///
/// Rules are data: a single interpreter (see `evaluate.rs`) turns a rule and
/// a property bag into flag states. Every rule reads its own `property`;
/// equality and relational rules may also read a second property through
/// their operand, which makes them dependent rules.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Rule {
    /// `flag` is on while the property is truthy, off otherwise.
    Truthy { property: String, flag: String },
    /// `flag` is on while the property is falsy, off otherwise.
    Falsy { property: String, flag: String },
    /// Exactly one of `positive` (`==`) and `complement` (`!=`) is on.
    Equality {
        property: String,
        operand: Operand,
        positive: String,
        complement: String,
    },
    /// Like `Equality`, but compares the property's `typeof` name.
    TypeOf {
        property: String,
        type_name: String,
        positive: String,
        complement: String,
    },
    /// `flag` is set only when the comparison holds; the base block keeps it
    /// off otherwise.
    Relational {
        property: String,
        op: CompareOp,
        operand: Operand,
        flag: String,
    },
}

impl Rule {
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Rule::Truthy { property, .. }
            | Rule::Falsy { property, .. }
            | Rule::Equality { property, .. }
            | Rule::TypeOf { property, .. }
            | Rule::Relational { property, .. } => property,
        }
    }

    /// Every flag this rule may set.
    #[must_use]
    pub fn flags(&self) -> Vec<&str> {
        match self {
            Rule::Truthy { flag, .. } | Rule::Falsy { flag, .. } | Rule::Relational { flag, .. } => {
                vec![flag.as_str()]
            }
            Rule::Equality {
                positive,
                complement,
                ..
            }
            | Rule::TypeOf {
                positive,
                complement,
                ..
            } => vec![positive.as_str(), complement.as_str()],
        }
    }

    /// The second property this rule reads, if any.
    #[must_use]
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Rule::Equality { operand, .. } | Rule::Relational { operand, .. } => operand.property(),
            Rule::Truthy { .. } | Rule::Falsy { .. } | Rule::TypeOf { .. } => None,
        }
    }

    /// Sparse rules only emit flags that are on.
    #[must_use]
    pub fn is_sparse(&self) -> bool {
        matches!(self, Rule::Relational { .. })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Truthy { property, flag } => write!(f, "{property} => --{flag}"),
            Rule::Falsy { property, flag } => write!(f, "!{property} => --{flag}"),
            Rule::Equality {
                property,
                operand,
                positive,
                complement,
            } => write!(f, "{property} == {operand} => --{positive} | --{complement}"),
            Rule::TypeOf {
                property,
                type_name,
                positive,
                complement,
            } => write!(
                f,
                "typeof {property} == {type_name} => --{positive} | --{complement}"
            ),
            Rule::Relational {
                property,
                op,
                operand,
                flag,
            } => write!(f, "{property} {op} {operand} => --{flag}"),
        }
    }
}

/// Rules of one property that also read other properties. Their output
/// depends on every value in `properties`, so they are cached under a key
/// over all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct DependentRules {
    /// Sorted, including the owning property.
    pub properties: Vec<String>,
    pub rules: Vec<Rule>,
}

/// A generated declaration block, addressed by its cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub key: String,
    /// `--flag:value;` declarations, one per line. May be empty.
    pub declarations: String,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{} {{{}}}", self.key, self.declarations)
    }
}
