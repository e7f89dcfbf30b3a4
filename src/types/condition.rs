use std::fmt;

use super::literal::Literal;
use super::naming;
use super::op::{BinaryOp, CompareOp};
use super::term::{Node, Term};

/// Right-hand side of a comparison fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    Literal(Literal),
    /// Another property, read at query time. Makes the fact dependent.
    Property { name: String, negated: bool },
}

impl Operand {
    /// The property this operand reads, if any.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Operand::Literal(_) => None,
            Operand::Property { name, .. } => Some(name),
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Operand::Literal(lit) => Some(lit),
            Operand::Property { .. } => None,
        }
    }

    pub(crate) fn glyph_name(&self) -> String {
        match self {
            Operand::Literal(lit) => naming::literal(lit),
            Operand::Property { name, negated } => naming::identifier(name, *negated),
        }
    }

    fn from_term(term: &Term) -> Option<Self> {
        match term.node() {
            Node::Literal(lit) => Some(Operand::Literal(lit.clone())),
            Node::Identifier(name) => Some(Operand::Property {
                name: name.clone(),
                negated: term.is_negated(),
            }),
            Node::Binary { .. } => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => write!(f, "{lit}"),
            Operand::Property { name, negated } => {
                write!(f, "{}{name}", if *negated { "!" } else { "" })
            }
        }
    }
}

/// What a fact asserts about its property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Test {
    /// Bare truthiness, `negated` for `!property`.
    Truthy { negated: bool },
    Compare { op: CompareOp, operand: Operand },
}

/// A single boolean fact about one property, e.g. `size == 'large'` or
/// `!disabled`. Every fact owns exactly one flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub property: String,
    pub test: Test,
}

impl Fact {
    #[must_use]
    pub fn truthy(property: impl Into<String>, negated: bool) -> Self {
        Self {
            property: property.into(),
            test: Test::Truthy { negated },
        }
    }

    #[must_use]
    pub fn compare(property: impl Into<String>, op: CompareOp, operand: Operand) -> Self {
        Self {
            property: property.into(),
            test: Test::Compare { op, operand },
        }
    }

    /// The fact a leaf or comparison term stands for. Junctions and literals
    /// have none.
    #[must_use]
    pub fn from_term(term: &Term) -> Option<Self> {
        match term.node() {
            Node::Identifier(name) => Some(Self::truthy(name.clone(), term.is_negated())),
            Node::Binary {
                op: BinaryOp::Compare(op),
                left,
                right,
            } => {
                let property = left.as_identifier()?;
                let mut op = *op;
                if term.is_negated() {
                    op = op.dual();
                }
                Some(Self::compare(property, op, Operand::from_term(right)?))
            }
            Node::Literal(_) | Node::Binary { .. } => None,
        }
    }

    /// Every fact referenced anywhere in `term`, in left-to-right order.
    #[must_use]
    pub fn collect(term: &Term) -> Vec<Self> {
        let mut out = Vec::new();
        collect_into(term, &mut out);
        out
    }

    /// Flag name of this fact. Matches [`Term::name`] of the term it came from.
    #[must_use]
    pub fn name(&self) -> String {
        match &self.test {
            Test::Truthy { negated } => naming::identifier(&self.property, *negated),
            Test::Compare { op, operand } => format!(
                "{}{}{}",
                naming::identifier(&self.property, false),
                op.glyph(),
                operand.glyph_name()
            ),
        }
    }

    /// The other property this fact reads, if any.
    #[must_use]
    pub fn dependency(&self) -> Option<&str> {
        match &self.test {
            Test::Truthy { .. } => None,
            Test::Compare { operand, .. } => operand.property(),
        }
    }
}

fn collect_into(term: &Term, out: &mut Vec<Fact>) {
    match term.node() {
        Node::Binary {
            op: BinaryOp::Or | BinaryOp::And,
            left,
            right,
        } => {
            collect_into(left, out);
            collect_into(right, out);
        }
        _ => out.extend(Fact::from_term(term)),
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.test {
            Test::Truthy { negated: true } => write!(f, "!{}", self.property),
            Test::Truthy { negated: false } => f.write_str(&self.property),
            Test::Compare { op, operand } => write!(f, "{} {op} {operand}", self.property),
        }
    }
}
