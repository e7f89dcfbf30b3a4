use std::fmt;
use std::mem;
use std::ops::Not;

use super::literal::{Literal, LiteralClass};
use super::naming;
use super::op::{BinaryOp, CompareOp, Operator};
use super::props::Props;
use super::value::Value;
use crate::CompileError;

/// A boolean or relational expression tree.
///
/// Children are owned exclusively by their parent. Negation is a flag on the
/// node, except on literals where it is folded into the complementary
/// boolean literal as soon as it is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    negated: bool,
    node: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Identifier(String),
    Literal(Literal),
    Binary {
        op: BinaryOp,
        left: Box<Term>,
        right: Box<Term>,
    },
}

/// How [`Term::render`] spells operators and operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notation {
    /// The test language itself: `!a || (size == 'large')`.
    Source,
    /// Custom-property-safe glyphs: `¬a⋁∣size≡´large´∣`.
    Glyph,
}

// -- Construction -----------------------------------------------------------

impl Term {
    #[must_use]
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            negated: false,
            node: Node::Identifier(name.into()),
        }
    }

    #[must_use]
    pub fn literal(literal: Literal) -> Self {
        Self {
            negated: false,
            node: Node::Literal(literal),
        }
    }

    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::literal(Literal::boolean(value))
    }

    /// `left || right`, folded when either side is a literal.
    #[must_use]
    pub fn or(left: Term, right: Term) -> Self {
        Self::junction(BinaryOp::Or, left, right)
    }

    /// `left && right`, folded when either side is a literal.
    #[must_use]
    pub fn and(left: Term, right: Term) -> Self {
        Self::junction(BinaryOp::And, left, right)
    }

    /// `property <op> operand`.
    ///
    /// # Errors
    ///
    /// See [`Term::binary`].
    pub fn compare(property: &str, op: CompareOp, operand: Term) -> Result<Self, CompileError> {
        Self::binary(BinaryOp::Compare(op), Self::identifier(property), operand)
    }

    /// Build a binary node from a scanned operator token.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownOperator`] for operators that cannot
    /// label a binary node, otherwise see [`Term::binary`].
    pub fn from_operator(op: Operator, left: Term, right: Term) -> Result<Self, CompileError> {
        Self::binary(BinaryOp::try_from(op)?, left, right)
    }

    /// Build a binary node, folding junctions over literals and rewriting
    /// comparisons against boolean literals into bare identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MalformedExpression`] when a comparison's left
    /// side is not a bare identifier, its right side is not a leaf, or a type
    /// name is used with an ordering operator.
    pub fn binary(op: BinaryOp, left: Term, right: Term) -> Result<Self, CompileError> {
        let cmp = match op {
            BinaryOp::Or | BinaryOp::And => return Ok(Self::junction(op, left, right)),
            BinaryOp::Compare(cmp) => cmp,
        };

        let malformed = |reason: &str| {
            CompileError::malformed(format!("{left} {} {right}", cmp.symbol()), reason)
        };
        if left.negated || !matches!(left.node, Node::Identifier(_)) {
            return Err(malformed("left operand must be a bare identifier"));
        }
        match &right.node {
            Node::Binary { .. } => {
                return Err(malformed("right operand must be an identifier or a literal"));
            }
            Node::Literal(lit) if lit.is_type_name() && !cmp.is_equality() => {
                return Err(malformed("type names can only be compared with == or !="));
            }
            Node::Literal(lit) if cmp.is_equality() && lit.class() == LiteralClass::Boolean => {
                let mut folded = left;
                if lit.is_truthy() != (cmp == CompareOp::Eq) {
                    folded.negate();
                }
                return Ok(folded);
            }
            _ => {}
        }

        Ok(Self {
            negated: false,
            node: Node::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        })
    }

    /// Apply a prefix operator.
    ///
    /// # Errors
    ///
    /// Unary minus on anything but a numeric literal is a
    /// [`CompileError::MalformedExpression`]; any operator other than `-` or
    /// `!` is a [`CompileError::UnknownOperator`].
    pub fn unary(op: Operator, mut operand: Term) -> Result<Self, CompileError> {
        match op {
            Operator::Not => {
                operand.negate();
                Ok(operand)
            }
            Operator::Minus => match &operand.node {
                Node::Literal(lit) => lit.negate_sign().map(Self::literal).ok_or_else(|| {
                    CompileError::malformed(format!("-{operand}"), "unary minus needs a number")
                }),
                _ => Err(CompileError::malformed(
                    format!("-{operand}"),
                    "unary minus needs a number",
                )),
            },
            other => Err(CompileError::UnknownOperator {
                operator: other.symbol().to_owned(),
            }),
        }
    }

    /// `||`/`&&` constructor with eager constant folding.
    fn junction(op: BinaryOp, left: Term, right: Term) -> Self {
        debug_assert!(op.is_junction());
        // The literal that absorbs the whole junction.
        let absorbing = op == BinaryOp::Or;
        match (left.to_boolean(), right.to_boolean()) {
            (Some(l), Some(r)) => Self::boolean(if absorbing { l || r } else { l && r }),
            (Some(l), None) if l == absorbing => Self::boolean(absorbing),
            (Some(_), None) => right,
            (None, Some(r)) if r == absorbing => Self::boolean(absorbing),
            (None, Some(_)) => left,
            (None, None) => Self {
                negated: false,
                node: Node::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            },
        }
    }
}

// -- Accessors --------------------------------------------------------------

impl Term {
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    #[must_use]
    pub fn op(&self) -> Option<BinaryOp> {
        match self.node {
            Node::Binary { op, .. } => Some(op),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.node {
            Node::Identifier(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.node {
            Node::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self.node, Node::Literal(_))
    }

    /// Truthiness of a literal; `None` when the value is only known at runtime.
    #[must_use]
    pub fn to_boolean(&self) -> Option<bool> {
        self.as_literal().map(Literal::is_truthy)
    }

    /// Every distinct identifier referenced by this term, in first-seen order.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.node {
            Node::Identifier(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Node::Literal(_) => {}
            Node::Binary { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
        }
    }
}

// -- Algebra ----------------------------------------------------------------

impl Term {
    /// Toggle the logical sign. Literals fold to their boolean complement.
    pub fn negate(&mut self) -> &mut Self {
        match &mut self.node {
            Node::Literal(lit) => *lit = lit.complement(),
            _ => self.negated = !self.negated,
        }
        self
    }

    /// Swap a binary node for its logical dual and negate it, pushing the
    /// negation into both children of a junction. Leaves are left as is.
    pub fn de_morgan(&mut self) -> &mut Self {
        if let Node::Binary { op, left, right } = &mut self.node {
            *op = op.dual();
            if op.is_junction() {
                left.negate();
                right.negate();
            }
            self.negated = !self.negated;
        }
        self
    }

    /// Push every negation down to the leaves.
    pub fn to_nnf(&mut self) -> &mut Self {
        if self.negated {
            self.de_morgan();
        }
        if let Node::Binary { left, right, .. } = &mut self.node {
            left.to_nnf();
            right.to_nnf();
        }
        self
    }

    /// `(A && B) || C` into `(A || C) && (B || C)`.
    pub fn distribute_disjunction(&mut self, perfect: bool) -> &mut Self {
        self.distribute(BinaryOp::Or, perfect);
        self
    }

    /// `(A || B) && C` into `(A && C) || (B && C)`.
    pub fn distribute_conjunction(&mut self, perfect: bool) -> &mut Self {
        self.distribute(BinaryOp::And, perfect);
        self
    }

    /// Conjunctive normal form. With `perfect`, distribution repeats until
    /// no disjunction has a conjunction beneath it.
    pub fn to_cnf(&mut self, perfect: bool) -> &mut Self {
        self.to_nnf().distribute_disjunction(perfect)
    }

    /// Disjunctive normal form, see [`Term::to_cnf`].
    pub fn to_dnf(&mut self, perfect: bool) -> &mut Self {
        self.to_nnf().distribute_conjunction(perfect)
    }

    fn carries(&self, op: BinaryOp) -> bool {
        self.op() == Some(op)
    }

    fn decomposable(&self, op: BinaryOp) -> bool {
        !self.negated && self.carries(op)
    }

    fn distribute(&mut self, target: BinaryOp, perfect: bool) {
        let Node::Binary { op, left, right } = &mut self.node else {
            return;
        };
        left.distribute(target, perfect);
        right.distribute(target, perfect);
        if *op != target {
            return;
        }

        let dual = target.dual();
        let swap = if left.decomposable(dual) {
            false
        } else if right.decomposable(dual) {
            true
        } else {
            return;
        };
        let placeholder = Node::Literal(Literal::boolean(false));
        let Node::Binary { left, right, .. } = mem::replace(&mut self.node, placeholder) else {
            unreachable!("matched a binary node above");
        };
        let (decompose, inject) = if swap { (right, left) } else { (left, right) };
        let Term { node, .. } = *decompose;
        let Node::Binary {
            left: first,
            right: second,
            ..
        } = node
        else {
            unreachable!("decomposable terms are binary");
        };

        let again =
            perfect && (inject.carries(dual) || first.carries(dual) || second.carries(dual));
        let pair = |side: Box<Term>| -> Box<Term> {
            if side == inject {
                side
            } else {
                Box::new(Term::junction(target, *side, Term::clone(&inject)))
            }
        };

        let mut left = pair(first);
        let mut right = pair(second);
        if again {
            left.distribute(target, perfect);
            right.distribute(target, perfect);
        }
        self.node = Node::Binary {
            op: dual,
            left,
            right,
        };
    }
}

impl Not for Term {
    type Output = Term;

    fn not(mut self) -> Term {
        self.negate();
        self
    }
}

// -- Evaluation -------------------------------------------------------------

impl Term {
    /// Evaluate directly against a property bag. `||` and `&&` yield one of
    /// their operands, comparisons and negations yield booleans.
    #[must_use]
    pub fn execute(&self, props: &Props) -> Value {
        let value = match &self.node {
            Node::Literal(lit) => lit.to_value(),
            Node::Identifier(name) => props.get(name).clone(),
            Node::Binary { op, left, right } => match op {
                BinaryOp::Or => {
                    let l = left.execute(props);
                    if l.is_truthy() {
                        l
                    } else {
                        right.execute(props)
                    }
                }
                BinaryOp::And => {
                    let l = left.execute(props);
                    if l.is_truthy() {
                        right.execute(props)
                    } else {
                        l
                    }
                }
                BinaryOp::Compare(cmp) => {
                    let l = left.execute(props);
                    let holds = match right.as_literal().and_then(Literal::type_name) {
                        Some(name) => Value::from(l.type_of()).compare(*cmp, &Value::from(name)),
                        None => l.compare(*cmp, &right.execute(props)),
                    };
                    Value::Bool(holds)
                }
            },
        };
        if self.negated {
            Value::Bool(!value.is_truthy())
        } else {
            value
        }
    }
}

// -- Rendering --------------------------------------------------------------

impl Term {
    /// The custom-property-safe name of this term, e.g. `size≡´large´`.
    #[must_use]
    pub fn name(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, self.op(), Notation::Glyph);
        out
    }

    /// A child is parenthesised only when negated or when its operator
    /// differs from its parent's.
    pub(crate) fn render(&self, out: &mut String, parent: Option<BinaryOp>, notation: Notation) {
        let bang = match notation {
            Notation::Source => "!",
            Notation::Glyph => "¬",
        };
        match &self.node {
            Node::Identifier(name) => match notation {
                Notation::Source => {
                    if self.negated {
                        out.push_str(bang);
                    }
                    out.push_str(name);
                }
                Notation::Glyph => out.push_str(&naming::identifier(name, self.negated)),
            },
            Node::Literal(lit) => match notation {
                Notation::Source => out.push_str(&lit.to_string()),
                Notation::Glyph => out.push_str(&naming::literal(lit)),
            },
            Node::Binary { op, left, right } => {
                let wrap = self.negated || Some(*op) != parent;
                let (open, close) = match notation {
                    Notation::Source => ("(", ")"),
                    Notation::Glyph => ("∣", "∣"),
                };
                if self.negated {
                    out.push_str(bang);
                }
                if wrap {
                    out.push_str(open);
                }
                left.render(out, Some(*op), notation);
                match notation {
                    Notation::Source => {
                        out.push(' ');
                        out.push_str(op.symbol());
                        out.push(' ');
                    }
                    Notation::Glyph => out.push(op.glyph()),
                }
                right.render(out, Some(*op), notation);
                if wrap {
                    out.push_str(close);
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out, self.op(), Notation::Source);
        f.write_str(&out)
    }
}
