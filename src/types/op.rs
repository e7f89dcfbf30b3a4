use std::fmt;

/// Every operator byte sequence the scanner can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Minus,
    Not,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    Dot,
    Assign,
}

impl Operator {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Minus => "-",
            Operator::Not => "!",
            Operator::LParen => "(",
            Operator::RParen => ")",
            Operator::LBrace => "{",
            Operator::RBrace => "}",
            Operator::LBracket => "[",
            Operator::RBracket => "]",
            Operator::Colon => ":",
            Operator::Comma => ",",
            Operator::Semicolon => ";",
            Operator::Dot => ".",
            Operator::Assign => "=",
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "||" => Operator::Or,
            "&&" => Operator::And,
            "==" => Operator::Eq,
            "!=" => Operator::Neq,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::Lte,
            ">=" => Operator::Gte,
            "-" => Operator::Minus,
            "!" => Operator::Not,
            "(" => Operator::LParen,
            ")" => Operator::RParen,
            "{" => Operator::LBrace,
            "}" => Operator::RBrace,
            "[" => Operator::LBracket,
            "]" => Operator::RBracket,
            ":" => Operator::Colon,
            "," => Operator::Comma,
            ";" => Operator::Semicolon,
            "." => Operator::Dot,
            "=" => Operator::Assign,
            _ => return None,
        })
    }

    /// Binding power used by the precedence-climbing parser. Zero means the
    /// operator never continues an expression.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            Operator::Eq
            | Operator::Neq
            | Operator::Lt
            | Operator::Gt
            | Operator::Lte
            | Operator::Gte => 3,
            Operator::Minus | Operator::Not => 4,
            _ => 0,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Comparison operators allowed between a property and an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// The operator that holds exactly when `self` does not.
    #[must_use]
    pub fn dual(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Neq,
            CompareOp::Neq => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Gte,
            CompareOp::Gte => CompareOp::Lt,
            CompareOp::Gt => CompareOp::Lte,
            CompareOp::Lte => CompareOp::Gt,
        }
    }

    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Neq)
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// Glyph used inside generated custom-property names.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            CompareOp::Eq => '≡',
            CompareOp::Neq => '≠',
            CompareOp::Gt => '⋗',
            CompareOp::Gte => '⋝',
            CompareOp::Lt => '⋖',
            CompareOp::Lte => '⋜',
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operators that may label an internal [`Term`](super::Term) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Compare(CompareOp),
}

impl BinaryOp {
    /// Logical dual: `||` and `&&` swap, comparisons flip to their complement.
    #[must_use]
    pub fn dual(self) -> Self {
        match self {
            BinaryOp::Or => BinaryOp::And,
            BinaryOp::And => BinaryOp::Or,
            BinaryOp::Compare(op) => BinaryOp::Compare(op.dual()),
        }
    }

    #[must_use]
    pub fn is_junction(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Compare(op) => op.symbol(),
        }
    }

    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            BinaryOp::Or => '⋁',
            BinaryOp::And => '∧',
            BinaryOp::Compare(op) => op.glyph(),
        }
    }
}

impl TryFrom<Operator> for BinaryOp {
    type Error = crate::CompileError;

    fn try_from(op: Operator) -> Result<Self, Self::Error> {
        Ok(match op {
            Operator::Or => BinaryOp::Or,
            Operator::And => BinaryOp::And,
            Operator::Eq => BinaryOp::Compare(CompareOp::Eq),
            Operator::Neq => BinaryOp::Compare(CompareOp::Neq),
            Operator::Lt => BinaryOp::Compare(CompareOp::Lt),
            Operator::Gt => BinaryOp::Compare(CompareOp::Gt),
            Operator::Lte => BinaryOp::Compare(CompareOp::Lte),
            Operator::Gte => BinaryOp::Compare(CompareOp::Gte),
            other => {
                return Err(crate::CompileError::UnknownOperator {
                    operator: other.symbol().to_owned(),
                })
            }
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
