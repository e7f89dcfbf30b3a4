use std::fmt;

use super::op::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Literal,
    Op(Operator),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => f.write_str("Identifier"),
            TokenKind::Literal => f.write_str("Literal"),
            TokenKind::Op(op) => f.write_str(op.symbol()),
        }
    }
}

/// A lexeme produced by the [`Scanner`](crate::Scanner).
///
/// String literals carry their text without the surrounding quotes and set
/// `quoted`, so `'true'` stays distinguishable from the keyword `true`.
/// `offset` is the byte position of the first byte of the lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub quoted: bool,
    pub offset: usize,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            quoted: false,
            offset,
        }
    }

    pub(crate) fn string(text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind: TokenKind::Literal,
            text: text.into(),
            quoted: true,
            offset,
        }
    }

    pub(crate) fn op(op: Operator, offset: usize) -> Self {
        Self::new(TokenKind::Op(op), op.symbol(), offset)
    }

    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "'{}'", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}
