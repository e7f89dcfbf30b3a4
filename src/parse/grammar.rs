//! Token-level grammar: the boolean test language and structured values.
//!
//! Both grammars read through a [`Cursor`], which holds one token of
//! lookahead over a shared [`Scanner`]. Directive bodies are not tokenized,
//! so the cursor can give up its lookahead and hand the scanner back at any
//! token boundary.

use super::scanner::Scanner;
use crate::{CompileError, Literal, Operator, Syntax, Term, Token, TokenKind};

const PRIMARY: &str = "identifier or literal";

// -- Cursor -----------------------------------------------------------------

#[derive(Debug, Default)]
pub(super) struct Cursor {
    lookahead: Option<Token>,
}

fn unexpected(token: &Token, expected: impl Into<String>) -> CompileError {
    CompileError::UnexpectedToken {
        found: token.to_string(),
        expected: expected.into(),
    }
}

fn end(expected: impl Into<String>) -> CompileError {
    CompileError::UnexpectedEnd {
        expected: expected.into(),
    }
}

impl Cursor {
    /// Load the first token at the scanner's position.
    pub(super) fn start(scanner: &mut Scanner) -> Result<Self, CompileError> {
        Ok(Self {
            lookahead: scanner.next_token()?,
        })
    }

    pub(super) fn peek(&self) -> Option<&Token> {
        self.lookahead.as_ref()
    }

    pub(super) fn peek_op(&self) -> Option<Operator> {
        match self.lookahead.as_ref()?.kind {
            TokenKind::Op(op) => Some(op),
            TokenKind::Identifier | TokenKind::Literal => None,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        match self.lookahead.take() {
            Some(token) if token.is(kind) => Ok(token),
            Some(token) => {
                let err = unexpected(&token, kind.to_string());
                self.lookahead = Some(token);
                Err(err)
            }
            None => Err(end(kind.to_string())),
        }
    }

    /// Consume a token of `kind` and load the next one.
    pub(super) fn eat(
        &mut self,
        scanner: &mut Scanner,
        kind: TokenKind,
    ) -> Result<Token, CompileError> {
        let token = self.expect(kind)?;
        self.lookahead = scanner.next_token()?;
        Ok(token)
    }

    /// Consume a token of `kind` without loading the next one, leaving the
    /// scanner right after it.
    pub(super) fn eat_last(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        self.expect(kind)
    }

    /// Reload the lookahead after the scanner was driven directly.
    pub(super) fn refill(&mut self, scanner: &mut Scanner) -> Result<(), CompileError> {
        self.lookahead = scanner.next_token()?;
        Ok(())
    }

    /// Fail unless every token was consumed.
    pub(super) fn finish(&self) -> Result<(), CompileError> {
        match &self.lookahead {
            Some(token) => Err(unexpected(token, "end of input")),
            None => Ok(()),
        }
    }
}

fn op(operator: Operator) -> TokenKind {
    TokenKind::Op(operator)
}

// -- Boolean tests (precedence climbing) ------------------------------------

/// Parse a test expression whose operators all bind tighter than
/// `min_precedence`.
pub(super) fn test_expression(
    cursor: &mut Cursor,
    scanner: &mut Scanner,
    min_precedence: u8,
) -> Result<Term, CompileError> {
    let mut left = prefix(cursor, scanner)?;

    while let Some(operator) = cursor.peek_op() {
        let precedence = operator.precedence();
        if precedence <= min_precedence {
            break;
        }
        cursor.eat(scanner, op(operator))?;
        let right = test_expression(cursor, scanner, precedence)?;
        left = Term::from_operator(operator, left, right)?;
    }
    Ok(left)
}

fn prefix(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Term, CompileError> {
    let Some(token) = cursor.peek() else {
        return Err(end(PRIMARY));
    };
    match token.kind {
        TokenKind::Op(Operator::LParen) => {
            cursor.eat(scanner, op(Operator::LParen))?;
            let inner = test_expression(cursor, scanner, 0)?;
            cursor.eat(scanner, op(Operator::RParen))?;
            Ok(inner)
        }
        TokenKind::Op(operator @ (Operator::Not | Operator::Minus)) => {
            cursor.eat(scanner, op(operator))?;
            let operand = test_expression(cursor, scanner, operator.precedence())?;
            Term::unary(operator, operand)
        }
        TokenKind::Identifier => {
            let token = cursor.eat(scanner, TokenKind::Identifier)?;
            Ok(Term::identifier(token.text))
        }
        TokenKind::Literal => {
            let token = cursor.eat(scanner, TokenKind::Literal)?;
            Ok(Term::literal(Literal::from_token(&token)?))
        }
        TokenKind::Op(_) => Err(unexpected(token, PRIMARY)),
    }
}

// -- Structured values ------------------------------------------------------

pub(super) fn value_expression(
    cursor: &mut Cursor,
    scanner: &mut Scanner,
) -> Result<Syntax, CompileError> {
    match cursor.peek_op() {
        Some(Operator::LParen) => {
            cursor.eat(scanner, op(Operator::LParen))?;
            let inner = value_expression(cursor, scanner)?;
            cursor.eat(scanner, op(Operator::RParen))?;
            Ok(inner)
        }
        Some(Operator::LBrace) => object(cursor, scanner),
        Some(Operator::LBracket) => array(cursor, scanner),
        _ => call_member(cursor, scanner),
    }
}

fn array(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Syntax, CompileError> {
    cursor.eat(scanner, op(Operator::LBracket))?;
    let mut items = Vec::new();
    while cursor.peek_op() != Some(Operator::RBracket) {
        if cursor.peek().is_none() {
            return Err(end("]"));
        }
        items.push(value_expression(cursor, scanner)?);
        if cursor.peek_op() == Some(Operator::Comma) {
            cursor.eat(scanner, op(Operator::Comma))?;
        }
    }
    cursor.eat(scanner, op(Operator::RBracket))?;
    Ok(Syntax::Array(items))
}

fn object(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Syntax, CompileError> {
    cursor.eat(scanner, op(Operator::LBrace))?;
    let mut properties = Vec::new();
    while cursor.peek_op() != Some(Operator::RBrace) {
        let key = cursor.eat(scanner, TokenKind::Identifier)?;
        cursor.eat(scanner, op(Operator::Colon))?;
        properties.push((key.text, value_expression(cursor, scanner)?));
        if cursor.peek_op() == Some(Operator::Comma) {
            cursor.eat(scanner, op(Operator::Comma))?;
        }
    }
    cursor.eat(scanner, op(Operator::RBrace))?;
    Ok(Syntax::Object(properties))
}

fn primary(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Syntax, CompileError> {
    match cursor.peek() {
        Some(token) if token.is(TokenKind::Identifier) => {
            let token = cursor.eat(scanner, TokenKind::Identifier)?;
            Ok(Syntax::Identifier(token.text))
        }
        Some(token) if token.is(TokenKind::Literal) => {
            let token = cursor.eat(scanner, TokenKind::Literal)?;
            Ok(Syntax::Literal(Literal::from_token(&token)?))
        }
        Some(token) => Err(unexpected(token, PRIMARY)),
        None => Err(end(PRIMARY)),
    }
}

fn call_member(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Syntax, CompileError> {
    let mut value = primary(cursor, scanner)?;
    loop {
        value = match cursor.peek_op() {
            Some(Operator::Dot) => {
                cursor.eat(scanner, op(Operator::Dot))?;
                let property = cursor.eat(scanner, TokenKind::Identifier)?;
                Syntax::Member {
                    object: Box::new(value),
                    property: Box::new(Syntax::Identifier(property.text)),
                    computed: false,
                }
            }
            Some(Operator::LBracket) => {
                cursor.eat(scanner, op(Operator::LBracket))?;
                let property = value_expression(cursor, scanner)?;
                cursor.eat(scanner, op(Operator::RBracket))?;
                Syntax::Member {
                    object: Box::new(value),
                    property: Box::new(property),
                    computed: true,
                }
            }
            Some(Operator::LParen) if value == Syntax::Identifier("token".into()) => {
                raw_token(cursor, scanner)?
            }
            Some(Operator::LParen) => Syntax::Call {
                callee: Box::new(value),
                arguments: arguments(cursor, scanner)?,
            },
            _ => return Ok(value),
        };
    }
}

fn arguments(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Vec<Syntax>, CompileError> {
    cursor.eat(scanner, op(Operator::LParen))?;
    let mut arguments = Vec::new();
    while cursor.peek_op() != Some(Operator::RParen) {
        if cursor.peek().is_none() {
            return Err(end(")"));
        }
        arguments.push(value_expression(cursor, scanner)?);
        if cursor.peek_op() == Some(Operator::Comma) {
            cursor.eat(scanner, op(Operator::Comma))?;
        }
    }
    cursor.eat(scanner, op(Operator::RParen))?;
    Ok(arguments)
}

/// `token(...)` keeps its argument text as written.
fn raw_token(cursor: &mut Cursor, scanner: &mut Scanner) -> Result<Syntax, CompileError> {
    cursor.eat_last(op(Operator::LParen))?;
    let (raw, stop) = scanner.scan_until_balanced(&[")"], &[], |_, _| Ok(String::new()))?;
    if stop.is_none() {
        return Err(end(")"));
    }
    scanner.next_token()?;
    cursor.refill(scanner)?;
    Ok(Syntax::Token(raw))
}
