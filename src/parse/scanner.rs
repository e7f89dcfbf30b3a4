use crate::types::literal::{is_number, keyword_class};
use crate::{CompileError, Operator, Token, TokenKind};

const IGNORED: u8 = 0;
const IDENT: u8 = 1;
const DIGIT: u8 = 2;
const OPERATOR: u8 = 3;
const QUOTE: u8 = 4;

const CLASSES: [u8; 128] = build_classes();

const fn build_classes() -> [u8; 128] {
    let mut table = [IGNORED; 128];
    let mut i = 0;
    while i < 128 {
        let byte = i as u8;
        table[i] = if byte.is_ascii_alphabetic() || byte == b'$' || byte == b'_' {
            IDENT
        } else if byte.is_ascii_digit() {
            DIGIT
        } else if matches!(
            byte,
            b'|' | b'&'
                | b'='
                | b'!'
                | b'<'
                | b'>'
                | b'-'
                | b'('
                | b')'
                | b'{'
                | b'}'
                | b'['
                | b']'
                | b':'
                | b','
                | b';'
                | b'.'
        ) {
            OPERATOR
        } else if byte == b'"' || byte == b'\'' {
            QUOTE
        } else {
            IGNORED
        };
        i += 1;
    }
    table
}

fn class(byte: u8) -> u8 {
    if byte < 128 {
        CLASSES[byte as usize]
    } else {
        IGNORED
    }
}

fn is_word_byte(byte: u8) -> bool {
    matches!(class(byte), IDENT | DIGIT)
}

fn run_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| !pred(b))
        .map_or(bytes.len(), |n| start + n)
}

/// Position of the quote closing the string opened at `start`.
fn closing_quote(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    bytes[start + 1..]
        .iter()
        .position(|&b| b == quote)
        .map(|n| start + 1 + n)
}

/// Byte-oriented lexer over an owned, reusable buffer.
///
/// Besides ordinary tokenization the scanner can copy raw text up to a set
/// of stop sequences, which is how directive bodies are extracted without
/// tokenizing them.
#[derive(Debug, Default)]
pub struct Scanner {
    buffer: String,
    pos: usize,
}

impl Scanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer contents and rewind. The allocation is reused.
    pub fn reset(&mut self, source: &str) {
        self.buffer.clear();
        self.buffer.push_str(source);
        self.pos = 0;
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buffer.len()
    }

    /// Unconsumed input.
    #[must_use]
    pub fn remaining(&self) -> &str {
        self.buffer.get(self.pos..).unwrap_or("")
    }

    /// Produce the next token, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Lex`] for an unterminated string, a malformed
    /// number, or a lone `&` or `|`.
    pub fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        let bytes = self.buffer.as_bytes();
        let start = run_while(bytes, self.pos, |b| class(b) == IGNORED);
        self.pos = start;
        let Some(&byte) = bytes.get(start) else {
            return Ok(None);
        };

        let token = match class(byte) {
            IDENT => {
                let end = run_while(bytes, start, is_word_byte);
                let text = &self.buffer[start..end];
                let kind = if keyword_class(text).is_some() {
                    TokenKind::Literal
                } else {
                    TokenKind::Identifier
                };
                self.pos = end;
                Token::new(kind, text, start)
            }
            DIGIT => {
                let end = run_while(bytes, start, |b| class(b) == DIGIT || b == b'.');
                let text = &self.buffer[start..end];
                if !is_number(text) {
                    return Err(CompileError::lex(
                        start,
                        format!("malformed number \"{text}\""),
                    ));
                }
                self.pos = end;
                Token::new(TokenKind::Literal, text, start)
            }
            QUOTE => {
                let end = closing_quote(bytes, start)
                    .ok_or_else(|| CompileError::lex(start, "unterminated string literal"))?;
                self.pos = end + 1;
                Token::string(&self.buffer[start + 1..end], start)
            }
            _ => self.operator(start)?,
        };
        Ok(Some(token))
    }

    fn operator(&mut self, start: usize) -> Result<Token, CompileError> {
        let bytes = self.buffer.as_bytes();
        let (op, len) = match (bytes[start], bytes.get(start + 1).copied()) {
            (b'&', Some(b'&')) => (Operator::And, 2),
            (b'|', Some(b'|')) => (Operator::Or, 2),
            (b'=', Some(b'=')) => (Operator::Eq, 2),
            (b'<', Some(b'=')) => (Operator::Lte, 2),
            (b'>', Some(b'=')) => (Operator::Gte, 2),
            (b'!', Some(b'=')) => (Operator::Neq, 2),
            (first @ (b'&' | b'|'), _) => {
                return Err(CompileError::lex(
                    start,
                    format!("unexpected '{}'", char::from(first)),
                ));
            }
            (first, _) => {
                let op = Operator::from_symbol(&self.buffer[start..=start]).ok_or_else(|| {
                    CompileError::lex(start, format!("unexpected '{}'", char::from(first)))
                })?;
                (op, 1)
            }
        };
        self.pos = start + len;
        Ok(Token::op(op, start))
    }

    // -- Raw scanning ------------------------------------------------------

    /// The first candidate matching at `pos`. Candidates starting with an
    /// identifier byte are keywords: they need a word boundary on both sides
    /// and a `(` after optional whitespace.
    fn match_at<'s>(&self, pos: usize, candidates: &[&'s str]) -> Option<&'s str> {
        let bytes = self.buffer.as_bytes();
        candidates.iter().copied().find(|candidate| {
            let wanted = candidate.as_bytes();
            if !bytes[pos..].starts_with(wanted) {
                return false;
            }
            if !wanted.first().is_some_and(|&b| class(b) == IDENT) {
                return true;
            }
            if pos > 0 && is_word_byte(bytes[pos - 1]) {
                return false;
            }
            let after = pos + wanted.len();
            let paren = run_while(bytes, after, |b| b.is_ascii_whitespace());
            after < bytes.len() && !is_word_byte(bytes[after]) && bytes.get(paren) == Some(&b'(')
        })
    }

    /// Copy raw text up to the first stop. The scanner is left at the stop,
    /// or at the end of input when none matched.
    pub fn scan_until_any<'s>(&mut self, stops: &[&'s str]) -> (String, Option<&'s str>) {
        let start = self.pos;
        while self.pos < self.buffer.len() {
            if let Some(stop) = self.match_at(self.pos, stops) {
                return (self.buffer[start..self.pos].to_owned(), Some(stop));
            }
            self.pos += 1;
        }
        (self.buffer[start..].to_owned(), None)
    }

    /// Like [`Scanner::scan_until_any`], but only outside parentheses and
    /// quoted strings. At each `inner` keyword found at depth zero,
    /// `handler` is called with the scanner positioned on the keyword; it
    /// must consume the directive and return the text to splice in.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Lex`] for an unterminated string, and
    /// forwards any error from `handler`.
    pub fn scan_until_balanced<'s, F>(
        &mut self,
        stops: &[&'s str],
        inner: &[&str],
        mut handler: F,
    ) -> Result<(String, Option<&'s str>), CompileError>
    where
        F: FnMut(&mut Scanner, &str) -> Result<String, CompileError>,
    {
        let mut text = String::new();
        let mut start = self.pos;
        let mut depth = 0usize;

        while self.pos < self.buffer.len() {
            if depth == 0 {
                if let Some(stop) = self.match_at(self.pos, stops) {
                    text.push_str(&self.buffer[start..self.pos]);
                    return Ok((text, Some(stop)));
                }
                if let Some(keyword) = self.match_at(self.pos, inner) {
                    text.push_str(&self.buffer[start..self.pos]);
                    let spliced = handler(self, keyword)?;
                    text.push_str(&spliced);
                    start = self.pos;
                    continue;
                }
            }
            let bytes = self.buffer.as_bytes();
            match bytes[self.pos] {
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b'\'' | b'"' => {
                    self.pos = closing_quote(bytes, self.pos).ok_or_else(|| {
                        CompileError::lex(self.pos, "unterminated string literal")
                    })?;
                }
                _ => {}
            }
            self.pos += 1;
        }
        text.push_str(&self.buffer[start..]);
        Ok((text, None))
    }
}
