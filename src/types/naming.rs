//! Custom-property-safe spelling of terms and facts.
//!
//! Operators become glyphs (`==` is `≡`, `!` is `¬`), a space becomes `␣`
//! and string literals are delimited by `´`. Every other byte that cannot
//! appear in a CSS identifier is backslash-escaped, as is any source
//! character that is itself a glyph, so distinct sources never share a name.

use super::literal::{Literal, LiteralClass};
use super::op::{BinaryOp, Operator};

const NOT: char = '¬';
const QUOTE: char = '´';
const BAR: char = '∣';
const BLANK: char = '␣';

/// Characters with a meaning in generated names.
const GLYPHS: [char; 12] = [NOT, QUOTE, BAR, BLANK, '≡', '≠', '⋖', '⋗', '⋜', '⋝', '⋁', '∧'];

fn operator_glyph(symbol: &str) -> Option<char> {
    match symbol {
        "!" => Some(NOT),
        _ => Operator::from_symbol(symbol)
            .and_then(|op| BinaryOp::try_from(op).ok())
            .map(BinaryOp::glyph),
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut pair = String::with_capacity(2);
    while let Some(c) = chars.next() {
        if let Some(&next) = chars.peek() {
            pair.clear();
            pair.push(c);
            pair.push(next);
            if let Some(glyph) = operator_glyph(&pair) {
                chars.next();
                out.push(glyph);
                continue;
            }
        }
        match c {
            ' ' => out.push(BLANK),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => out.push(c),
            // CSS cannot escape control characters literally.
            c if c.is_control() => out.push_str(&format!("\\{:x} ", u32::from(c))),
            c if !c.is_ascii() && !GLYPHS.contains(&c) => out.push(c),
            c => match operator_glyph(c.encode_utf8(&mut [0; 4])) {
                Some(glyph) => out.push(glyph),
                None => {
                    out.push('\\');
                    out.push(c);
                }
            },
        }
    }
    out
}

pub(crate) fn identifier(name: &str, negated: bool) -> String {
    let escaped = escape(name);
    if negated {
        format!("{NOT}{escaped}")
    } else {
        escaped
    }
}

pub(crate) fn literal(lit: &Literal) -> String {
    match lit.class() {
        LiteralClass::String => format!("{QUOTE}{}{QUOTE}", escape(lit.text())),
        _ => escape(lit.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_quotes() {
        assert_eq!(literal(&Literal::string("large one")), "´large␣one´");
        assert_eq!(escape("it's"), "it\\'s");
        assert_eq!(escape("a\tb"), "a\\9 b");
    }

    #[test]
    fn operators_inside_strings() {
        assert_eq!(escape("a||b"), "a⋁b");
        assert_eq!(escape("x<=y"), "x⋜y");
        assert_eq!(escape("(!a)"), "\\(¬a\\)");
    }

    #[test]
    fn glyphs_in_source_are_escaped() {
        assert_ne!(
            literal(&Literal::string("x y")),
            literal(&Literal::string("x␣y"))
        );
        assert_eq!(literal(&Literal::string("x␣y")), "´x\\␣y´");
        assert_eq!(escape("≡´¬"), "\\≡\\´\\¬");
        assert_eq!(escape("(a"), "\\(a");
        assert_ne!(escape("(a"), escape(")a"));
        assert_eq!(escape("ü"), "ü");
    }

    #[test]
    fn punctuation_is_escaped() {
        assert_eq!(literal(&Literal::number(1.5)), "1\\.5");
        assert_eq!(identifier("$el", false), "\\$el");
    }

    #[test]
    fn negated_identifier() {
        assert_eq!(identifier("disabled", true), "¬disabled");
        assert_eq!(identifier("disabled", false), "disabled");
    }
}
