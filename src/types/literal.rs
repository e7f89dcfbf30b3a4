use std::fmt;

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt};
use winnow::error::ModalResult;
use winnow::prelude::*;

use super::token::Token;
use super::value::{format_number, Value};
use crate::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralClass {
    Number,
    Boolean,
    Null,
    String,
    /// `Number`, `String`, `Boolean` or `Function`, compared with `typeof`.
    TypeName,
}

/// A constant operand. The source text is kept verbatim so rendering and
/// generated names are stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Literal {
    class: LiteralClass,
    text: String,
}

// -- Classification ---------------------------------------------------------

fn number(input: &mut &str) -> ModalResult<()> {
    (opt('-'), digit1, opt(('.', digit1)))
        .void()
        .parse_next(input)
}

fn keyword(input: &mut &str) -> ModalResult<LiteralClass> {
    alt((
        alt(("true", "false")).value(LiteralClass::Boolean),
        "null".value(LiteralClass::Null),
        alt(("Number", "String", "Boolean", "Function")).value(LiteralClass::TypeName),
    ))
    .parse_next(input)
}

/// The literal class of a bare keyword, or `None` for ordinary identifiers.
pub(crate) fn keyword_class(text: &str) -> Option<LiteralClass> {
    keyword.parse(text).ok()
}

pub(crate) fn is_number(text: &str) -> bool {
    number.parse(text).is_ok()
}

impl Literal {
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self {
            class: LiteralClass::Boolean,
            text: if value { "true" } else { "false" }.to_owned(),
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self {
            class: LiteralClass::Null,
            text: "null".to_owned(),
        }
    }

    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self {
            class: LiteralClass::String,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn number(value: f64) -> Self {
        Self {
            class: LiteralClass::Number,
            text: format_number(value),
        }
    }

    /// Parse literal source text (without quotes for strings).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Lex`] if unquoted text is neither a number nor
    /// a literal keyword.
    pub fn parse(text: &str, quoted: bool, offset: usize) -> Result<Self, CompileError> {
        if quoted {
            return Ok(Self::string(text));
        }
        let class = if is_number(text) {
            LiteralClass::Number
        } else {
            keyword_class(text)
                .ok_or_else(|| CompileError::lex(offset, format!("malformed literal \"{text}\"")))?
        };
        Ok(Self {
            class,
            text: text.to_owned(),
        })
    }

    pub(crate) fn from_token(token: &Token) -> Result<Self, CompileError> {
        Self::parse(&token.text, token.quoted, token.offset)
    }

    #[must_use]
    pub fn class(&self) -> LiteralClass {
        self.class
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_type_name(&self) -> bool {
        self.class == LiteralClass::TypeName
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        self.to_value().is_truthy()
    }

    /// `true` or `false` literal for this literal's logical complement.
    #[must_use]
    pub fn complement(&self) -> Self {
        Self::boolean(!self.is_truthy())
    }

    /// Unary minus. Only defined for numbers.
    pub(crate) fn negate_sign(&self) -> Option<Self> {
        if self.class != LiteralClass::Number {
            return None;
        }
        let text = match self.text.strip_prefix('-') {
            Some(rest) => rest.to_owned(),
            None => format!("-{}", self.text),
        };
        Some(Self {
            class: LiteralClass::Number,
            text,
        })
    }

    /// The `typeof` name a type-name literal stands for.
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        if self.class != LiteralClass::TypeName {
            return None;
        }
        match self.text.as_str() {
            "Number" => Some("number"),
            "String" => Some("string"),
            "Boolean" => Some("boolean"),
            "Function" => Some("function"),
            _ => None,
        }
    }

    /// The runtime value of this literal. Type names evaluate to their
    /// `typeof` string.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self.class {
            LiteralClass::Number => Value::Number(self.text.parse().unwrap_or(f64::NAN)),
            LiteralClass::Boolean => Value::Bool(self.text == "true"),
            LiteralClass::Null => Value::Null,
            LiteralClass::String => Value::String(self.text.clone()),
            LiteralClass::TypeName => {
                Value::String(self.type_name().unwrap_or_default().to_owned())
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            LiteralClass::String => write!(f, "'{}'", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_keywords() {
        assert_eq!(keyword_class("true"), Some(LiteralClass::Boolean));
        assert_eq!(keyword_class("false"), Some(LiteralClass::Boolean));
        assert_eq!(keyword_class("null"), Some(LiteralClass::Null));
        assert_eq!(keyword_class("Function"), Some(LiteralClass::TypeName));
        assert_eq!(keyword_class("nullable"), None);
        assert_eq!(keyword_class("truthy"), None);
        assert_eq!(keyword_class("size"), None);
    }

    #[test]
    fn classify_numbers() {
        assert!(is_number("42"));
        assert!(is_number("-3.25"));
        assert!(!is_number("1.2.3"));
        assert!(!is_number("1."));
    }

    #[test]
    fn parse_rejects_malformed_number() {
        let err = Literal::parse("1.2.3", false, 7).unwrap_err();
        assert!(matches!(err, CompileError::Lex { position: 7, .. }));
    }

    #[test]
    fn quoted_keyword_is_a_string() {
        let lit = Literal::parse("true", true, 0).unwrap();
        assert_eq!(lit.class(), LiteralClass::String);
        assert!(lit.is_truthy());
        assert_eq!(lit.to_string(), "'true'");
    }

    #[test]
    fn truthiness() {
        assert!(!Literal::parse("0", false, 0).unwrap().is_truthy());
        assert!(!Literal::parse("0.0", false, 0).unwrap().is_truthy());
        assert!(!Literal::null().is_truthy());
        assert!(!Literal::string("").is_truthy());
        assert!(!Literal::boolean(false).is_truthy());
        assert!(Literal::parse("7", false, 0).unwrap().is_truthy());
        assert!(Literal::string("x").is_truthy());
    }

    #[test]
    fn complement_folds_to_boolean() {
        assert_eq!(Literal::number(0.0).complement(), Literal::boolean(true));
        assert_eq!(Literal::string("x").complement(), Literal::boolean(false));
        assert_eq!(Literal::null().complement(), Literal::boolean(true));
    }

    #[test]
    fn unary_minus() {
        let lit = Literal::parse("5", false, 0).unwrap();
        let neg = lit.negate_sign().unwrap();
        assert_eq!(neg.text(), "-5");
        assert_eq!(neg.negate_sign().unwrap(), lit);
        assert!(Literal::string("a").negate_sign().is_none());
    }

    #[test]
    fn type_names() {
        let lit = Literal::parse("Number", false, 0).unwrap();
        assert!(lit.is_type_name());
        assert_eq!(lit.type_name(), Some("number"));
        assert_eq!(lit.to_value(), Value::String("number".into()));
    }
}
