use std::fmt;

use super::literal::Literal;

/// A structured directive body: literals, arrays, objects, member access
/// and calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Identifier(String),
    Literal(Literal),
    Array(Vec<Syntax>),
    /// Properties in source order.
    Object(Vec<(String, Syntax)>),
    Member {
        object: Box<Syntax>,
        property: Box<Syntax>,
        /// `a[b]` rather than `a.b`.
        computed: bool,
    },
    Call {
        callee: Box<Syntax>,
        arguments: Vec<Syntax>,
    },
    /// Raw argument text of a `token(...)` call, kept verbatim.
    Token(String),
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Syntax]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Identifier(name) => f.write_str(name),
            Syntax::Literal(lit) => write!(f, "{lit}"),
            Syntax::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Syntax::Object(properties) => {
                f.write_str("{")?;
                for (i, (key, value)) in properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Syntax::Member {
                object,
                property,
                computed: false,
            } => write!(f, "{object}.{property}"),
            Syntax::Member {
                object,
                property,
                computed: true,
            } => write!(f, "{object}[{property}]"),
            Syntax::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                write_list(f, arguments)?;
                f.write_str(")")
            }
            Syntax::Token(raw) => write!(f, "token({raw})"),
        }
    }
}
