//! Compiles `if(test, consequent[, alternate])` directives into custom-property
//! references backed by cached, content-addressed declaration blocks.
//!
//! A [`Parser`] rewrites source text and records every condition a test
//! needs in a [`Scheme`]. [`Scheme::prepare_styles`] compiles those
//! conditions once into per-property [`Rule`]s; the resulting
//! [`CompiledScheme`] then maps runtime [`Props`] to block keys, generating
//! each distinct block at most once.
//!
//! ```
//! use condstyle::{parse, Props, Scheme};
//!
//! let mut scheme = Scheme::new("button");
//! let css = parse("opacity: if(!disabled, 1, 0.5);", &mut scheme).unwrap();
//! assert_eq!(css, "opacity: var(--¬disabled,1) var(--disabled,0.5);");
//!
//! let mut compiled = scheme.prepare_styles();
//! let out = compiled.serialize(&Props::new().set("disabled", true)).unwrap();
//! let block = compiled.block(&out.matched).unwrap();
//! assert_eq!(block.declarations, "--disabled:initial;\n--¬disabled: ;");
//! ```

mod compile;
mod evaluate;
mod fingerprint;
mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use parse::{parse, Parser, Scanner};
pub use types::{
    BinaryOp, Block, CompareOp, CompileError, CompiledScheme, DependentRules, Fact, Literal,
    LiteralClass, Node, Operand, Operator, Props, Rule, Scheme, SchemeBuilder, SchemeOptions,
    Serialized, Syntax, Term, Test, Token, TokenKind, Value,
};
