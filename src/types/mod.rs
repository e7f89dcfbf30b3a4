mod condition;
mod error;
pub(crate) mod literal;
mod naming;
mod op;
mod props;
mod rule;
mod scheme;
mod syntax;
mod term;
mod token;
mod value;

pub use condition::{Fact, Operand, Test};
pub use error::CompileError;
pub use literal::{Literal, LiteralClass};
pub use op::{BinaryOp, CompareOp, Operator};
pub use props::Props;
pub use rule::{Block, DependentRules, Rule};
pub use scheme::{CompiledScheme, Scheme, SchemeBuilder, SchemeOptions, Serialized};
pub use syntax::Syntax;
pub use term::{Node, Term};
pub use token::{Token, TokenKind};
pub use value::Value;
