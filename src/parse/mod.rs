mod grammar;
mod parser;
mod scanner;

pub use parser::Parser;
pub use scanner::Scanner;

use crate::{CompileError, Scheme};

/// Rewrite the directives in `source` with a fresh [`Parser`].
///
/// # Errors
///
/// Returns [`CompileError`] if any directive is malformed.
pub fn parse(source: &str, scheme: &mut Scheme) -> Result<String, CompileError> {
    Parser::new().parse(source, scheme)
}
