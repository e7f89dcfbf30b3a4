use thiserror::Error;

/// Every failure the compiler can report.
///
/// Parsing, term construction and serialization all fail fast with one of
/// these; there is no partially rewritten output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("lex error at byte {position}: {message}")]
    Lex { position: usize, message: String },

    #[error("unexpected end of input, expected \"{expected}\"")]
    UnexpectedEnd { expected: String },

    #[error("unexpected token \"{found}\", expected \"{expected}\"")]
    UnexpectedToken { found: String, expected: String },

    #[error("malformed expression \"{expression}\": {reason}")]
    MalformedExpression { expression: String, reason: String },

    #[error("unknown operator \"{operator}\"")]
    UnknownOperator { operator: String },

    #[error("property '{property}' is not registered in scheme '{scheme}'")]
    UnregisteredProperty { scheme: String, property: String },
}

impl CompileError {
    pub(crate) fn lex(position: usize, message: impl Into<String>) -> Self {
        CompileError::Lex {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(expression: impl ToString, reason: impl Into<String>) -> Self {
        CompileError::MalformedExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this is one of the syntax-class failures raised while parsing.
    #[must_use]
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            CompileError::UnexpectedEnd { .. } | CompileError::UnexpectedToken { .. }
        )
    }
}
