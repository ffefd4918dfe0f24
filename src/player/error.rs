//! Runtime errors raised while a script plays.

use crate::dsl::DirectiveKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("{directive} expects an integer, got '{value}'")]
    InvalidInteger {
        directive: DirectiveKind,
        value: String,
    },
    #[error("{directive} is missing argument {position}")]
    MissingArgument {
        directive: DirectiveKind,
        position: usize,
    },
    #[error("tempo must be greater than zero")]
    InvalidTempo,
    #[error("unknown tag '{0}'")]
    UnknownTag(String),
    /// The key sink panicked; the panic itself is resumed on whoever waits.
    #[error("key sink panicked")]
    SinkPanicked,
}

/// A runtime failure, tagged with the source line of the offending directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("runtime error at line {line}: {kind}")]
pub struct RuntimeError {
    pub line: usize,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(line: usize, kind: RuntimeErrorKind) -> Self {
        Self { line, kind }
    }
}
