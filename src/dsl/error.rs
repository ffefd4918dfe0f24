//! Error types for the script compiler.

use std::path::Path;

/// An error that occurred while compiling a script.
///
/// `line` is the 1-based source line; `col` is the 1-based character column
/// inside the variable-expanded line, or 0 when the error concerns the line
/// as a whole.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{line}:{col}] {kind:?}: {message}")]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// `{` opened while another `{` is still open.
    NestedVariable,
    /// `}` with no open `{`.
    UnmatchedBrace,
    /// `{` never closed before the end of the line.
    UnclosedVariable,
    /// `{name}` used before any `SET name`.
    UnknownVariable,
    /// `SET name` for a name that is already defined.
    DuplicateVariable,
    /// `[` opened inside another chord group.
    NestedChord,
    /// `]` with no open `[`.
    UnmatchedBracket,
    /// `[` never closed before the chord run ended.
    UnclosedChord,
    /// `[]` with no keys inside.
    EmptyChord,
    /// A `,` line with no keyword.
    EmptyDirective,
    /// A `,` line whose keyword is not a known directive.
    UnknownDirective,
    /// A directive with the wrong number of arguments.
    ArgumentCount,
    /// The script file could not be read.
    Io,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind,
        }
    }

    /// A whole-line error with no meaningful column.
    pub fn at_line(kind: ErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self::new(kind, message, line, 0)
    }

    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::new(
            ErrorKind::Io,
            format!("failed to read {}: {err}", path.display()),
            0,
            0,
        )
    }
}
