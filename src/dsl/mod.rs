//! Script compiler — line-oriented chord script → action list + tag index.

pub mod action;
pub mod compile;
pub mod document;
pub mod error;
pub mod lexer;
pub mod token;
pub mod variables;

pub use action::{Action, Chord, Directive, DirectiveKind, Key, UnknownKeyword};
pub use document::ScriptDocument;
pub use error::{CompileError, ErrorKind};
pub use variables::VariableTable;

use std::path::Path;

use compile::compile_source;

/// The script compiler.
///
/// Compilation is all-or-nothing: any error aborts and no document is produced.
pub struct Compiler;

impl Compiler {
    /// Compile script source into a [`ScriptDocument`].
    pub fn compile(source: &str) -> Result<ScriptDocument, CompileError> {
        compile_source(source).map(|(document, _)| document)
    }

    /// Compile and also return the variables the script defined.
    pub fn compile_with_variables(
        source: &str,
    ) -> Result<(ScriptDocument, VariableTable), CompileError> {
        compile_source(source)
    }

    /// Read a script file and compile it.
    pub fn load(path: impl AsRef<Path>) -> Result<(ScriptDocument, VariableTable), CompileError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, &e))?;
        compile_source(&source)
    }
}
