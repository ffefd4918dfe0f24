//! Variable table and `{name}` expansion.
//!
//! Variables are defined by `,SET name value...` and substituted verbatim into
//! later lines before those lines are classified.

use super::error::{CompileError, ErrorKind};

/// Insertion-ordered map from variable name to replacement text.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    entries: Vec<(String, String)>,
}

/// A complete `{name}` span found in a line, in byte offsets.
struct Span {
    open: usize,
    close: usize,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new variable. Names may only be defined once.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        line: usize,
    ) -> Result<(), CompileError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(CompileError::at_line(
                ErrorKind::DuplicateVariable,
                format!("variable '{name}' is already defined"),
                line,
            ));
        }
        self.entries.push((name, value.into()));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Replace every `{name}` in `line` with its value.
    ///
    /// After each substitution the scan restarts from the start of the
    /// rewritten line. Values can never contain braces (they come from lines
    /// that were themselves fully expanded), so this terminates.
    pub fn expand(&self, line: &str, line_no: usize) -> Result<String, CompileError> {
        let mut text = line.to_string();
        while let Some(span) = find_span(&text, line_no)? {
            let name = &text[span.open + 1..span.close];
            let value = self.get(name).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UnknownVariable,
                    format!("variable '{name}' is not defined"),
                    line_no,
                    column(&text, span.open),
                )
            })?;
            text.replace_range(span.open..=span.close, value);
        }
        Ok(text)
    }
}

/// Find the first complete `{...}` span, rejecting nested or unbalanced braces.
fn find_span(text: &str, line_no: usize) -> Result<Option<Span>, CompileError> {
    let mut open: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => {
                if open.is_some() {
                    return Err(CompileError::new(
                        ErrorKind::NestedVariable,
                        "variable use started inside another variable use",
                        line_no,
                        column(text, idx),
                    ));
                }
                open = Some(idx);
            }
            '}' => {
                let Some(start) = open else {
                    return Err(CompileError::new(
                        ErrorKind::UnmatchedBrace,
                        "closing brace without preceding opening brace",
                        line_no,
                        column(text, idx),
                    ));
                };
                return Ok(Some(Span {
                    open: start,
                    close: idx,
                }));
            }
            _ => {}
        }
    }
    match open {
        Some(start) => Err(CompileError::new(
            ErrorKind::UnclosedVariable,
            "variable use is never closed",
            line_no,
            column(text, start),
        )),
        None => Ok(None),
    }
}

fn column(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count() + 1
}
