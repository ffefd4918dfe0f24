//! Line compiler — turns script text into a [`ScriptDocument`].
//!
//! Lines are compiled top to bottom. Each line has its `{name}` variables
//! expanded first, then is classified as a comment (`#`), a directive (`,`) or
//! a note line. `SET` directives feed the variable table as they are seen and
//! are stripped from the final action list; `TAG` directives are indexed last
//! so tag indices refer to the stripped list.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::action::{Action, Directive, DirectiveKind, UnknownKeyword};
use super::document::ScriptDocument;
use super::error::{CompileError, ErrorKind};
use super::lexer::Lexer;
use super::token::TokenKind;
use super::variables::VariableTable;

/// Compile script source into a document and the variables it defined.
pub fn compile_source(source: &str) -> Result<(ScriptDocument, VariableTable), CompileError> {
    let mut variables = VariableTable::new();
    let mut actions = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;

        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let line = variables.expand(raw, line_no)?;

        if let Some(body) = line.strip_prefix(',') {
            let directive = parse_directive(body, line_no)?;
            match directive.kind {
                DirectiveKind::Stop => {
                    debug!(line = line_no, "STOP reached, ignoring remaining lines");
                    break;
                }
                DirectiveKind::Set => {
                    let (name, value) = directive.args.split_first().ok_or_else(|| {
                        argument_error(&directive, "a name and a value")
                    })?;
                    variables.define(name.clone(), value.join(" "), line_no)?;
                }
                _ => {}
            }
            actions.push(Action::Directive(directive));
            continue;
        }

        compile_note_line(&line, line_no, &mut actions)?;
    }

    // SET has done its work in the variable table.
    actions.retain(|action| !action.is_directive(DirectiveKind::Set));

    let tags = index_tags(&actions);
    Ok((ScriptDocument::new(actions, tags), variables))
}

/// Parse the text after a leading `,` into a directive.
///
/// Arguments are split on single spaces, so doubled spaces yield empty
/// arguments.
pub fn parse_directive(body: &str, line_no: usize) -> Result<Directive, CompileError> {
    let mut parts = body.split(' ');
    let keyword = parts.next().unwrap_or_default();
    if keyword.is_empty() {
        return Err(CompileError::at_line(
            ErrorKind::EmptyDirective,
            "expected directive after ','",
            line_no,
        ));
    }

    let kind: DirectiveKind = keyword.parse().map_err(|err: UnknownKeyword| {
        CompileError::new(ErrorKind::UnknownDirective, err.to_string(), line_no, 2)
    })?;
    let directive = Directive::new(kind, parts.map(str::to_string).collect(), line_no);

    match kind {
        DirectiveKind::Set if directive.args.len() < 2 => {
            Err(argument_error(&directive, "a name and a value"))
        }
        DirectiveKind::Tag if directive.args.len() != 1 => {
            Err(argument_error(&directive, "exactly one tag name"))
        }
        _ => Ok(directive),
    }
}

fn argument_error(directive: &Directive, expected: &str) -> CompileError {
    CompileError::at_line(
        ErrorKind::ArgumentCount,
        format!(
            "{} expects {expected}, got {} argument(s)",
            directive.kind,
            directive.args.len()
        ),
        directive.line,
    )
}

/// Compile a note line into `NoteChord` and `WAIT` actions.
fn compile_note_line(
    line: &str,
    line_no: usize,
    actions: &mut Vec<Action>,
) -> Result<(), CompileError> {
    let tokens = Lexer::new(line, line_no).tokenize()?;
    for token in tokens {
        match token.kind {
            TokenKind::Chords(chords) => actions.push(Action::NoteChord {
                line: line_no,
                chords,
            }),
            TokenKind::Rest(units) => actions.push(Action::Directive(Directive::new(
                DirectiveKind::Wait,
                vec![units.to_string()],
                line_no,
            ))),
        }
    }
    Ok(())
}

/// Map each tag name to the index of its `TAG` action.
///
/// A repeated tag name overwrites the earlier entry.
fn index_tags(actions: &[Action]) -> HashMap<String, usize> {
    let mut tags = HashMap::new();
    for (index, action) in actions.iter().enumerate() {
        let Some(directive) = action.as_directive() else {
            continue;
        };
        if directive.kind != DirectiveKind::Tag {
            continue;
        }
        let Some(name) = directive.arg(0) else {
            continue;
        };
        if let Some(previous) = tags.insert(name.to_string(), index) {
            warn!(
                tag = name,
                line = directive.line,
                previous_index = previous,
                "tag defined more than once, the later definition wins"
            );
        }
    }
    tags
}
