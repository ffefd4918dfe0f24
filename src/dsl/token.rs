//! Token types for the note line lexer.

use super::action::Chord;

/// A token produced by the note line lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based column of the first character of the token.
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A run of chords with no rest between them.
    Chords(Vec<Chord>),
    /// A run of rest units (spaces or periods) followed by more chords.
    Rest(u32),
}
