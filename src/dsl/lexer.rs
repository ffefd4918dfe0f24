//! Lexer for note lines.
//!
//! Splits a line such as `a [sd]F.. g` into chord runs and rest runs. A space
//! or period is one rest unit; `[`...`]` groups keys into one chord; any other
//! character is a single-key chord. Rests only separate chord runs, so rests
//! at the end of a line produce nothing.

use super::action::{Chord, Key};
use super::error::{CompileError, ErrorKind};
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str, line: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        let mut rests: u32 = 0;
        let mut rest_col = 0;

        while !self.is_at_end() {
            if is_rest(self.peek()) {
                if rests == 0 {
                    rest_col = self.col();
                }
                rests += 1;
                self.advance();
                continue;
            }

            if rests > 0 {
                tokens.push(Token {
                    kind: TokenKind::Rest(rests),
                    col: rest_col,
                });
                rests = 0;
            }

            tokens.push(self.lex_chord_run()?);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn col(&self) -> usize {
        self.pos + 1
    }

    /// Lex chords until the next rest unit or end of line.
    fn lex_chord_run(&mut self) -> Result<Token, CompileError> {
        let start_col = self.col();
        let mut chords = Vec::new();
        // Column of the open `[` and the keys collected so far.
        let mut group: Option<(usize, Vec<Key>)> = None;

        while !self.is_at_end() && !is_rest(self.peek()) {
            let col = self.col();
            match self.advance() {
                '[' => {
                    if group.is_some() {
                        return Err(self.error(
                            ErrorKind::NestedChord,
                            "chord group started inside another chord group",
                            col,
                        ));
                    }
                    group = Some((col, Vec::new()));
                }
                ']' => {
                    let Some((open_col, keys)) = group.take() else {
                        return Err(self.error(
                            ErrorKind::UnmatchedBracket,
                            "chord group ended but was not begun",
                            col,
                        ));
                    };
                    let chord = Chord::new(keys).ok_or_else(|| {
                        self.error(ErrorKind::EmptyChord, "chord group has no keys", open_col)
                    })?;
                    chords.push(chord);
                }
                ch => match group.as_mut() {
                    Some((_, keys)) => keys.push(Key::new(ch)),
                    None => chords.push(Chord::single(Key::new(ch))),
                },
            }
        }

        if let Some((open_col, _)) = group {
            return Err(self.error(
                ErrorKind::UnclosedChord,
                "unclosed chord group (rests are not allowed inside a group)",
                open_col,
            ));
        }

        Ok(Token {
            kind: TokenKind::Chords(chords),
            col: start_col,
        })
    }

    fn error(&self, kind: ErrorKind, message: &str, col: usize) -> CompileError {
        CompileError::new(kind, message, self.line, col)
    }
}

fn is_rest(ch: char) -> bool {
    ch == ' ' || ch == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, 1)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn chords(keys: &[&str]) -> TokenKind {
        TokenKind::Chords(
            keys.iter()
                .map(|k| Chord::new(k.chars().map(Key::new)).unwrap())
                .collect(),
        )
    }

    #[test]
    fn lex_single_keys() {
        assert_eq!(lex("abc"), vec![chords(&["a", "b", "c"])]);
    }

    #[test]
    fn lex_rests_split_runs() {
        assert_eq!(
            lex("a b.c"),
            vec![
                chords(&["a"]),
                TokenKind::Rest(1),
                chords(&["b"]),
                TokenKind::Rest(1),
                chords(&["c"]),
            ]
        );
    }

    #[test]
    fn lex_mixed_rest_characters_accumulate() {
        assert_eq!(
            lex("a . .b"),
            vec![chords(&["a"]), TokenKind::Rest(4), chords(&["b"])]
        );
    }

    #[test]
    fn lex_leading_rest_is_kept() {
        assert_eq!(lex("..a"), vec![TokenKind::Rest(2), chords(&["a"])]);
    }

    #[test]
    fn lex_trailing_rest_is_dropped() {
        assert_eq!(lex("a  "), vec![chords(&["a"])]);
        assert!(lex(" . ").is_empty());
    }

    #[test]
    fn lex_bracket_group() {
        assert_eq!(lex("[ab]C"), vec![chords(&["ab", "C"])]);
    }

    #[test]
    fn lex_token_columns() {
        let tokens = Lexer::new("ab  [cd]", 1).tokenize().unwrap();
        let cols: Vec<usize> = tokens.iter().map(|t| t.col).collect();
        assert_eq!(cols, vec![1, 3, 5]);
    }

    #[test]
    fn lex_nested_group_error() {
        let err = Lexer::new("[a[b]]", 2).tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::NestedChord);
        assert_eq!(err.line, 2);
        assert_eq!(err.col, 3);
    }

    #[test]
    fn lex_unmatched_close_error() {
        let err = Lexer::new("ab]", 1).tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnmatchedBracket);
    }

    #[test]
    fn lex_unclosed_group_error() {
        let err = Lexer::new("x[ab", 1).tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclosedChord);
        assert_eq!(err.col, 2);
    }

    #[test]
    fn lex_rest_inside_group_error() {
        let err = Lexer::new("[a b]", 1).tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclosedChord);
    }

    #[test]
    fn lex_empty_group_error() {
        let err = Lexer::new("a[]", 1).tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyChord);
    }

    #[test]
    fn lex_empty_input() {
        assert!(lex("").is_empty());
    }
}
