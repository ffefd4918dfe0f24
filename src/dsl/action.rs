//! Compiled action model — the unit of work the player steps through.
//!
//! A script compiles to a flat list of [`Action`]s: either a [`Action::NoteChord`]
//! holding one or more chords to strike in sequence, or a [`Directive`] that
//! changes tempo, rests, or jumps.

use std::fmt;
use std::str::FromStr;

/// A single key, identified by the script character that names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(char);

impl Key {
    pub fn new(ch: char) -> Self {
        Self(ch)
    }

    /// The character as written in the script.
    pub fn as_char(self) -> char {
        self.0
    }

    /// Whether this key is written as an uppercase letter (implies shift).
    pub fn is_upper(self) -> bool {
        self.0.is_uppercase()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-empty set of keys struck together.
///
/// Keys keep the order they were written in; repeats collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    keys: Vec<Key>,
}

impl Chord {
    /// Build a chord from keys. Returns `None` if no keys are given.
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Option<Self> {
        let mut unique: Vec<Key> = Vec::new();
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        if unique.is_empty() {
            None
        } else {
            Some(Self { keys: unique })
        }
    }

    /// A chord of exactly one key.
    pub fn single(key: Key) -> Self {
        Self { keys: vec![key] }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// True iff any key in the chord is an uppercase letter.
    pub fn is_upper(&self) -> bool {
        self.keys.iter().any(|k| k.is_upper())
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for key in &self.keys {
            write!(f, "{key}")?;
        }
        write!(f, "]")
    }
}

/// Directive keywords, written after a leading `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Bpm,
    Wait,
    Stop,
    Tag,
    Goto,
    Set,
}

/// A directive keyword that names no known directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid directive: {0}")]
pub struct UnknownKeyword(pub String);

impl FromStr for DirectiveKind {
    type Err = UnknownKeyword;

    /// Keywords match case-insensitively.
    fn from_str(word: &str) -> Result<Self, Self::Err> {
        match word.to_ascii_uppercase().as_str() {
            "BPM" => Ok(Self::Bpm),
            "WAIT" => Ok(Self::Wait),
            "STOP" => Ok(Self::Stop),
            "TAG" => Ok(Self::Tag),
            "GOTO" => Ok(Self::Goto),
            "SET" => Ok(Self::Set),
            _ => Err(UnknownKeyword(word.to_string())),
        }
    }
}

impl DirectiveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Bpm => "BPM",
            Self::Wait => "WAIT",
            Self::Stop => "STOP",
            Self::Tag => "TAG",
            Self::Goto => "GOTO",
            Self::Set => "SET",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A control directive with its raw string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub args: Vec<String>,
    pub line: usize,
}

impl Directive {
    pub fn new(kind: DirectiveKind, args: Vec<String>, line: usize) -> Self {
        Self { kind, args, line }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// One compiled step of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Chords struck one after another, one beat each.
    NoteChord { line: usize, chords: Vec<Chord> },
    Directive(Directive),
}

impl Action {
    /// Source line this action was compiled from.
    pub fn line(&self) -> usize {
        match self {
            Action::NoteChord { line, .. } => *line,
            Action::Directive(d) => d.line,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            Action::Directive(d) => Some(d),
            Action::NoteChord { .. } => None,
        }
    }

    pub fn is_directive(&self, kind: DirectiveKind) -> bool {
        self.as_directive().is_some_and(|d| d.kind == kind)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoteChord { line, chords } => {
                write!(f, "{line:03}: PLAY: ")?;
                for (i, chord) in chords.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{chord}")?;
                }
                Ok(())
            }
            Action::Directive(d) if d.args.is_empty() => write!(f, "{:03}: {}", d.line, d.kind),
            Action::Directive(d) => write!(f, "{:03}: {}: {}", d.line, d.kind, d.args.join(" ")),
        }
    }
}
