//! Compiled form of a trigger pattern.

use std::fmt;
use std::ops::Range;

/// Total bytes available to the character classes of a single pattern,
/// including the leading sentinel and one terminator per class.
pub const MAX_CHAR_CLASS_LEN: usize = 256;

/// Backslash shorthand classes (`\d \D \w \W \s \S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shorthand {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
}

impl Shorthand {
    /// Maps the byte following a backslash to its shorthand class, if any.
    pub fn from_escape(c: u8) -> Option<Self> {
        match c {
            b'd' => Some(Shorthand::Digit),
            b'D' => Some(Shorthand::NotDigit),
            b'w' => Some(Shorthand::Word),
            b'W' => Some(Shorthand::NotWord),
            b's' => Some(Shorthand::Space),
            b'S' => Some(Shorthand::NotSpace),
            _ => None,
        }
    }

    pub fn matches(self, c: u8) -> bool {
        match self {
            Shorthand::Digit => c.is_ascii_digit(),
            Shorthand::NotDigit => !c.is_ascii_digit(),
            Shorthand::Word => is_word(c),
            Shorthand::NotWord => !is_word(c),
            Shorthand::Space => is_space(c),
            Shorthand::NotSpace => !is_space(c),
        }
    }
}

fn is_word(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

// Vertical tab counts as whitespace here, unlike `u8::is_ascii_whitespace`.
fn is_space(c: u8) -> bool {
    c.is_ascii_whitespace() || c == 0x0b
}

/// One step of a compiled pattern.
///
/// Quantifiers are stored as their own instruction directly after the atom
/// they bind to; the matcher resolves them by looking one instruction ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Begin,
    End,
    Dot,
    Star,
    Plus,
    Question,
    Literal(u8),
    Shorthand(Shorthand),
    /// `members` indexes into the pattern's shared class buffer.
    Class { members: Range<usize>, negated: bool },
}

/// Location of a successful match inside the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub len: usize,
}

impl Match {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A compiled trigger pattern. Immutable once built; cheap to share by clone.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) source: String,
    pub(crate) program: Vec<Instruction>,
    pub(crate) classes: Vec<u8>,
}

impl Pattern {
    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.program
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}
