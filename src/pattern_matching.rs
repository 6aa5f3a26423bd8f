//! Minimal backtracking pattern engine used to recognise trigger lines.
//!
//! Supported syntax: literals, `.`, `^` (leading only), `$` (trailing only),
//! `[...]` / `[^...]` with ranges and escapes, `\d \D \w \W \s \S`, escaped
//! literals, and the greedy postfix quantifiers `?`, `*` and `+`. There are no
//! groups, alternation or counted repetition.
//!
//! ```
//! use dualcap::pattern_matching::Pattern;
//!
//! let pattern = Pattern::compile("ab+c").unwrap();
//! let m = pattern.find("xxabbbcxx").unwrap();
//! assert_eq!((m.offset, m.len), (2, 5));
//! ```

pub mod compiler;
pub mod matcher;
#[cfg(test)]
pub mod tests;
pub mod types;

pub use types::{Instruction, Match, Pattern, Shorthand, MAX_CHAR_CLASS_LEN};
