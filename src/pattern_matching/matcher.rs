//! Backtracking matcher over a compiled [`Pattern`].
//!
//! Matching walks the instruction sequence against the text one byte at a
//! time. Before consuming an atom the matcher peeks at the next instruction:
//! when it is a quantifier, the atom is repeated greedily and the remainder of
//! the program is retried from the longest repetition down to the shortest
//! allowed one.

use super::types::{Instruction, Match, Pattern, Shorthand};

impl Pattern {
    /// Returns the leftmost match of the pattern inside `text`.
    ///
    /// A leading `^` restricts the attempt to offset 0; otherwise every start
    /// offset from 0 up to and including `text.len()` is tried in order.
    pub fn find<T: AsRef<[u8]> + ?Sized>(&self, text: &T) -> Option<Match> {
        let text = text.as_ref();

        if let Some(Instruction::Begin) = self.program.first() {
            return self
                .match_here(1, text, 0)
                .map(|end| Match { offset: 0, len: end });
        }

        (0..=text.len()).find_map(|offset| {
            self.match_here(0, text, offset).map(|end| Match {
                offset,
                len: end - offset,
            })
        })
    }

    pub fn is_match<T: AsRef<[u8]> + ?Sized>(&self, text: &T) -> bool {
        self.find(text).is_some()
    }

    /// Tries to match `program[pc..]` at `text[at..]`, returning the end offset.
    fn match_here(&self, mut pc: usize, text: &[u8], mut at: usize) -> Option<usize> {
        loop {
            let Some(current) = self.program.get(pc) else {
                return Some(at);
            };

            match self.program.get(pc + 1) {
                Some(Instruction::Question) => return self.match_optional(current, pc + 2, text, at),
                Some(Instruction::Star) => return self.match_repeat(current, 0, pc + 2, text, at),
                Some(Instruction::Plus) => return self.match_repeat(current, 1, pc + 2, text, at),
                None if *current == Instruction::End => {
                    let tail = &text[at..];
                    return (tail.is_empty() || tail == b"\n").then_some(at);
                }
                _ => {}
            }

            match text.get(at) {
                Some(&c) if self.match_one(current, c) => {
                    pc += 1;
                    at += 1;
                }
                _ => return None,
            }
        }
    }

    fn match_optional(&self, atom: &Instruction, rest: usize, text: &[u8], at: usize) -> Option<usize> {
        if let Some(&c) = text.get(at) {
            if self.match_one(atom, c) {
                if let Some(end) = self.match_here(rest, text, at + 1) {
                    return Some(end);
                }
            }
        }
        self.match_here(rest, text, at)
    }

    fn match_repeat(
        &self,
        atom: &Instruction,
        min: usize,
        rest: usize,
        text: &[u8],
        at: usize,
    ) -> Option<usize> {
        let available = text[at..]
            .iter()
            .take_while(|&&c| self.match_one(atom, c))
            .count();
        if available < min {
            return None;
        }

        (min..=available)
            .rev()
            .find_map(|taken| self.match_here(rest, text, at + taken))
    }

    fn match_one(&self, instruction: &Instruction, c: u8) -> bool {
        match instruction {
            Instruction::Dot => c != b'\n',
            Instruction::Literal(expected) => *expected == c,
            Instruction::Shorthand(shorthand) => shorthand.matches(c),
            Instruction::Class { members, negated } => {
                class_contains(&self.classes[members.clone()], c) != *negated
            }
            // Anchors and quantifiers out of position never consume input.
            Instruction::Begin
            | Instruction::End
            | Instruction::Star
            | Instruction::Plus
            | Instruction::Question => false,
        }
    }
}

/// Tests `c` against the raw body of a character class.
///
/// Members are scanned left to right. `x-y` is a range; `\` introduces a
/// shorthand or an escaped literal; a bare `-` only counts as a literal when it
/// is the first or last member.
fn class_contains(members: &[u8], c: u8) -> bool {
    let mut i = 0;
    while i < members.len() {
        let rest = &members[i..];
        if in_range(c, rest) {
            return true;
        }

        if rest[0] == b'\\' {
            i += 1;
            if let Some(&escaped) = members.get(i) {
                let hit = match Shorthand::from_escape(escaped) {
                    Some(shorthand) => shorthand.matches(c),
                    None => c == escaped,
                };
                if hit {
                    return true;
                }
            }
        } else if rest[0] == c {
            if c == b'-' {
                return i == 0 || i + 1 == members.len();
            }
            return true;
        }

        i += 1;
    }
    false
}

fn in_range(c: u8, members: &[u8]) -> bool {
    c != b'-'
        && members.len() >= 3
        && members[0] != b'-'
        && members[1] == b'-'
        && (members[0]..=members[2]).contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
        Pattern::compile(pattern)
            .unwrap()
            .find(text)
            .map(|m| (m.offset, m.len))
    }

    #[test]
    fn unanchored_search_returns_leftmost_offset() {
        assert_eq!(find("ab+c", "xxabbbcxx"), Some((2, 5)));
    }

    #[test]
    fn anchors() {
        assert_eq!(find("^foo$", "foo"), Some((0, 3)));
        assert_eq!(find("^foo$", "foo\n"), Some((0, 3)));
        assert_eq!(find("^foo$", "xfoo"), None);
        assert_eq!(find("^foo$", "foox"), None);
    }

    #[test]
    fn end_anchor_allows_only_one_trailing_newline() {
        assert_eq!(find("foo$", "foo\n\n"), None);
        assert_eq!(find("foo$", "foo\r\n"), None);
    }

    #[test]
    fn character_classes() {
        assert_eq!(find("[0-9]+", "42"), Some((0, 2)));
        assert_eq!(find("[^0-9]+", "0123456789"), None);
        assert_eq!(find("[^0-9]+", "12ab3"), Some((2, 2)));
    }

    #[test]
    fn star_backtracks_to_let_the_tail_match() {
        assert_eq!(find("a*a", "aaa"), Some((0, 3)));
        assert_eq!(find("a.*b", "a1b2b3"), Some((0, 5)));
    }

    #[test]
    fn plus_requires_one_repetition() {
        assert_eq!(find("ab+", "a"), None);
        assert_eq!(find("ab+", "ab"), Some((0, 2)));
    }

    #[test]
    fn question_prefers_consuming() {
        assert_eq!(find("colou?r", "color"), Some((0, 5)));
        assert_eq!(find("colou?r", "colour"), Some((0, 6)));
        assert_eq!(find("ab?", "ab"), Some((0, 2)));
    }

    #[test]
    fn dot_does_not_match_newline() {
        assert_eq!(find("a.b", "a\nb"), None);
        assert_eq!(find("a.b", "a-b"), Some((0, 3)));
    }

    #[test]
    fn shorthands() {
        assert_eq!(find(r"\d+", "abc 123"), Some((4, 3)));
        assert_eq!(find(r"\w+", "  foo_1!"), Some((2, 5)));
        assert_eq!(find(r"\s", "a\x0bb"), Some((1, 1)));
        assert_eq!(find(r"\S+", "   xy "), Some((3, 2)));
        assert_eq!(find(r"\D", "12a"), Some((2, 1)));
        assert_eq!(find(r"\W", "ab-"), Some((2, 1)));
    }

    #[test]
    fn shorthands_inside_classes() {
        assert_eq!(find(r"[\d_]+", "x1_2y"), Some((1, 3)));
        assert_eq!(find(r"[\.]", "a.b"), Some((1, 1)));
    }

    #[test]
    fn dash_is_literal_only_at_class_edges() {
        assert_eq!(find("[-a]", "-"), Some((0, 1)));
        assert_eq!(find("[a-]", "-"), Some((0, 1)));
        assert_eq!(find("[a-z]", "-"), None);
    }

    #[test]
    fn empty_class_matches_nothing() {
        assert_eq!(find("[]", "abc"), None);
    }

    #[test]
    fn empty_pattern_matches_at_start() {
        assert_eq!(find("", "abc"), Some((0, 0)));
        assert_eq!(find("", ""), Some((0, 0)));
    }

    #[test]
    fn misplaced_anchors_never_match() {
        assert_eq!(find("a^b", "a^b"), None);
        assert_eq!(find("a$b", "a$b"), None);
    }

    #[test]
    fn leading_quantifier_never_matches() {
        assert_eq!(find("*a", "*a"), None);
    }

    #[test]
    fn matching_is_repeatable() {
        let pattern = Pattern::compile(r"^\s*ERROR.*timeout\d?$").unwrap();
        let text = "  ERROR: connection timeout3";
        let first = pattern.find(text);
        assert!(first.is_some());
        for _ in 0..10 {
            assert_eq!(pattern.find(text), first);
        }
    }
}
