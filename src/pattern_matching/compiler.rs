use log::trace;

use super::types::{Instruction, Pattern, Shorthand, MAX_CHAR_CLASS_LEN};
use crate::error_handling::types::PatternError;

impl Pattern {
    /// Compiles `source` into an instruction sequence.
    ///
    /// Every pattern byte yields at most one instruction, so the program never
    /// outgrows the pattern. Class contents are copied into one buffer shared
    /// by all classes; running past [`MAX_CHAR_CLASS_LEN`] is an error, as are
    /// an unterminated class and a backslash with nothing after it.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let bytes = source.as_bytes();
        let mut program = Vec::with_capacity(bytes.len());
        // Slot 0 is a sentinel so the first class member has a terminator before it.
        let mut classes = vec![0u8];

        let mut i = 0;
        while i < bytes.len() {
            let instruction = match bytes[i] {
                b'^' => Instruction::Begin,
                b'$' => Instruction::End,
                b'.' => Instruction::Dot,
                b'*' => Instruction::Star,
                b'+' => Instruction::Plus,
                b'?' => Instruction::Question,
                b'\\' => {
                    let escaped = *bytes
                        .get(i + 1)
                        .ok_or(PatternError::TrailingBackslash { position: i })?;
                    i += 1;
                    match Shorthand::from_escape(escaped) {
                        Some(shorthand) => Instruction::Shorthand(shorthand),
                        None => Instruction::Literal(escaped),
                    }
                }
                b'[' => {
                    let (class, close) = compile_class(bytes, i, &mut classes)?;
                    i = close;
                    class
                }
                c => Instruction::Literal(c),
            };
            program.push(instruction);
            i += 1;
        }

        trace!(
            "compiled pattern '{}' into {} instructions ({} class bytes)",
            source,
            program.len(),
            classes.len()
        );

        Ok(Pattern {
            source: source.to_string(),
            program,
            classes,
        })
    }
}

/// Copies the body of the class opened at `open` into `classes` and returns
/// the class instruction together with the index of the closing `]`.
fn compile_class(
    bytes: &[u8],
    open: usize,
    classes: &mut Vec<u8>,
) -> Result<(Instruction, usize), PatternError> {
    let mut i = open + 1;
    let negated = bytes.get(i) == Some(&b'^');
    if negated {
        i += 1;
        if i >= bytes.len() {
            return Err(PatternError::UnterminatedClass { position: open });
        }
    }

    let start = classes.len();
    loop {
        match bytes.get(i) {
            None => return Err(PatternError::UnterminatedClass { position: open }),
            Some(b']') => break,
            Some(b'\\') => {
                // The escape and its operand are stored together.
                if classes.len() >= MAX_CHAR_CLASS_LEN - 1 {
                    return Err(PatternError::ClassBufferExhausted {
                        limit: MAX_CHAR_CLASS_LEN,
                    });
                }
                let escaped = *bytes
                    .get(i + 1)
                    .ok_or(PatternError::DanglingClassEscape { position: i })?;
                classes.push(b'\\');
                classes.push(escaped);
                i += 2;
            }
            Some(&c) => {
                if classes.len() >= MAX_CHAR_CLASS_LEN {
                    return Err(PatternError::ClassBufferExhausted {
                        limit: MAX_CHAR_CLASS_LEN,
                    });
                }
                classes.push(c);
                i += 1;
            }
        }
    }

    // Room is still needed for the terminator.
    if classes.len() >= MAX_CHAR_CLASS_LEN {
        return Err(PatternError::ClassBufferExhausted {
            limit: MAX_CHAR_CLASS_LEN,
        });
    }
    let members = start..classes.len();
    classes.push(0);

    Ok((Instruction::Class { members, negated }, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_and_metacharacters() {
        let pattern = Pattern::compile("^a.b$").unwrap();
        assert_eq!(
            pattern.instructions(),
            &[
                Instruction::Begin,
                Instruction::Literal(b'a'),
                Instruction::Dot,
                Instruction::Literal(b'b'),
                Instruction::End,
            ]
        );
    }

    #[test]
    fn escapes_become_shorthands_or_literals() {
        let pattern = Pattern::compile(r"\d\.\W\$").unwrap();
        assert_eq!(
            pattern.instructions(),
            &[
                Instruction::Shorthand(Shorthand::Digit),
                Instruction::Literal(b'.'),
                Instruction::Shorthand(Shorthand::NotWord),
                Instruction::Literal(b'$'),
            ]
        );
    }

    #[test]
    fn quantifiers_follow_their_atom() {
        let pattern = Pattern::compile("a*b+c?").unwrap();
        assert_eq!(
            pattern.instructions(),
            &[
                Instruction::Literal(b'a'),
                Instruction::Star,
                Instruction::Literal(b'b'),
                Instruction::Plus,
                Instruction::Literal(b'c'),
                Instruction::Question,
            ]
        );
    }

    #[test]
    fn classes_share_one_buffer() {
        let pattern = Pattern::compile("[a-z][^0-9]").unwrap();
        assert_eq!(
            pattern.instructions(),
            &[
                Instruction::Class {
                    members: 1..4,
                    negated: false
                },
                Instruction::Class {
                    members: 5..8,
                    negated: true
                },
            ]
        );
        assert_eq!(pattern.classes, b"\0a-z\x000-9\0".to_vec());
    }

    #[test]
    fn empty_class_is_allowed() {
        let pattern = Pattern::compile("[]a").unwrap();
        assert_eq!(pattern.instructions().len(), 2);
    }

    #[test]
    fn trailing_backslash_is_rejected() {
        assert_eq!(
            Pattern::compile(r"abc\").unwrap_err(),
            PatternError::TrailingBackslash { position: 3 }
        );
    }

    #[test]
    fn unterminated_classes_are_rejected() {
        assert_eq!(
            Pattern::compile("x[abc").unwrap_err(),
            PatternError::UnterminatedClass { position: 1 }
        );
        assert_eq!(
            Pattern::compile("[^").unwrap_err(),
            PatternError::UnterminatedClass { position: 0 }
        );
        assert_eq!(
            Pattern::compile("[").unwrap_err(),
            PatternError::UnterminatedClass { position: 0 }
        );
    }

    #[test]
    fn dangling_escape_inside_class_is_rejected() {
        assert_eq!(
            Pattern::compile(r"[a\").unwrap_err(),
            PatternError::DanglingClassEscape { position: 2 }
        );
    }

    #[test]
    fn class_buffer_limit_is_enforced() {
        // One sentinel plus 254 members plus the terminator fills the buffer exactly.
        let fits = format!("[{}]", "a".repeat(MAX_CHAR_CLASS_LEN - 2));
        assert!(Pattern::compile(&fits).is_ok());

        let too_long = format!("[{}]", "a".repeat(MAX_CHAR_CLASS_LEN - 1));
        assert_eq!(
            Pattern::compile(&too_long).unwrap_err(),
            PatternError::ClassBufferExhausted {
                limit: MAX_CHAR_CLASS_LEN
            }
        );
    }

    #[test]
    fn class_buffer_limit_spans_all_classes() {
        let half = "b".repeat(MAX_CHAR_CLASS_LEN / 2);
        let source = format!("[{}][{}]", half, half);
        assert!(matches!(
            Pattern::compile(&source),
            Err(PatternError::ClassBufferExhausted { .. })
        ));
    }
}
