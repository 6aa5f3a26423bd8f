#[cfg(test)]
mod tests {
    use crate::pattern_matching::Pattern;
    use regex::bytes::Regex;

    // Patterns restricted to the syntax both engines interpret the same way.
    const PATTERNS: &[&str] = &[
        "ab+c",
        "a*a",
        "^foo",
        "bar$",
        "[0-9]+",
        "[^a-c]+x",
        r"\d+\.\d*",
        "x?y",
        r"\w+@\w+",
        ".*z",
        "a.c",
        r"[a-z_]+\s",
        "colou?r",
        r"^\s*$",
        r"ERROR.*timeout",
        r"[A-Fa-f0-9]+h",
        r"\S+=\S*",
        "q*",
    ];

    const INPUTS: &[&str] = &[
        "",
        "xxabbbcxx",
        "aaa",
        "foo bar",
        "foobar",
        "version 12.5 released",
        "xy y",
        "mail alice@example now",
        "abczzz",
        "a-c abc",
        "snake_case word",
        "color colour",
        "   ",
        "2024-01-01 ERROR socket timeout after 5s",
        "value ff0Ah",
        "key=value other",
        "ddddx",
    ];

    #[test]
    fn agrees_with_regex_on_the_common_subset() {
        for source in PATTERNS {
            let ours = Pattern::compile(source).unwrap();
            let oracle = Regex::new(&format!("(?-u){}", source)).unwrap();

            for input in INPUTS {
                let expected = oracle
                    .find(input.as_bytes())
                    .map(|m| (m.start(), m.end() - m.start()));
                let actual = ours.find(*input).map(|m| (m.offset, m.len));
                assert_eq!(
                    actual, expected,
                    "pattern {:?} against {:?}",
                    source, input
                );
            }
        }
    }

    #[test]
    fn trailing_newline_is_the_one_divergence_from_regex() {
        let ours = Pattern::compile("done$").unwrap();
        let oracle = Regex::new("done$").unwrap();

        assert!(ours.is_match("job done\n"));
        assert!(!oracle.is_match(b"job done\n"));
    }

    #[test]
    fn matches_non_utf8_lines() {
        let pattern = Pattern::compile(r"lost\s+\d+").unwrap();
        let line: &[u8] = b"\xff\xfe packets lost  17";
        let m = pattern.find(line).unwrap();
        assert_eq!(m.offset, 11);
        assert_eq!(m.end(), line.len());
    }
}
