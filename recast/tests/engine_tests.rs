//! Engine behaviour tests
//!
//! Checks that JavaScript-authored patterns and templates behave on the host
//! engine the way a browser `String.replace` user would expect, within the
//! documented token and option set.

use proptest::prelude::*;
use recast::{
    Action, Budget, CompiledPattern, Dialect, EngineConfig, Error, ErrorKind, Outcome, Request,
    map_options, process, translate_template,
};

fn compiled(pattern: &str, case_sensitive: bool) -> CompiledPattern {
    CompiledPattern::new(pattern, map_options(case_sensitive)).unwrap()
}

fn substitute(pattern: &str, template: &str, text: &str) -> Result<String, Error> {
    compiled(pattern, true).substitute(&translate_template(template, Dialect::JavaScript), text)
}

mod matching {
    use super::*;

    #[test]
    fn test_case_insensitive_cat() {
        let matches = compiled("cat", false).find_all("cats and caterpillars").unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].matched_text, "cat");
        assert_eq!((matches[0].start_offset, matches[0].end_offset), (0, 3));
        assert_eq!(matches[1].matched_text, "cat");
        assert_eq!((matches[1].start_offset, matches[1].end_offset), (9, 12));
    }

    #[test]
    fn test_case_sensitive_skips_other_case() {
        let matches = compiled("cat", true).find_all("Cat cat CAT").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start_offset, 4);
    }

    #[test]
    fn test_early_stop_takes_prefix() {
        let pattern = compiled(r"\d", true);
        let first_two: Vec<_> = pattern
            .test("1 2 3 4 5")
            .take(2)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1].start_offset, 2);
    }

    #[test]
    fn test_lookahead_pattern() {
        let matches = compiled(r"foo(?=bar)", true).find_all("foobar foobaz").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start_offset, 0);
    }

    #[test]
    fn test_lookbehind_pattern() {
        let matches = compiled(r"(?<=\$)\d+", true).find_all("cost $42 or 7").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_text, "42");
    }

    #[test]
    fn test_backreference_in_pattern() {
        let matches = compiled(r"(\w)\1", true).find_all("book keeper").unwrap();
        let found: Vec<_> = matches.iter().map(|m| m.matched_text.as_str()).collect();
        assert_eq!(found, vec!["oo", "ee"]);
    }

    #[test]
    fn test_offsets_in_characters_after_multibyte() {
        let matches = compiled("día", true).find_all("buen día, día").unwrap();
        let offsets: Vec<_> = matches.iter().map(|m| (m.start_offset, m.end_offset)).collect();
        assert_eq!(offsets, vec![(5, 8), (10, 13)]);
    }
}

mod context {
    use super::*;

    fn padded(prefix: usize, needle: &str, total: usize) -> String {
        let mut text = "x".repeat(prefix);
        text.push_str(needle);
        text.push_str(&"x".repeat(total - prefix - needle.len()));
        text
    }

    #[test]
    fn test_match_at_start_has_no_leading_marker() {
        let text = padded(0, "cat", 200);
        let m = &compiled("cat", true).find_all(&text).unwrap()[0];
        assert!(!m.context_snippet.starts_with("..."));
        assert!(m.context_snippet.ends_with("..."));
        assert_eq!(m.context_snippet, format!("cat{}...", "x".repeat(50)));
    }

    #[test]
    fn test_match_at_end_has_no_trailing_marker() {
        let text = padded(197, "cat", 200);
        let m = &compiled("cat", true).find_all(&text).unwrap()[0];
        assert_eq!(m.context_snippet, format!("...{}cat", "x".repeat(50)));
    }

    #[test]
    fn test_match_in_middle_clipped_both_sides() {
        let text = padded(100, "cat", 200);
        let m = &compiled("cat", true).find_all(&text).unwrap()[0];
        assert_eq!(m.context_snippet, format!("...{0}cat{0}...", "x".repeat(50)));
    }

    #[test]
    fn test_match_near_left_edge_clipped_right_only() {
        let text = padded(30, "cat", 200);
        let m = &compiled("cat", true).find_all(&text).unwrap()[0];
        assert!(!m.context_snippet.starts_with("..."));
        assert!(m.context_snippet.ends_with("..."));
        assert!(m.context_snippet.starts_with(&"x".repeat(30)));
    }

    #[test]
    fn test_custom_radius() {
        let config = EngineConfig {
            context_radius: 2,
            ..EngineConfig::default()
        };
        let pattern = recast::compile("cat", map_options(true), &config).unwrap();
        let m = &pattern.find_all("a black cat sat").unwrap()[0];
        assert_eq!(m.context_snippet, "...k cat s...");
    }
}

mod templates {
    use super::*;

    #[test]
    fn test_escaped_dollar_stays_literal() {
        let host = translate_template("Found: $$1 = $1, whole=$&, name=${tag}", Dialect::JavaScript);
        assert_eq!(host.to_host_syntax(), "Found: $$1 = ${1}, whole=${0}, name=${tag}");

        let output = compiled(r"(?<tag>\w+)", true)
            .substitute(&host, "x")
            .unwrap();
        assert_eq!(output, "Found: $1 = x, whole=x, name=x");
    }

    #[test]
    fn test_whole_match() {
        assert_eq!(substitute(r"\d+", "[$&]", "a 12 b 3").unwrap(), "a [12] b [3]");
    }

    #[test]
    fn test_literal_dollar_passthrough() {
        assert_eq!(substitute(r"\d+", "$ $x", "7").unwrap(), "$ $x");
    }

    #[test]
    fn test_numbered_group_followed_by_letters() {
        assert_eq!(substitute(r"(\d)", "$1st", "1").unwrap(), "1st");
    }
}

mod substitution {
    use super::*;

    #[test]
    fn test_swap_groups() {
        assert_eq!(substitute(r"(\w+)@(\w+)", "$2 via $1", "user@host").unwrap(), "host via user");
    }

    #[test]
    fn test_every_match_replaced_left_to_right() {
        assert_eq!(substitute("o", "0", "foo boo").unwrap(), "f00 b00");
    }

    #[test]
    fn test_no_match_is_identity() {
        assert_eq!(substitute("zzz", "$&$&", "nothing here").unwrap(), "nothing here");
    }

    #[test]
    fn test_not_idempotent() {
        let pattern = compiled("a", true);
        let text = "a b a";
        let before = pattern.find_all(text).unwrap();

        let template = translate_template("$&$&", Dialect::JavaScript);
        let output = pattern.substitute(&template, text).unwrap();
        let after = pattern.find_all(&output).unwrap();

        assert_eq!(output, "aa b aa");
        assert_ne!(before, after);
        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 4);
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_unbalanced_group() {
        let err = CompiledPattern::new("(", map_options(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_out_of_range_group() {
        let err = substitute(r"(\w+)", "$3", "word").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReplacement);
    }

    #[test]
    fn test_oversized_group_number() {
        let err = substitute(r"(\d)", "$99999999999", "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReplacement);
    }

    #[test]
    fn test_error_checked_even_without_matches() {
        let err = substitute(r"(\d+)", "${missing}", "no digits").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReplacement);
    }

    #[test]
    fn test_invalid_pattern_through_request() {
        let request = Request {
            find_pattern: "(".to_string(),
            replace_template: None,
            case_sensitive: true,
            text: "anything".to_string(),
            action: Action::Test,
        };
        let err = process(&request, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
    }

    #[test]
    fn test_backtrack_budget_aborts_scan() {
        let config = EngineConfig {
            budget: Budget {
                backtrack_limit: Some(1_000),
                size_limit: None,
            },
            ..EngineConfig::default()
        };
        let request = Request {
            find_pattern: r"(a|b|ab)*(?=c)".to_string(),
            replace_template: None,
            case_sensitive: false,
            text: "ab".repeat(40),
            action: Action::Test,
        };
        let err = process(&request, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionLimit);
    }
}

mod wire_format {
    use super::*;

    #[test]
    fn test_matches_serialise_camel_case() {
        let request = Request {
            find_pattern: "b".to_string(),
            replace_template: None,
            case_sensitive: true,
            text: "ab".to_string(),
            action: Action::Test,
        };
        let outcome = process(&request, &EngineConfig::default()).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "matches": [{
                    "matchedText": "b",
                    "startOffset": 1,
                    "endOffset": 2,
                    "contextSnippet": "ab"
                }]
            })
        );
    }

    #[test]
    fn test_substitution_serialises() {
        let outcome = Outcome::Substituted {
            substituted_text: "done".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"substitutedText":"done"}"#);
    }

    #[test]
    fn test_request_deserialises() {
        let request: Request = serde_json::from_str(
            r#"{"findPattern":"a","caseSensitive":false,"text":"A","action":"substitute","replaceTemplate":"b"}"#,
        )
        .unwrap();
        assert_eq!(request.action, Action::Substitute);
        assert_eq!(request.replace_template.as_deref(), Some("b"));
    }
}

fn flip_case(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_zero_matches_is_identity(text in "[a-y \n]{0,120}") {
        let output = substitute("z+", "[$&]", &text).unwrap();
        prop_assert_eq!(output, text);
    }

    #[test]
    fn prop_case_insensitive_ignores_case(
        needle in "[a-z]{1,3}",
        text in "[a-zA-Z ]{0,80}",
    ) {
        let lower = compiled(&needle, false).find_all(&text).unwrap();
        let upper = compiled(&needle.to_ascii_uppercase(), false)
            .find_all(&flip_case(&text))
            .unwrap();
        let spans = |ms: &[recast::Match]| -> Vec<(usize, usize)> {
            ms.iter().map(|m| (m.start_offset, m.end_offset)).collect()
        };
        prop_assert_eq!(spans(&lower), spans(&upper));
    }

    #[test]
    fn prop_offsets_are_ordered_and_in_bounds(text in "[abcé ]{0,100}") {
        let chars: Vec<char> = text.chars().collect();
        let matches = compiled("a+|é", true).find_all(&text).unwrap();
        let mut previous_end = 0;
        for m in &matches {
            prop_assert!(previous_end <= m.start_offset);
            prop_assert!(m.start_offset <= m.end_offset);
            prop_assert!(m.end_offset <= chars.len());
            let slice: String = chars[m.start_offset..m.end_offset].iter().collect();
            prop_assert_eq!(&slice, &m.matched_text);
            previous_end = m.end_offset;
        }
    }
}
