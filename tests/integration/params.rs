//! Parameter grammar properties.

use partials::include::{parse_params, validate_params};
use partials::test_utils::TestSite;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Quoting {
    Double,
    Single,
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,6}"
}

/// Plain text plus the characters that need escaping.
fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!'\"-]{0,12}"
}

fn encode(value: &str, quoting: &Quoting) -> String {
    match quoting {
        Quoting::Double => format!("\"{}\"", value.replace('"', "\\\"")),
        Quoting::Single => format!("'{}'", value.replace('\'', "\\'")),
    }
}

proptest! {
    /// The mapping holds exactly the keys written, each with its last value.
    #[test]
    fn parsed_keys_and_values_match(
        entries in prop::collection::vec(
            (key_strategy(), text_strategy(), prop_oneof![Just(Quoting::Double), Just(Quoting::Single)]),
            0..8,
        ),
        separator in "[ \t]{1,3}",
    ) {
        let input = entries
            .iter()
            .map(|(key, value, quoting)| format!("{key}={}", encode(value, quoting)))
            .collect::<Vec<_>>()
            .join(&separator);

        prop_assert!(validate_params(&input).is_ok(), "rejected {:?}", input);

        let site = TestSite::new();
        let params = parse_params(&input, &site.context()).unwrap();

        let mut expected = BTreeMap::new();
        for (key, value, _) in &entries {
            expected.insert(key.clone(), Value::String(value.clone()));
        }
        let actual: BTreeMap<String, Value> = params.into_iter().collect();
        prop_assert_eq!(actual, expected);
    }

    /// Appending a character that cannot start or continue a token always fails.
    #[test]
    fn trailing_garbage_is_rejected(
        key in key_strategy(),
        value in "[a-z]{1,5}",
        garbage in "[!@#$%^&*()+=]{1,3}",
    ) {
        let input = format!("{key}='{value}' {garbage}");
        prop_assert!(validate_params(&input).is_err());
    }

    /// Validation never panics on arbitrary input.
    #[test]
    fn validate_never_panics(input in "\\PC{0,64}") {
        let _ = validate_params(&input);
    }
}

#[test]
fn test_variable_values_resolve_in_context() {
    let site = TestSite::new();
    let ctx = site.context_with(json!({"pageTitle": "World"}));
    let params = parse_params(r#"title="Hello" subtitle=pageTitle absent=nothing"#, &ctx).unwrap();
    assert_eq!(Value::Object(params), json!({"title": "Hello", "subtitle": "World", "absent": null}));
}

/// Scan time grows linearly: long inputs, valid and invalid, finish quickly.
#[test]
fn test_parse_time_is_linear_in_input_length() {
    fn time(input: &str) -> Duration {
        let start = Instant::now();
        let _ = validate_params(input);
        start.elapsed()
    }

    let small = 2_000;
    let large = small * 32;

    // Inputs that make a backtracking matcher explode.
    let cases: [fn(usize) -> String; 4] = [
        |n: usize| format!("a=\"{}", "\\\"".repeat(n)),
        |n: usize| format!("a='{}", "\\x".repeat(n)),
        |n: usize| "a=b ".repeat(n) + "!",
        |n: usize| format!("k{}", "-".repeat(n)),
    ];

    for build in cases {
        let small_time = time(&build(small));
        let large_time = time(&build(large));
        // 32x the input; allow generous slack for noisy machines.
        let budget = small_time.max(Duration::from_micros(200)) * 32 * 8;
        assert!(
            large_time <= budget,
            "scan time grew superlinearly: {small_time:?} -> {large_time:?}"
        );
        assert!(large_time < Duration::from_secs(1), "scan too slow: {large_time:?}");
    }
}
