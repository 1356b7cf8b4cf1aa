//! Property-based tests for matching and backoff.

use std::time::Duration;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use watchfor::{Backoff, MatchMode, Matcher, matches};

// ============================================================================
// LITERAL MATCHING: substring present <=> match
// ============================================================================

proptest! {
    #[test]
    fn embedded_literal_always_matches(
        prefix in "[ -~]{0,40}",
        needle in "[ -~]{1,20}",
        suffix in "[ -~]{0,40}",
    ) {
        let candidate = format!("{prefix}{needle}{suffix}");
        let m = Matcher::literal(needle.as_str(), false);
        prop_assert!(m.evaluate(candidate.as_bytes()));
    }

    #[test]
    fn literal_agrees_with_str_contains(
        haystack in "[a-c]{0,30}",
        needle in "[a-c]{1,4}",
    ) {
        let m = Matcher::literal(needle.as_str(), false);
        prop_assert_eq!(m.evaluate(haystack.as_bytes()), haystack.contains(&needle));
    }

    #[test]
    fn ignore_case_matches_any_casing(
        prefix in "[a-zA-Z0-9 ]{0,20}",
        needle in "[a-zA-Z]{1,12}",
    ) {
        let candidate = format!("{prefix}{}", needle.to_uppercase());
        let m = Matcher::literal(needle.to_lowercase(), true);
        prop_assert!(m.evaluate(candidate.as_bytes()));
    }

    #[test]
    fn absent_letter_never_matches(haystack in "[a-y ]{0,50}") {
        prop_assert!(!Matcher::literal("z", false).evaluate(haystack.as_bytes()));
        prop_assert!(!Matcher::literal("Z", true).evaluate(haystack.as_bytes()));
    }

    #[test]
    fn escaped_regex_agrees_with_literal(
        haystack in "[ -~]{0,30}",
        needle in "[ -~]{1,5}",
        ignore_case in any::<bool>(),
    ) {
        let literal = matches(haystack.as_bytes(), &needle, MatchMode::Literal, ignore_case).unwrap();
        let regex = matches(
            haystack.as_bytes(),
            &regex::escape(&needle),
            MatchMode::Regex,
            ignore_case,
        )
        .unwrap();
        prop_assert_eq!(literal, regex);
    }
}

// ============================================================================
// BACKOFF: monotone, capped, jitter bounded
// ============================================================================

proptest! {
    #[test]
    fn delays_never_decrease(
        interval_ms in 1u64..1_000,
        factor in 1.0f64..4.0,
        attempt in 1u32..64,
    ) {
        let backoff = Backoff::new(
            Duration::from_millis(interval_ms),
            factor,
            Duration::from_secs(3600),
        );
        prop_assert!(backoff.delay_for_attempt(attempt + 1) >= backoff.delay_for_attempt(attempt));
    }

    #[test]
    fn delays_respect_cap(
        interval_ms in 1u64..10_000,
        factor in 1.0f64..10.0,
        attempt in 0u32..1_000,
        cap_ms in 1u64..60_000,
    ) {
        let cap = Duration::from_millis(cap_ms);
        let backoff = Backoff::new(Duration::from_millis(interval_ms), factor, cap);
        prop_assert!(backoff.delay_for_attempt(attempt) <= cap);
    }

    #[test]
    fn jitter_stays_within_spread(
        interval_ms in 1u64..1_000,
        jitter in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let interval = Duration::from_millis(interval_ms);
        let backoff = Backoff::new(interval, 1.0, Duration::from_secs(3600)).with_jitter(jitter);
        let mut rng = StdRng::seed_from_u64(seed);

        let delay = backoff.next_delay(1, &mut rng).as_secs_f64();
        let base = interval.as_secs_f64();
        // Allow for float rounding at the bounds.
        let slack = 1e-6;
        prop_assert!(delay >= base * (1.0 - jitter) - slack);
        prop_assert!(delay <= base * (1.0 + jitter) + slack);
    }
}
