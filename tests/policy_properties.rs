//! Property coverage for policy resolution and delay arithmetic.

use proptest::prelude::*;
use refetch::{DelayStrategy, RetryParams, RetryPolicy};
use std::time::Duration;

type Response = http::Response<()>;

proptest! {
    #[test]
    fn fixed_delay_is_constant_for_any_attempt(
        delay_ms in 0u64..10_000,
        attempt in 0u32..1_000,
    ) {
        let strategy: DelayStrategy<Response, String> = Duration::from_millis(delay_ms).into();
        prop_assert_eq!(
            strategy.compute(attempt, None, None),
            Duration::from_millis(delay_ms)
        );
    }

    #[test]
    fn linear_delay_matches_its_formula(base_ms in 1u64..1_000, attempt in 0u32..100) {
        let strategy: DelayStrategy<Response, String> =
            DelayStrategy::Linear(Duration::from_millis(base_ms));
        prop_assert_eq!(
            strategy.compute(attempt, None, None),
            Duration::from_millis(base_ms) * (attempt + 1)
        );
    }

    #[test]
    fn exponential_delay_matches_its_formula(base_ms in 1u64..1_000, attempt in 0u32..20) {
        let strategy: DelayStrategy<Response, String> =
            DelayStrategy::Exponential(Duration::from_millis(base_ms));
        prop_assert_eq!(
            strategy.compute(attempt, None, None),
            Duration::from_millis(base_ms) * 2u32.pow(attempt)
        );
    }

    #[test]
    fn retries_resolution_prefers_call_over_builder_over_system(
        builder_retries in proptest::option::of(0u32..10),
        call_retries in proptest::option::of(0u32..10),
    ) {
        let mut builder_params = RetryParams::<Response, String>::new();
        if let Some(n) = builder_retries {
            builder_params = builder_params.retries(n);
        }
        let mut call_params = RetryParams::new();
        if let Some(n) = call_retries {
            call_params = call_params.retries(n);
        }

        let policy = RetryPolicy::system_default()
            .resolve(builder_params)
            .resolve(call_params);

        let expected = call_retries.or(builder_retries).unwrap_or(3);
        prop_assert_eq!(policy.retries(), expected);
    }

    #[test]
    fn status_set_decision_matches_its_formula(
        status in 100u16..600,
        attempt in 0u32..6,
        retries in 0u32..6,
        codes in proptest::collection::vec(100u16..600, 0..4),
    ) {
        let policy = RetryPolicy::<Response, String>::system_default()
            .resolve(RetryParams::new().retries(retries).retry_on(codes.clone()));

        let response = http::Response::builder().status(status).body(()).unwrap();
        prop_assert_eq!(
            policy.should_retry(attempt, None, Some(&response)),
            codes.contains(&status) && attempt < retries
        );

        // A transport fault retries regardless of the status set.
        let fault = String::from("connection reset");
        prop_assert_eq!(
            policy.should_retry(attempt, Some(&fault), None),
            attempt < retries
        );
    }
}
