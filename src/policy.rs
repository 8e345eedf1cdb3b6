//! Retry policy types and three-tier resolution.
//!
//! Policies are pure data - they describe retry behavior but don't execute
//! it. A fully-specified [`RetryPolicy`] is produced by layering partial
//! [`RetryParams`] over fallbacks, with defined precedence:
//!
//! 1. call-time overrides (strongest)
//! 2. builder-time defaults
//! 3. system defaults: 3 retries, fixed 500 ms delay, retry on 419/503/504
//!
//! # Delay strategies
//!
//! - **Fixed**: the same delay before every retry
//! - **Linear**: delay grows linearly (`base`, 2×`base`, 3×`base`, ...)
//! - **Exponential**: delay doubles each retry (`base`, 2×`base`, 4×`base`, ...)
//! - **Custom**: computed from the attempt number and the outcome that
//!   triggered the retry

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::response::FetchResponse;

/// System-default number of retries beyond the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// System-default wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// System-default set of retriable status codes.
pub const DEFAULT_RETRY_ON: [u16; 3] = [419, 503, 504];

/// Computes the wait before the next attempt from the zero-based number of
/// the attempt that just finished and the outcome that triggered the retry
/// (exactly one of `error`/`response` is present).
pub type DelayFn<R, E> = Arc<dyn Fn(u32, Option<&E>, Option<&R>) -> Duration + Send + Sync>;

/// Decides whether another attempt should be made, given the zero-based
/// number of the attempt that just finished, the resolved maximum number of
/// retries, and the attempt's outcome.
pub type RetryFn<R, E> = Arc<dyn Fn(u32, u32, Option<&E>, Option<&R>) -> bool + Send + Sync>;

/// How long to wait before the next attempt.
///
/// A plain [`Duration`] converts into the `Fixed` form, which is the
/// normalized shape of a constant delay value.
///
/// # Examples
///
/// ```rust
/// use refetch::DelayStrategy;
/// use std::time::Duration;
///
/// let backoff: DelayStrategy<(), ()> = DelayStrategy::Exponential(Duration::from_millis(100));
///
/// assert_eq!(backoff.compute(0, None, None), Duration::from_millis(100));
/// assert_eq!(backoff.compute(1, None, None), Duration::from_millis(200));
/// assert_eq!(backoff.compute(2, None, None), Duration::from_millis(400));
/// ```
pub enum DelayStrategy<R, E> {
    /// The same delay before every retry.
    Fixed(Duration),
    /// Delay grows linearly: `base * (attempt + 1)`.
    Linear(Duration),
    /// Delay doubles each attempt: `base * 2^attempt`.
    Exponential(Duration),
    /// Caller-supplied delay computation.
    Custom(DelayFn<R, E>),
}

impl<R, E> DelayStrategy<R, E> {
    /// Build a `Custom` strategy from a closure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use refetch::DelayStrategy;
    /// use std::time::Duration;
    ///
    /// let strategy = DelayStrategy::<(), String>::custom(|attempt, _error, _response| {
    ///     Duration::from_millis(u64::from(attempt) * 10)
    /// });
    ///
    /// assert_eq!(strategy.compute(3, None, None), Duration::from_millis(30));
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32, Option<&E>, Option<&R>) -> Duration + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// The wait before the attempt that follows `attempt`.
    ///
    /// Built-in strategies use saturating arithmetic, so large attempt
    /// numbers cannot overflow the computed delay.
    pub fn compute(&self, attempt: u32, error: Option<&E>, response: Option<&R>) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Linear(base) => base.saturating_mul(attempt.saturating_add(1)),
            Self::Exponential(base) => base.saturating_mul(2u32.saturating_pow(attempt)),
            Self::Custom(f) => f(attempt, error, response),
        }
    }
}

impl<R, E> Clone for DelayStrategy<R, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(delay) => Self::Fixed(*delay),
            Self::Linear(base) => Self::Linear(*base),
            Self::Exponential(base) => Self::Exponential(*base),
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        }
    }
}

impl<R, E> fmt::Debug for DelayStrategy<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            Self::Linear(base) => f.debug_tuple("Linear").field(base).finish(),
            Self::Exponential(base) => f.debug_tuple("Exponential").field(base).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<R, E> From<Duration> for DelayStrategy<R, E> {
    fn from(delay: Duration) -> Self {
        Self::Fixed(delay)
    }
}

/// When another attempt should be made.
///
/// The status-set form retries whenever the transport failed outright, no
/// response was produced, or the response status is in the set - as long as
/// the current attempt number is below the resolved maximum. The custom form
/// replaces that rule entirely: the resolved maximum is handed to the
/// predicate, and whatever cap it encodes is the only cap there is.
///
/// Status-code collections convert directly:
///
/// ```rust
/// use refetch::RetryOn;
///
/// let on: RetryOn<http::Response<()>, String> = [503, 504].into();
/// let same: RetryOn<http::Response<()>, String> = vec![503, 504].into();
/// ```
pub enum RetryOn<R, E> {
    /// Retry on transport faults and on the listed response statuses.
    StatusCodes(Vec<u16>),
    /// Caller-supplied retry decision.
    Custom(RetryFn<R, E>),
}

impl<R, E> RetryOn<R, E> {
    /// Build a `Custom` decision from a closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(u32, u32, Option<&E>, Option<&R>) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl<R, E> Clone for RetryOn<R, E> {
    fn clone(&self) -> Self {
        match self {
            Self::StatusCodes(codes) => Self::StatusCodes(codes.clone()),
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        }
    }
}

impl<R, E> fmt::Debug for RetryOn<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusCodes(codes) => f.debug_tuple("StatusCodes").field(codes).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<R, E> From<Vec<u16>> for RetryOn<R, E> {
    fn from(codes: Vec<u16>) -> Self {
        Self::StatusCodes(codes)
    }
}

impl<R, E> From<&[u16]> for RetryOn<R, E> {
    fn from(codes: &[u16]) -> Self {
        Self::StatusCodes(codes.to_vec())
    }
}

impl<R, E, const N: usize> From<[u16; N]> for RetryOn<R, E> {
    fn from(codes: [u16; N]) -> Self {
        Self::StatusCodes(codes.to_vec())
    }
}

/// Partial retry configuration.
///
/// Any field may be left unset; resolution falls back through builder-time
/// defaults to the system defaults. Used both when building a wrapper and
/// as per-call overrides.
///
/// # Examples
///
/// ```rust
/// use refetch::{DelayStrategy, RetryParams};
/// use std::time::Duration;
///
/// let params: RetryParams<http::Response<()>, std::io::Error> = RetryParams::new()
///     .retries(4)
///     .retry_delay(DelayStrategy::Exponential(Duration::from_millis(250)))
///     .retry_on([429, 503]);
///
/// assert_eq!(params.retries, Some(4));
/// ```
pub struct RetryParams<R, E> {
    /// Maximum number of retries beyond the first attempt.
    pub retries: Option<u32>,
    /// Wait computation between attempts.
    pub retry_delay: Option<DelayStrategy<R, E>>,
    /// Retry decision.
    pub retry_on: Option<RetryOn<R, E>>,
}

impl<R, E> RetryParams<R, E> {
    /// Parameters with every field unset.
    pub fn new() -> Self {
        Self {
            retries: None,
            retry_delay: None,
            retry_on: None,
        }
    }

    /// Set the maximum number of retries beyond the first attempt.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Set the delay strategy. A plain [`Duration`] gives a fixed delay.
    pub fn retry_delay(mut self, delay: impl Into<DelayStrategy<R, E>>) -> Self {
        self.retry_delay = Some(delay.into());
        self
    }

    /// Set the retry decision. A collection of status codes gives the
    /// status-set rule.
    pub fn retry_on(mut self, retry_on: impl Into<RetryOn<R, E>>) -> Self {
        self.retry_on = Some(retry_on.into());
        self
    }
}

impl<R, E> Default for RetryParams<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> Clone for RetryParams<R, E> {
    fn clone(&self) -> Self {
        Self {
            retries: self.retries,
            retry_delay: self.retry_delay.clone(),
            retry_on: self.retry_on.clone(),
        }
    }
}

impl<R, E> fmt::Debug for RetryParams<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryParams")
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("retry_on", &self.retry_on)
            .finish()
    }
}

/// A fully-specified retry policy, immutable once resolved for a call.
///
/// # Examples
///
/// ```rust
/// use refetch::{RetryParams, RetryPolicy};
/// use std::time::Duration;
///
/// let policy: RetryPolicy<(), ()> =
///     RetryPolicy::system_default().resolve(RetryParams::new().retries(5));
///
/// assert_eq!(policy.retries(), 5);
/// // Unset fields keep their fallback.
/// assert_eq!(policy.delay_for(0, None, None), Duration::from_millis(500));
/// ```
pub struct RetryPolicy<R, E> {
    retries: u32,
    retry_delay: DelayStrategy<R, E>,
    retry_on: RetryOn<R, E>,
}

impl<R, E> RetryPolicy<R, E> {
    /// The system defaults: 3 retries, a fixed 500 ms delay, and the status
    /// set {419, 503, 504}.
    pub fn system_default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay: DelayStrategy::Fixed(DEFAULT_RETRY_DELAY),
            retry_on: RetryOn::StatusCodes(DEFAULT_RETRY_ON.to_vec()),
        }
    }

    /// Layer `overrides` over this policy: present fields win, unset fields
    /// fall back. Applying this twice - builder params over the system
    /// defaults, then call params over the builder policy - gives the
    /// call > builder > system precedence.
    pub fn resolve(&self, overrides: RetryParams<R, E>) -> Self {
        Self {
            retries: overrides.retries.unwrap_or(self.retries),
            retry_delay: overrides
                .retry_delay
                .unwrap_or_else(|| self.retry_delay.clone()),
            retry_on: overrides.retry_on.unwrap_or_else(|| self.retry_on.clone()),
        }
    }

    /// The resolved maximum number of retries beyond the first attempt.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// The resolved delay strategy.
    pub fn retry_delay(&self) -> &DelayStrategy<R, E> {
        &self.retry_delay
    }

    /// The resolved retry decision.
    pub fn retry_on(&self) -> &RetryOn<R, E> {
        &self.retry_on
    }

    /// The wait before the attempt that follows `attempt`.
    pub fn delay_for(&self, attempt: u32, error: Option<&E>, response: Option<&R>) -> Duration {
        self.retry_delay.compute(attempt, error, response)
    }
}

impl<R: FetchResponse, E> RetryPolicy<R, E> {
    /// Whether the outcome of `attempt` (zero-based, pre-increment) calls
    /// for another attempt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use refetch::{RetryParams, RetryPolicy};
    ///
    /// let policy: RetryPolicy<http::Response<()>, std::io::Error> =
    ///     RetryPolicy::system_default().resolve(RetryParams::new().retry_on([503]));
    ///
    /// let busy = http::Response::builder().status(503).body(()).unwrap();
    /// let ok = http::Response::builder().status(200).body(()).unwrap();
    ///
    /// assert!(policy.should_retry(0, None, Some(&busy)));
    /// assert!(!policy.should_retry(0, None, Some(&ok)));
    /// // The resolved maximum caps status-based retries.
    /// assert!(!policy.should_retry(3, None, Some(&busy)));
    /// ```
    pub fn should_retry(&self, attempt: u32, error: Option<&E>, response: Option<&R>) -> bool {
        match &self.retry_on {
            RetryOn::StatusCodes(codes) => {
                let unsatisfactory = error.is_some()
                    || response.map_or(true, |r| codes.contains(&r.status_code()));
                unsatisfactory && attempt < self.retries
            }
            RetryOn::Custom(f) => f(attempt, self.retries, error, response),
        }
    }

    /// Whether any outcome of `attempt` could be followed by another
    /// attempt. The attempt loop uses this to decide if a reserve copy of
    /// the request must be split off before the attempt goes on the wire.
    ///
    /// A custom predicate encodes its own cap, so the answer there is
    /// always yes.
    pub(crate) fn may_retry_after(&self, attempt: u32) -> bool {
        match &self.retry_on {
            RetryOn::StatusCodes(_) => attempt < self.retries,
            RetryOn::Custom(_) => true,
        }
    }
}

impl<R, E> Clone for RetryPolicy<R, E> {
    fn clone(&self) -> Self {
        Self {
            retries: self.retries,
            retry_delay: self.retry_delay.clone(),
            retry_on: self.retry_on.clone(),
        }
    }
}

impl<R, E> fmt::Debug for RetryPolicy<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("retry_on", &self.retry_on)
            .finish()
    }
}

/// Snapshot of a retry decision, passed to retry hooks.
///
/// Exactly one of `error`/`response` is present: the outcome of the attempt
/// that triggered the retry.
#[derive(Debug)]
pub struct RetryEvent<'a, R, E> {
    /// Zero-based number of the attempt whose outcome triggered the retry.
    pub attempt: u32,
    /// The resolved maximum number of retries for this call.
    pub retries: u32,
    /// The transport fault, when the attempt failed outright.
    pub error: Option<&'a E>,
    /// The unsatisfactory response, when the attempt produced one.
    pub response: Option<&'a R>,
    /// The wait scheduled before the next attempt.
    pub delay: Duration,
}

impl<R, E> Clone for RetryEvent<'_, R, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, E> Copy for RetryEvent<'_, R, E> {}

#[cfg(test)]
mod policy_tests {
    use super::*;

    type Response = http::Response<()>;

    fn response(status: u16) -> Response {
        http::Response::builder().status(status).body(()).unwrap()
    }

    fn policy(params: RetryParams<Response, String>) -> RetryPolicy<Response, String> {
        RetryPolicy::system_default().resolve(params)
    }

    #[test]
    fn system_default_values() {
        let policy: RetryPolicy<Response, String> = RetryPolicy::system_default();
        assert_eq!(policy.retries(), 3);
        assert_eq!(policy.delay_for(0, None, None), Duration::from_millis(500));
        match policy.retry_on() {
            RetryOn::StatusCodes(codes) => assert_eq!(codes, &[419, 503, 504]),
            RetryOn::Custom(_) => panic!("default retry_on should be a status set"),
        }
    }

    #[test]
    fn call_overrides_win_over_builder_and_system() {
        let builder = policy(RetryParams::new().retries(5));
        let resolved = builder.resolve(RetryParams::new().retries(1));
        assert_eq!(resolved.retries(), 1);
    }

    #[test]
    fn unset_call_fields_fall_back_to_builder() {
        let builder = policy(
            RetryParams::new()
                .retries(5)
                .retry_delay(Duration::from_millis(20)),
        );
        let resolved = builder.resolve(RetryParams::new().retry_on([500]));
        assert_eq!(resolved.retries(), 5);
        assert_eq!(resolved.delay_for(0, None, None), Duration::from_millis(20));
    }

    #[test]
    fn unset_builder_fields_fall_back_to_system() {
        let resolved = policy(RetryParams::new().retries(1));
        assert_eq!(
            resolved.delay_for(7, None, None),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn fixed_delay_ignores_attempt_number() {
        let resolved = policy(RetryParams::new().retry_delay(Duration::from_millis(42)));
        for attempt in [0, 1, 2, 100] {
            assert_eq!(
                resolved.delay_for(attempt, None, None),
                Duration::from_millis(42)
            );
        }
    }

    #[test]
    fn linear_delay_grows_with_attempt() {
        let strategy: DelayStrategy<Response, String> =
            DelayStrategy::Linear(Duration::from_millis(100));
        assert_eq!(strategy.compute(0, None, None), Duration::from_millis(100));
        assert_eq!(strategy.compute(1, None, None), Duration::from_millis(200));
        assert_eq!(strategy.compute(2, None, None), Duration::from_millis(300));
    }

    #[test]
    fn exponential_delay_doubles() {
        let strategy: DelayStrategy<Response, String> =
            DelayStrategy::Exponential(Duration::from_millis(100));
        assert_eq!(strategy.compute(0, None, None), Duration::from_millis(100));
        assert_eq!(strategy.compute(3, None, None), Duration::from_millis(800));
    }

    #[test]
    fn custom_delay_sees_the_outcome() {
        let strategy = DelayStrategy::<Response, String>::custom(|attempt, error, response| {
            assert!(error.is_none());
            assert_eq!(response.map(|r| r.status().as_u16()), Some(503));
            Duration::from_millis(u64::from(attempt))
        });
        let busy = response(503);
        assert_eq!(
            strategy.compute(2, None, Some(&busy)),
            Duration::from_millis(2)
        );
    }

    #[test]
    fn status_set_retries_listed_statuses_under_cap() {
        let resolved = policy(RetryParams::new().retries(2).retry_on([503, 504]));
        assert!(resolved.should_retry(0, None, Some(&response(503))));
        assert!(resolved.should_retry(1, None, Some(&response(504))));
        assert!(!resolved.should_retry(2, None, Some(&response(503))));
        assert!(!resolved.should_retry(0, None, Some(&response(200))));
        assert!(!resolved.should_retry(0, None, Some(&response(500))));
    }

    #[test]
    fn status_set_retries_transport_faults_under_cap() {
        let resolved = policy(RetryParams::new().retries(1));
        let error = String::from("connection reset");
        assert!(resolved.should_retry(0, Some(&error), None));
        assert!(!resolved.should_retry(1, Some(&error), None));
    }

    #[test]
    fn custom_predicate_replaces_the_cap() {
        let resolved = policy(RetryParams::new().retries(1).retry_on(
            RetryOn::predicate(|attempt, _retries, error, _response| {
                error.is_some() && attempt < 10
            }),
        ));
        let error = String::from("timeout");
        // Beyond the resolved maximum, but the predicate allows it.
        assert!(resolved.should_retry(5, Some(&error), None));
        assert!(!resolved.should_retry(5, None, Some(&response(503))));
    }

    #[test]
    fn may_retry_after_tracks_the_status_set_cap() {
        let resolved = policy(RetryParams::new().retries(2));
        assert!(resolved.may_retry_after(0));
        assert!(resolved.may_retry_after(1));
        assert!(!resolved.may_retry_after(2));

        let custom = policy(RetryParams::new().retries(0).retry_on(
            RetryOn::predicate(|_, _, _, _| false),
        ));
        assert!(custom.may_retry_after(99));
    }

    #[test]
    fn duration_converts_to_fixed() {
        let strategy: DelayStrategy<Response, String> = Duration::from_millis(5).into();
        assert!(matches!(strategy, DelayStrategy::Fixed(_)));
    }

    #[test]
    fn collections_convert_to_status_sets() {
        let from_array: RetryOn<Response, String> = [500, 502].into();
        let from_vec: RetryOn<Response, String> = vec![500, 502].into();
        let from_slice: RetryOn<Response, String> = [500u16, 502].as_slice().into();
        for on in [from_array, from_vec, from_slice] {
            match on {
                RetryOn::StatusCodes(codes) => assert_eq!(codes, vec![500, 502]),
                RetryOn::Custom(_) => panic!("expected a status set"),
            }
        }
    }

    #[test]
    fn debug_elides_closures() {
        let delay = DelayStrategy::<Response, String>::custom(|_, _, _| Duration::ZERO);
        assert_eq!(format!("{delay:?}"), "Custom(..)");
        let on = RetryOn::<Response, String>::predicate(|_, _, _, _| true);
        assert_eq!(format!("{on:?}"), "Custom(..)");
    }
}
