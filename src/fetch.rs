//! The wrapped request function: construction and the attempt loop.
//!
//! [`fetch_builder`] wraps any fetch-style transport - a function from a
//! request descriptor and options to a future of a response - and returns a
//! [`FetchRetry`] with the identical contract that transparently retries
//! failed or unsatisfactory attempts.
//!
//! # Quick Start
//!
//! ```rust
//! use refetch::{fetch_builder, RetryParams};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let transport = |url: String, _options: Option<()>| async move {
//!     let _ = url;
//!     Ok::<_, std::io::Error>(http::Response::builder().status(200).body(()).unwrap())
//! };
//!
//! let fetch = fetch_builder(
//!     transport,
//!     RetryParams::new()
//!         .retries(2)
//!         .retry_delay(Duration::from_millis(50))
//!         .retry_on([503, 504]),
//! );
//!
//! let response = fetch.fetch(String::from("https://example.test")).await.unwrap();
//! assert_eq!(response.status(), 200);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::input::FetchInput;
use crate::policy::{RetryEvent, RetryParams, RetryPolicy};
use crate::response::FetchResponse;

/// Observer invoked once before each scheduled retry.
pub type RetryHook<R, E> = Arc<dyn Fn(&RetryEvent<'_, R, E>) + Send + Sync>;

/// Per-call options: the transport's own options plus retry overrides.
///
/// The transport options are forwarded unchanged to every attempt; the
/// retry overrides are layered over the wrapper's defaults for this call
/// only.
pub struct FetchInit<O, R, E> {
    /// Options handed to the transport on every attempt.
    pub options: Option<O>,
    /// Per-call retry overrides; unset fields fall back to the wrapper's
    /// defaults.
    pub retry: RetryParams<R, E>,
}

impl<O, R, E> Default for FetchInit<O, R, E> {
    fn default() -> Self {
        Self {
            options: None,
            retry: RetryParams::new(),
        }
    }
}

impl<O, R, E> From<RetryParams<R, E>> for FetchInit<O, R, E> {
    fn from(retry: RetryParams<R, E>) -> Self {
        Self {
            options: None,
            retry,
        }
    }
}

impl<O, R, E> fmt::Debug for FetchInit<O, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchInit")
            .field("options", &self.options.as_ref().map(|_| ".."))
            .field("retry", &self.retry)
            .finish()
    }
}

/// A fetch-style request function wrapped with retry behavior.
///
/// Built by [`fetch_builder`]. Calls are independent: each owns its resolved
/// policy and attempt state, so one wrapper can serve any number of
/// concurrent calls.
pub struct FetchRetry<F, R, E> {
    transport: F,
    defaults: RetryPolicy<R, E>,
    on_retry: Option<RetryHook<R, E>>,
}

/// Wrap `transport` with retry behavior.
///
/// `defaults` may leave any field unset; unset fields resolve to the system
/// defaults (3 retries, fixed 500 ms delay, retry on 419/503/504). Each call
/// may override any field again via [`FetchRetry::fetch_with`].
pub fn fetch_builder<F, R, E>(transport: F, defaults: RetryParams<R, E>) -> FetchRetry<F, R, E> {
    FetchRetry {
        transport,
        defaults: RetryPolicy::system_default().resolve(defaults),
        on_retry: None,
    }
}

impl<F, R, E> FetchRetry<F, R, E> {
    /// Install an observer invoked once before each scheduled retry, with
    /// the pre-increment attempt number, the triggering outcome and the
    /// computed delay. The hook is synchronous and should not block; use it
    /// for logging or metrics.
    pub fn on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, R, E>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// The wrapper's resolved default policy.
    pub fn defaults(&self) -> &RetryPolicy<R, E> {
        &self.defaults
    }

    /// Issue `input` with no transport options and no per-call overrides.
    pub async fn fetch<I, O, Fut>(&self, input: I) -> Result<R, E>
    where
        F: Fn(I, Option<O>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        I: FetchInput,
        O: Clone,
        R: FetchResponse,
    {
        self.fetch_with(input, FetchInit::default()).await
    }

    /// Issue `input`, retrying per the resolved policy.
    ///
    /// The call resolves with the first satisfactory response, or with the
    /// final attempt's response once retries are exhausted; it fails with
    /// the final attempt's transport error. Transport errors are already
    /// uniformly typed as `E`, so they are surfaced as-is. Exactly one
    /// outcome is delivered per call.
    ///
    /// Attempts are strictly sequential: the next attempt is issued only
    /// after the previous outcome is known and the computed delay has
    /// elapsed. Dropping the returned future aborts the in-flight attempt
    /// and any pending delay. If a retry is wanted but the request body
    /// could not be duplicated, the current attempt's outcome is final.
    pub async fn fetch_with<I, O, Fut>(&self, input: I, init: FetchInit<O, R, E>) -> Result<R, E>
    where
        F: Fn(I, Option<O>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        I: FetchInput,
        O: Clone,
        R: FetchResponse,
    {
        let FetchInit { options, retry } = init;
        let policy = self.defaults.resolve(retry);

        let mut held = input.into_descriptor();
        let mut attempt: u32 = 0;

        loop {
            // Split off the copy for a possible next attempt before the
            // transport consumes this one.
            let (wire, reserve) = held.split(policy.may_retry_after(attempt));

            let outcome = (self.transport)(wire, options.clone()).await;

            let retrying = match &outcome {
                Ok(response) => policy.should_retry(attempt, None, Some(response)),
                Err(error) => policy.should_retry(attempt, Some(error), None),
            };
            if !retrying {
                return outcome;
            }
            let Some(next) = reserve else {
                // No duplicate to re-send; this attempt's outcome is final.
                return outcome;
            };

            let (error, response) = match &outcome {
                Ok(response) => (None, Some(response)),
                Err(error) => (Some(error), None),
            };
            let delay = policy.delay_for(attempt, error, response);

            if let Some(hook) = &self.on_retry {
                hook(&RetryEvent {
                    attempt,
                    retries: policy.retries(),
                    error,
                    response,
                    delay,
                });
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = u64::from(attempt),
                delay_ms = delay.as_millis() as u64,
                status = response.map(|r| u64::from(r.status_code())),
                "retrying request"
            );

            tokio::time::sleep(delay).await;

            held = next;
            attempt += 1;
        }
    }
}

impl<F: Clone, R, E> Clone for FetchRetry<F, R, E> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            defaults: self.defaults.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<F, R, E> fmt::Debug for FetchRetry<F, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRetry")
            .field("defaults", &self.defaults)
            .field("on_retry", &self.on_retry.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}
