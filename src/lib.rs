//! # refetch
//!
//! Transparent retries for fetch-style request functions.
//!
//! `refetch` wraps a request-issuing function - anything from a request
//! descriptor and options to a future of a response - and returns a wrapper
//! with the identical contract that retries failed or unsatisfactory
//! attempts according to configurable policy. Call sites don't change;
//! resilience against transient faults and retriable status codes is layered
//! on from the outside.
//!
//! ## Design
//!
//! Three responsibilities compose per call:
//!
//! - **Policy resolution** ([`policy`]): per-call overrides layered over
//!   builder defaults over system defaults, producing one immutable
//!   [`RetryPolicy`] per call.
//! - **Input preparation** ([`input`]): a request body may be consumable
//!   only once, so descriptors are classified up front and duplicated
//!   before the transport can consume them.
//! - **The attempt loop** ([`fetch`]): issue, decide, wait, re-issue -
//!   strictly sequential, with exactly one outcome delivered per call.
//!
//! ## Quick Example
//!
//! ```rust
//! use refetch::{fetch_builder, RetryParams};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! // Any `Fn(input, options) -> Future<Output = Result<_, _>>` can be
//! // wrapped; here a stub standing in for an HTTP client.
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
//! let response = fetch.fetch(String::from("https://example.test/health")).await.unwrap();
//! assert_eq!(response.status(), 200);
//! # });
//! ```
//!
//! ## Feature Flags
//!
//! - `tracing`: emit a `tracing` event for every scheduled retry.
//! - `reqwest`: [`FetchInput`]/[`FetchResponse`] implementations for
//!   `reqwest::Request` and `reqwest::Response`.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod fetch;
pub mod input;
pub mod policy;
pub mod response;

// Re-exports
pub use fetch::{fetch_builder, FetchInit, FetchRetry, RetryHook};
pub use input::{Descriptor, FetchInput};
pub use policy::{DelayStrategy, RetryEvent, RetryOn, RetryParams, RetryPolicy};
pub use response::FetchResponse;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fetch::{fetch_builder, FetchInit, FetchRetry};
    pub use crate::input::{Descriptor, FetchInput};
    pub use crate::policy::{DelayStrategy, RetryEvent, RetryOn, RetryParams, RetryPolicy};
    pub use crate::response::FetchResponse;
}
