//! Observe retry scheduling through `tracing` events.
//!
//! Run with: `cargo run --example tracing_demo --features tracing`

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use refetch::{fetch_builder, DelayStrategy, RetryParams};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let attempts = Arc::new(AtomicU32::new(0));
    // Connection drops twice before the service answers.
    let transport = {
        let attempts = attempts.clone();
        move |url: String, _options: Option<()>| {
            let attempts = attempts.clone();
            async move {
                let _ = url;
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
                } else {
                    Ok(http::Response::builder().status(200).body(()).unwrap())
                }
            }
        }
    };

    let fetch = fetch_builder(
        transport,
        RetryParams::new()
            .retries(4)
            .retry_delay(DelayStrategy::Exponential(Duration::from_millis(100))),
    );

    let response = fetch
        .fetch(String::from("https://example.test/unstable"))
        .await
        .expect("succeeds on the third attempt");
    tracing::info!(status = u64::from(response.status().as_u16()), "settled");
}
