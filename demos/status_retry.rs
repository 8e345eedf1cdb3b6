//! Retry on status codes with a scripted stand-in transport.
//!
//! Run with: `cargo run --example status_retry`

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use refetch::{fetch_builder, RetryParams};

#[tokio::main]
async fn main() {
    let attempts = Arc::new(AtomicU32::new(0));
    // Stands in for an HTTP client: overloaded for two attempts, then fine.
    let transport = {
        let attempts = attempts.clone();
        move |url: String, _options: Option<()>| {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                println!("-> attempt {n} against {url}");
                let status = if n < 2 { 503 } else { 200 };
                Ok::<_, std::io::Error>(
                    http::Response::builder().status(status).body(()).unwrap(),
                )
            }
        }
    };

    let fetch = fetch_builder(
        transport,
        RetryParams::new()
            .retries(3)
            .retry_delay(Duration::from_millis(200))
            .retry_on([503, 504]),
    )
    .on_retry(|event| {
        println!(
            "<- attempt {} of {} unsatisfactory, waiting {:?}",
            event.attempt + 1,
            event.retries + 1,
            event.delay
        );
    });

    let response = fetch
        .fetch(String::from("https://example.test/flaky"))
        .await
        .expect("the stub transport never fails");
    println!("resolved with status {}", response.status());
}
