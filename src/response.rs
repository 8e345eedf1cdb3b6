//! Response-side view of the fetch contract.

/// Minimal view of a transport response: the one operation status-set retry
/// decisions need. The wrapper never reads response bodies.
pub trait FetchResponse {
    /// Numeric HTTP status code of the response.
    fn status_code(&self) -> u16;
}

impl<B> FetchResponse for http::Response<B> {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

#[cfg(feature = "reqwest")]
impl FetchResponse for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}
