//! Routing backend error types.

/// Errors from a walking-route backend.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error status code
    #[error("routing api error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("json parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Backend answered but found no path between the points
    #[error("no path between the requested points")]
    NoPath,
}
