//! Geocoder error types.

/// Errors from a reverse-geocoding lookup.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// HTTP request failed
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Geocoder returned an error status
    #[error("geocoder error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("json parse error: {message}")]
    Json { message: String },
}
