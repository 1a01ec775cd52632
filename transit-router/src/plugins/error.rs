//! Plugin error types.

/// Errors from instantiating or running a transit plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// No constructor is registered under this identifier
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    /// Parameters are not a flat map of short strings and booleans
    #[error("invalid plugin parameters: {0}")]
    InvalidParams(String),

    /// A required parameter is absent
    #[error("missing plugin parameter: {0}")]
    MissingParam(&'static str),

    /// HTTP request failed (network error, timeout, etc.)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error status or an error document
    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response could not be decoded
    #[error("json parse error: {message}")]
    Json { message: String },

    /// The request was aborted before it completed
    #[error("request cancelled")]
    Cancelled,
}

impl PluginError {
    pub(crate) fn json(err: impl std::fmt::Display) -> Self {
        PluginError::Json {
            message: err.to_string(),
        }
    }
}
