//! Provider configuration error types.

/// Errors loading provider descriptors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderConfigError {
    /// Reading the descriptor file failed
    #[error("failed to read provider file: {0}")]
    Io(#[from] std::io::Error),

    /// The descriptor document is malformed
    #[error("invalid provider file: {0}")]
    Json(#[from] serde_json::Error),
}
