//! Router error types.

/// Errors from driving a query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// No configured provider covers the query and there is no usable
    /// fallback
    #[error("no transit provider available for this query")]
    NoProviderAvailable,

    /// More results were requested before any provider was selected
    #[error("no previous provider to fetch more results from")]
    NoPreviousProvider,
}
