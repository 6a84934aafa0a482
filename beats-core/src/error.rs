use thiserror::Error;

/// Failures surfaced by the storefront client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never completed, including client-side timeouts.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The operation requires a signed-in session and none is present.
    #[error("not signed in")]
    Unauthenticated,
    /// Non-2xx response with the server-supplied message, if any.
    #[error("server rejected request ({status}): {message}")]
    Server { status: u16, message: String },
    /// Local state has no record to act on.
    #[error("{0} not found")]
    NotFound(String),
    /// A mutation for the same item is already in flight.
    #[error("operation already in flight for item {0}")]
    Busy(String),
    /// Response body did not have the expected shape.
    #[error("unexpected response format")]
    Parse,
}

impl StoreError {
    /// Whether this failure was a client-side timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Network(e) if e.is_timeout())
    }
}
