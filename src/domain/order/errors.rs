// ============================================================================
// Order Store Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("order {0} not found")]
    NotFound(i64),

    #[error("store error: {0}")]
    Store(String),
}

impl OrderError {
    /// Stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::InvalidInput(_) => "invalid_input",
            OrderError::NotFound(_) => "not_found",
            OrderError::Store(_) => "store_error",
        }
    }
}
