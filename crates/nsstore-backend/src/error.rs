/// Errors from primitive key-value backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot serve requests (closed, poisoned, unreachable).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A stored entry exists but cannot be read back as text.
    #[error("corrupt entry for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Failure injected by [`FaultyBackend`](crate::FaultyBackend).
    #[error("injected failure for {key}")]
    Injected { key: String },
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
