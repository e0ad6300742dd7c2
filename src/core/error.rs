use thiserror::Error;

/// Caller-facing failure of an engine operation
#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    #[error("already swiped this profile")]
    AlreadyExists,

    #[error("swipe limit reached")]
    ResourceExhausted,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal error: {0}")]
    Internal(String),
}

impl SwipeError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        SwipeError::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SwipeError::InvalidArgument { .. } => "invalid_argument",
            SwipeError::AlreadyExists => "already_exists",
            SwipeError::ResourceExhausted => "resource_exhausted",
            SwipeError::NotFound(_) => "not_found",
            SwipeError::Unauthenticated(_) => "unauthenticated",
            SwipeError::DeadlineExceeded => "deadline_exceeded",
            SwipeError::Internal(_) => "internal",
        }
    }
}

pub type SwipeResult<T> = Result<T, SwipeError>;
