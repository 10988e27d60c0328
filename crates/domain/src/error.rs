use thiserror::Error;

/// Errors raised when constructing or estimating over domain values.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not enough onsets to estimate tempo: found {found}, need at least {needed}")]
    InsufficientOnsets { found: usize, needed: usize },
}

impl DomainError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }
}
