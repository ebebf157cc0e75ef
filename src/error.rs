use thiserror::Error;

use crate::intake::form::FieldErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item already added: {0}")]
    Duplicate(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rejected by API: {0}")]
    Rejected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors the user can fix locally without contacting the API again
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Duplicate(_)
                | AppError::Validation(_)
                | AppError::InvalidInput(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors() {
        assert!(AppError::Duplicate("A1".into()).is_local());
        assert!(AppError::NotFound("A1".into()).is_local());
        assert!(!AppError::Rejected("bad".into()).is_local());
        assert!(!AppError::Internal("boom".into()).is_local());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AppError::Duplicate("12345".into()).to_string(),
            "Item already added: 12345"
        );
    }
}
