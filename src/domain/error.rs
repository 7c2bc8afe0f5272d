use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("field `{field}` is required")]
    Missing { field: &'static str },
    #[error("{message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn missing(field: &'static str) -> Self {
        Self::Missing { field }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
