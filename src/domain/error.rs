use thiserror::Error;

use super::types::EntityId;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("content object {id} not found")]
    NotFound { id: EntityId },
    #[error("unknown {what} `{name}`")]
    UnknownName { what: &'static str, name: String },
    #[error("invalid content: {message}")]
    Validation { message: String },
    #[error("ownership invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn not_found(id: EntityId) -> Self {
        Self::NotFound { id }
    }

    pub fn unknown_name(what: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownName {
            what,
            name: name.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}
