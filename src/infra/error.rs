use thiserror::Error;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("roster file could not be parsed: {message}")]
    RosterParse { message: String },
    #[error("roster file is inconsistent: {0}")]
    Roster(#[from] DomainError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn roster_parse(message: impl Into<String>) -> Self {
        Self::RosterParse {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
