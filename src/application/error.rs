use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{access::AccessError, repos::RepoError, roster::RosterError},
    config::LoadError,
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Failure surfaced at the binary boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl From<RosterError> for AppError {
    fn from(error: RosterError) -> Self {
        match error {
            RosterError::Access(err) => Self::Access(err),
            RosterError::Repo(err) => Self::Repo(err),
        }
    }
}

impl AppError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 78,
            AppError::Access(AccessError::PermissionDenied { .. }) => 77,
            AppError::Domain(DomainError::NotFound { .. })
            | AppError::Domain(DomainError::UnknownName { .. })
            | AppError::Repo(RepoError::NotFound) => 66,
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Repo(RepoError::InvalidInput { .. }) => 65,
            AppError::Infra(InfraError::RosterParse { .. } | InfraError::Roster(_)) => 65,
            AppError::Infra(InfraError::Io(_)) => 74,
            _ => 1,
        }
    }

    /// The error message followed by each of its sources.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(inner) = current {
            let message = inner.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            current = inner.source();
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_errors_flatten_into_app_errors() {
        let denied = RosterError::Access(AccessError::denied("nope"));
        let error = AppError::from(denied);
        assert!(matches!(error, AppError::Access(_)));
        assert_eq!(error.exit_code(), 77);
    }

    #[test]
    fn chain_skips_transparent_repeats() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "roster.toml missing");
        let error = AppError::from(InfraError::from(io));
        assert_eq!(
            error.chain(),
            vec!["io error: roster.toml missing", "roster.toml missing"]
        );
        assert_eq!(error.exit_code(), 74);
    }
}
