use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Failed to fetch user records: {message}")]
    SourceFetch { message: String },

    #[error("Enrichment failed at position {position}: {message}")]
    Enrichment { position: usize, message: String },

    #[error("Result slot {position} is empty after all tasks completed")]
    ConsistencyViolation { position: usize },

    #[error("Username cannot be empty")]
    UsernameRequired,

    #[error("Password cannot be empty")]
    PasswordRequired,

    #[error("User '{username}' already exists")]
    UsernameTaken { username: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn source_fetch(message: impl Into<String>) -> Self {
        Self::SourceFetch {
            message: message.into(),
        }
    }

    pub fn enrichment(position: usize, message: impl Into<String>) -> Self {
        Self::Enrichment {
            position,
            message: message.into(),
        }
    }

    pub fn consistency_violation(position: usize) -> Self {
        Self::ConsistencyViolation { position }
    }

    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken {
            username: username.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// Failed list call. The record source's total count is carried alongside
/// the cause so callers can still report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source}")]
pub struct ListUsersError {
    pub total_count: u64,
    pub source: DomainError,
}

impl ListUsersError {
    pub fn new(total_count: u64, source: DomainError) -> Self {
        Self {
            total_count,
            source,
        }
    }
}
