use thiserror::Error;

use super::types::EntityKind;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("expected a {expected} record, got {actual} `{id}`")]
    KindMismatch {
        expected: EntityKind,
        actual: EntityKind,
        id: String,
    },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn kind_mismatch(expected: EntityKind, actual: EntityKind, id: impl Into<String>) -> Self {
        Self::KindMismatch {
            expected,
            actual,
            id: id.into(),
        }
    }
}
