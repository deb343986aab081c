//! Engine error taxonomy.
//!
//! Each variant maps to a stable [`ErrorKind`], and each kind to a distinct
//! process exit code, so callers can tell "not found" from "conflict" from
//! "insufficient stock" without parsing messages.

use rust_decimal::Decimal;

use crate::storage::{Entity, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("insufficient stock of {item}: {available} {unit} available, {required} {unit} required")]
    InsufficientStock {
        item: String,
        unit: String,
        available: Decimal,
        required: Decimal,
    },

    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(entity, id) => Self::NotFound {
                entity,
                id: id.to_string(),
            },
            e if e.is_constraint_violation() => Self::Conflict(e.to_string()),
            e => Self::Storage(e),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Stable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    InvalidState,
    InsufficientStock,
    Storage,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Storage => 1,
            Self::NotFound => 3,
            Self::InvalidArgument => 4,
            Self::Conflict => 5,
            Self::InvalidState => 6,
            Self::InsufficientStock => 7,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
