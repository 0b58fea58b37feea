//! The module contains the errors the engine can throw.
//!
//! The errors fall in four groups:
//!
//! - [`KeyNotFound`] covers both "does not exist" and "not an owner". Callers
//!   must not be able to tell the two apart.
//! - validation errors ([`InvalidAmount`], [`InvalidCurrency`],
//!   [`InvalidName`], [`InvalidCategory`]) are raised before any write.
//! - store errors ([`Database`], [`Timeout`]) are recoverable: the operation
//!   was not applied and can be retried as a whole.
//! - [`ExistingKey`] is returned when a unique name is already taken.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidCurrency`]: EngineError::InvalidCurrency
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidCategory`]: EngineError::InvalidCategory
//!  [`Database`]: EngineError::Database
//!  [`Timeout`]: EngineError::Timeout
//!  [`ExistingKey`]: EngineError::ExistingKey
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` when the operation was rejected by the store and may be retried.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
