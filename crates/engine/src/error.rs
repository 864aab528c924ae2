//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`NotAuthenticated`] thrown when no known user is attached to a call.
//! - [`Validation`] thrown when an input breaks a model invariant.
//! - [`KeyNotFound`] thrown when an item is not found for the user.
//! - [`ExistingKey`] thrown when a unique name is already taken.
//! - [`Storage`] thrown when the blob store fails.
//!
//!  [`NotAuthenticated`]: EngineError::NotAuthenticated
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Storage`]: EngineError::Storage
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotAuthenticated, Self::NotAuthenticated) => true,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
