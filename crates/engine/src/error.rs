//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a filtering request is malformed. It is always
//!   the caller's fault and is reported back verbatim.
//! - [`Configuration`] thrown when an endpoint is wired incorrectly (duplicate
//!   tokens, missing workspace filter). It is a defect, never bad input.
//! - [`KeyNotFound`] and [`Forbidden`] thrown by the workspace access check.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Configuration`]: EngineError::Configuration
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Forbidden`]: EngineError::Forbidden
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
