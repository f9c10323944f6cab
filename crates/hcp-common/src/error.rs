//! Error types for hosted control plane reconcilers
//!
//! Reconcilers are pure functions over typed inputs, so the only failures are
//! missing identity inputs and manifest serialization. A reconciler that
//! returns an error has not touched the object it was given.

use thiserror::Error;

/// Main error type for hosted control plane reconcilers
#[derive(Debug, Error)]
pub enum Error {
    /// A required input (name, namespace, uid) was missing or empty
    #[error("configuration error for {object}: {message}")]
    Configuration {
        /// The input that failed validation (e.g., "ServiceAccount")
        object: String,
        /// Description of what's missing
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },
}

impl Error {
    /// Create a configuration error for the named input
    pub fn configuration(object: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Configuration {
            object: object.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Returns true for errors caused by bad inputs rather than rendering
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Require a non-empty string field, naming the object it belongs to
pub fn require<'a>(object: &str, field: &str, value: Option<&'a str>) -> Result<&'a str, Error> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::configuration(
            object,
            format!("{} must be set", field),
        )),
    }
}
