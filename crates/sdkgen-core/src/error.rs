//! Error handling for the sdkgen model compiler.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Errors fall in two families:
//! input errors, which only invalidate the schema subtree they were found in,
//! and resolution errors, which abort the whole generation run.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::input("#/components/schemas/Pet", "cyclic inheritance"))
//! }
//!
//! assert!(!might_fail().unwrap_err().is_run_fatal());
//! ```

use thiserror::Error;

/// Result type for sdkgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sdkgen operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The API description could not be loaded or is not supported
    #[error("API description error: {0}")]
    Document(String),

    /// A `$ref` points at nothing
    #[error("unresolved reference '{reference}' at {pointer}")]
    UnresolvedReference { reference: String, pointer: String },

    /// A type reference in the code model was never linked to a definition
    #[error("type '{name}' referenced from '{owner}' is not defined")]
    UnresolvedType { name: String, owner: String },

    /// Two types were declared with the same name in one container
    #[error("name '{name}' is already declared in '{container}'")]
    NameCollision { name: String, container: String },

    /// Two code model nodes were assigned the same output path
    #[error("output path '{path}' is claimed by both {first} and {second}")]
    PathCollision {
        path: String,
        first: String,
        second: String,
    },

    /// Malformed or contradictory schema
    #[error("{message} (at {pointer})")]
    Input { pointer: String, message: String },

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rendering task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Generation was cancelled between passes
    #[error("generation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new document error
    pub fn document<S: Into<String>>(msg: S) -> Self {
        Self::Document(msg.into())
    }

    /// Create a new input error for the schema at `pointer`
    pub fn input<P: Into<String>, M: Into<String>>(pointer: P, message: M) -> Self {
        Self::Input {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    /// Whether this error invalidates the whole run rather than one schema subtree.
    pub fn is_run_fatal(&self) -> bool {
        !matches!(self, Self::Input { .. })
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_subtree_scoped() {
        let err = Error::input("#/components/schemas/A", "multiple inheritance");
        assert!(!err.is_run_fatal());
        assert_eq!(
            err.to_string(),
            "multiple inheritance (at #/components/schemas/A)"
        );
    }

    #[test]
    fn test_resolution_errors_are_run_fatal() {
        let err = Error::UnresolvedReference {
            reference: "#/components/schemas/Missing".into(),
            pointer: "#/paths/~1pets/get".into(),
        };
        assert!(err.is_run_fatal());
        assert!(Error::Cancelled.is_run_fatal());
    }
}
