//! Error types for the Fabric registry

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or reconciling registries and environments
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Record lookup failed
    #[error(
        "entry \"{key}\" in registry \"{registry}\" does not exist{}",
        environment_suffix(.environment.as_deref())
    )]
    NotFound {
        /// Registry that was searched
        registry: String,
        /// Primary lookup key
        key: String,
        /// Environment the entry was expected to come from
        environment: Option<String>,
    },

    /// Record with the same key is already registered
    #[error("entry \"{key}\" in registry \"{registry}\" already exists")]
    AlreadyExists {
        /// Registry that was written to
        registry: String,
        /// Conflicting key
        key: String,
    },

    /// Mutation requested on a read-only environment
    #[error("operation not supported: {operation} on environment \"{environment}\"")]
    UnsupportedOperation {
        /// Operation that was attempted
        operation: &'static str,
        /// Environment that rejected it
        environment: String,
    },

    /// A record is missing a required field or carries an invalid value
    #[error("validation error: {0}")]
    Validation(String),

    /// Copy, move or remove failure during a rename or migration
    #[error("failed to {operation} {} to {}: {source}", .from.display(), .to.display())]
    FileOperation {
        /// Operation that failed
        operation: &'static str,
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Component directory answered with a non-success status
    #[error("remote error: {0}")]
    Remote(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Base64 decoding error
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// URL parsing error
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Build a `NotFound` error for a registry lookup
    #[must_use]
    pub fn not_found(
        registry: impl Into<String>,
        key: impl Into<String>,
        environment: Option<&str>,
    ) -> Self {
        Self::NotFound {
            registry: registry.into(),
            key: key.into(),
            environment: environment.map(ToString::to_string),
        }
    }

    /// Build an `UnsupportedOperation` error
    #[must_use]
    pub fn unsupported(operation: &'static str, environment: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation,
            environment: environment.into(),
        }
    }

    /// Whether this error reports a missing record
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn environment_suffix(environment: Option<&str>) -> String {
    environment.map_or_else(String::new, |env| format!(" in environment \"{env}\""))
}
