//! Error types for the type registry

use std::collections::TryReserveError;

use thiserror::Error;

use crate::version::TypeVersion;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Type registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Type not found: {name}")]
    TypeNotFound { name: String },

    #[error("Incompatible version for {name}: current v{current}, requested v{requested}")]
    IncompatibleVersion {
        name: String,
        current: TypeVersion,
        requested: TypeVersion,
    },

    #[error("Migration failed for {name}: v{from} -> v{to}")]
    MigrationFailed {
        name: String,
        from: TypeVersion,
        to: TypeVersion,
        #[source]
        source: Option<MigrationError>,
    },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Validation failed for {name}: {size} bytes rejected")]
    ValidationFailed { name: String, size: usize },

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

impl RegistryError {
    pub(crate) fn not_found(name: &str) -> Self {
        RegistryError::TypeNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn incompatible(name: &str, current: TypeVersion, requested: TypeVersion) -> Self {
        RegistryError::IncompatibleVersion {
            name: name.to_string(),
            current,
            requested,
        }
    }
}

/// Failures reported by a migration capability
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("allocation of {requested} bytes failed")]
    AllocationFailed {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("expected a {expected}-byte buffer, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Custom(String),
}

impl MigrationError {
    /// Build an allocation failure from a failed reservation
    pub fn allocation(requested: usize, source: TryReserveError) -> Self {
        MigrationError::AllocationFailed { requested, source }
    }
}
