//! Error types for docmap-core

use thiserror::Error;

/// Result type alias for docmap-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docmap-core
#[derive(Error, Debug)]
pub enum Error {
    /// Namespace string has no database/collection separator
    #[error("malformed namespace '{namespace}': expected 'database.collection'")]
    MalformedNamespace {
        /// The namespace as supplied by the caller
        namespace: String,
    },

    /// No schema is declared for the namespace
    #[error("no schema mapping for namespace '{namespace}'")]
    MissingSchema {
        /// Namespace that was looked up
        namespace: String,
    },

    /// The collection schema does not declare a primary key
    #[error("no primary key declared for namespace '{namespace}'")]
    MissingPrimaryKey {
        /// Namespace that was looked up
        namespace: String,
    },

    /// Field is not declared in the namespace's schema
    #[error("field '{field}' is not mapped in namespace '{namespace}'")]
    MissingField {
        /// Namespace that was looked up
        namespace: String,
        /// Field that was requested
        field: String,
    },

    /// A key survived filtering without a field descriptor
    #[error("field '{field}' passed filtering in '{namespace}' but has no descriptor")]
    UnmappedField {
        /// Namespace of the document
        namespace: String,
        /// Offending flattened key
        field: String,
    },

    /// Document root is not an object
    #[error("document must be a JSON object, got {kind}")]
    NotADocument {
        /// JSON type that was found at the root
        kind: &'static str,
    },

    /// Mapping configuration has an invalid shape
    #[error("invalid mapping for '{namespace}': {message}")]
    InvalidMapping {
        /// Namespace (or database) the entry belongs to
        namespace: String,
        /// Description of what's invalid
        message: String,
    },

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
