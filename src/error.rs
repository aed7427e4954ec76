//! Error types for pluginscout
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for pluginscout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Configuration-related errors (unreadable config, bad overrides, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive could not be opened or one of its entries could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Manifest text did not follow the `Name: value` format
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A resource locator could not be classified or decoded
    #[error("Malformed resource locator: {0}")]
    Locator(String),

    /// The resource search path could not be enumerated at all
    #[error("Failed to enumerate search path resources: {0}")]
    Enumeration(String),

    /// Resource not found (config file, inspected path, etc.)
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A specialized `Result` type for pluginscout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;
