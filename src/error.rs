//! Error types for the MCP server template
//!
//! This module defines the error hierarchy for serving and generating.

use thiserror::Error;

/// Main error type for the MCP server template
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Template rendering and generation errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required value: {field}")]
    MissingValue { field: String },

    #[error("Invalid server name '{name}': {message}")]
    InvalidName { name: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Template errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unknown placeholder {{{{{name}}}}} at byte {offset}")]
    UnknownPlaceholder { name: String, offset: usize },

    #[error("Residual placeholder {{{{{name}}}}} left in rendered output")]
    ResidualPlaceholder { name: String },

    #[error("Unknown layout: {name}")]
    UnknownLayout { name: String },

    #[error("Output directory is not empty: {path} (use --force to overwrite)")]
    OutputNotEmpty { path: String },

    #[error("Invalid snippets file: {message}")]
    InvalidSnippets { message: String },
}

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, ScaffoldError>;
