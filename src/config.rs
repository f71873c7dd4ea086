//! Configuration management for the MCP server template
//!
//! Handles the server identity and the environment variables it is read from.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variables consulted by [`Config::new`]
pub mod env {
    pub const SERVER_NAME: &str = "MCP_SERVER_NAME";
    pub const SERVER_VERSION: &str = "MCP_SERVER_VERSION";
    pub const SERVER_DESCRIPTION: &str = "MCP_SERVER_DESCRIPTION";
    pub const SERVER_AUTHOR: &str = "MCP_SERVER_AUTHOR";
}

/// Default author when none is configured
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Identity a server reports and a generated project is stamped with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// Server name, also the crate name and URI scheme of generated projects
    pub name: String,

    /// Server version
    pub version: String,

    /// Human-readable description
    pub description: String,

    /// Author
    pub author: String,
}

impl ServerIdentity {
    /// Create an identity with default description and author
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("{} MCP server", name),
            name,
            version: version.into(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// URI of the server information resource
    pub fn info_uri(&self) -> String {
        format!("{}://info", self.name)
    }

    /// Check that every field can be used verbatim in generated sources
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;

        if self.version.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                field: "version".to_string(),
            }
            .into());
        }

        for (field, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("description", &self.description),
            ("author", &self.author),
        ] {
            if value.contains("{{") || value.contains("}}") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must not contain '{{' or '}}'".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Server names double as crate names and URI schemes
fn validate_name(name: &str) -> Result<()> {
    let invalid = |message: &str| ConfigError::InvalidName {
        name: name.to_string(),
        message: message.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => {
            return Err(ConfigError::MissingValue {
                field: "name".to_string(),
            }
            .into())
        }
        Some(c) if !c.is_ascii_alphabetic() => {
            return Err(invalid("must start with an ASCII letter").into())
        }
        Some(_) => {}
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid("only ASCII letters, digits and '-' are allowed").into());
    }

    Ok(())
}

/// Configuration for the MCP server template
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity served by `serve` and used as generator defaults
    pub identity: ServerIdentity,
}

impl Config {
    /// Read the environment, falling back to package metadata
    ///
    /// Not validated here: an invalid environment value may still be
    /// replaced by a flag, so [`Config::with_overrides`] validates.
    pub fn new() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |var: &str, default: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            identity: ServerIdentity {
                name: read(env::SERVER_NAME, env!("CARGO_PKG_NAME")),
                version: read(env::SERVER_VERSION, env!("CARGO_PKG_VERSION")),
                description: read(env::SERVER_DESCRIPTION, env!("CARGO_PKG_DESCRIPTION")),
                author: read(env::SERVER_AUTHOR, DEFAULT_AUTHOR),
            },
        }
    }

    /// Apply command-line overrides on top of the environment, then validate
    pub fn with_overrides(
        mut self,
        name: Option<String>,
        version: Option<String>,
        description: Option<String>,
        author: Option<String>,
    ) -> Result<Self> {
        if let Some(name) = name {
            self.identity.name = name;
        }
        if let Some(version) = version {
            self.identity.version = version;
        }
        if let Some(description) = description {
            self.identity.description = description;
        }
        if let Some(author) = author {
            self.identity.author = author;
        }

        self.identity.validate()?;
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
