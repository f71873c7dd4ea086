//! MCP Server Template
//!
//! Runtime and generator for stdio Model Context Protocol servers.
//! The `mcp` module serves tools, prompts and resources over stdio;
//! the `template` module renders new server projects from bundled layouts.

pub mod config;
pub mod error;
pub mod mcp;
pub mod template;

pub use config::{Config, ServerIdentity};
pub use error::{Result, ScaffoldError};
