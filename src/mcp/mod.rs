//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tools, prompts and resources.

pub mod example;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::{input_schema, HandlerError, HandlerErrorKind, HandlerFuture, ServerHandler};
pub use server::McpServer;
