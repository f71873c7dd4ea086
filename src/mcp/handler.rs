//! Request handler seam
//!
//! A server implements [`ServerHandler`] to expose its tools, prompts and
//! resources. Dispatch is a match on the requested name with a not-found arm.

use std::future::Future;
use std::pin::Pin;

use schemars::JsonSchema;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::mcp::types::{CallToolResult, GetPromptResult, Prompt, ReadResourceResult, Resource, Tool};

/// Boxed future returned by handler methods
pub type HandlerFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, HandlerError>> + Send + 'a>>;

/// Classification of a handler failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerErrorKind {
    /// No tool, prompt or resource with the requested name
    NotFound,

    /// Arguments failed validation
    InvalidArguments,

    /// Any other failure
    Internal,
}

/// Error raised by a handler, terminal for the request that caused it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    pub kind: HandlerErrorKind,
    pub message: String,
}

impl HandlerError {
    pub fn new(kind: HandlerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(HandlerErrorKind::NotFound, format!("Unknown tool: {}", name))
    }

    pub fn unknown_prompt(name: &str) -> Self {
        Self::new(HandlerErrorKind::NotFound, format!("Unknown prompt: {}", name))
    }

    pub fn unknown_resource(uri: &str) -> Self {
        Self::new(HandlerErrorKind::NotFound, format!("Unknown resource: {}", uri))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::InvalidArguments, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Internal, message)
    }
}

/// JSON schema for a tool's argument type, without the meta-schema header
pub fn input_schema<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    schema
}

/// Tools, prompts and resources exposed by a server
///
/// Listing is synchronous; invocation returns a boxed future so handlers
/// may await I/O. The default implementations expose nothing, so a server
/// only overrides the categories it supports.
pub trait ServerHandler: Send + Sync {
    fn list_tools(&self) -> Vec<Tool> {
        Vec::new()
    }

    fn call_tool<'a>(&'a self, name: &'a str, _arguments: Value) -> HandlerFuture<'a, CallToolResult> {
        Box::pin(async move { Err(HandlerError::unknown_tool(name)) })
    }

    fn list_prompts(&self) -> Vec<Prompt> {
        Vec::new()
    }

    fn get_prompt<'a>(
        &'a self,
        name: &'a str,
        _arguments: Map<String, Value>,
    ) -> HandlerFuture<'a, GetPromptResult> {
        Box::pin(async move { Err(HandlerError::unknown_prompt(name)) })
    }

    fn list_resources(&self) -> Vec<Resource> {
        Vec::new()
    }

    fn read_resource<'a>(&'a self, uri: &'a str) -> HandlerFuture<'a, ReadResourceResult> {
        Box::pin(async move { Err(HandlerError::unknown_resource(uri)) })
    }
}
