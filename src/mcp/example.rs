//! Example tool, prompt and resource
//!
//! The reference handlers every scaffolded server starts from: an echo tool,
//! a content-writing prompt and a server information resource.

use schemars::JsonSchema;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use crate::config::ServerIdentity;
use crate::mcp::handler::{input_schema, HandlerError, HandlerFuture, ServerHandler};
use crate::mcp::types::{
    CallToolResult, GetPromptResult, Prompt, PromptArgument, PromptMessage, ReadResourceResult,
    Resource, ResourceContents, Role, Tool,
};

pub const EXAMPLE_TOOL: &str = "example_tool";
pub const EXAMPLE_PROMPT: &str = "example_prompt";

pub const MESSAGE_ERROR: &str = "Message must be a non-empty string";
pub const COUNT_ERROR: &str = "Count must be between 1 and 10";
pub const TOPIC_ERROR: &str = "Topic must be a non-empty string";

const DEFAULT_STYLE: &str = "professional";
const INFO_MIME_TYPE: &str = "text/plain";

/// Arguments of the example tool
///
/// Built by [`ExampleToolArgs::parse`]; the serde attribute only feeds the
/// advertised schema.
#[derive(Debug, JsonSchema, Validate)]
pub struct ExampleToolArgs {
    /// Message to process
    #[validate(length(min = 1, message = "Message must be a non-empty string"))]
    pub message: String,

    /// Number of times to repeat
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 10, message = "Count must be between 1 and 10"))]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl ExampleToolArgs {
    /// Parse raw tool arguments, reporting shape errors with the same
    /// messages as range errors
    pub fn parse(args: &Value) -> Result<Self, HandlerError> {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::invalid(MESSAGE_ERROR))?;

        let count = match args.get("count") {
            None | Some(Value::Null) => default_count(),
            Some(value) => whole_number(value).ok_or_else(|| HandlerError::invalid(COUNT_ERROR))?,
        };

        let parsed = Self {
            message: message.to_string(),
            count,
        };
        parsed
            .validate()
            .map_err(|errors| HandlerError::invalid(first_message(&errors)))?;

        Ok(parsed)
    }
}

/// Accepts `3` and `3.0`, rejects fractions, negatives and non-numbers
fn whole_number(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    let n = value.as_f64()?;
    if n.fract() != 0.0 || n < 0.0 {
        return None;
    }
    Some(if n > u32::MAX as f64 { u32::MAX } else { n as u32 })
}

fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    ["message", "count"]
        .iter()
        .filter_map(|field| fields.get(field))
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

/// Handler serving the example tool, prompt and info resource
#[derive(Debug, Clone)]
pub struct ExampleHandler {
    identity: ServerIdentity,
}

impl ExampleHandler {
    pub fn new(identity: ServerIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn example_tool(&self) -> Tool {
        Tool::new(
            EXAMPLE_TOOL,
            format!("Example tool for {}", self.identity.name),
            input_schema::<ExampleToolArgs>(),
        )
    }

    pub fn example_prompt(&self) -> Prompt {
        Prompt {
            name: EXAMPLE_PROMPT.to_string(),
            description: Some(format!("Example prompt for {}", self.identity.name)),
            arguments: vec![
                PromptArgument::new("topic", "Topic to generate content about", true),
                PromptArgument::new("style", "Writing style to use", false),
            ],
        }
    }

    pub fn info_resource(&self) -> Resource {
        Resource {
            uri: self.identity.info_uri(),
            name: "Server Information".to_string(),
            description: Some(format!("Information about {}", self.identity.name)),
            mime_type: Some(INFO_MIME_TYPE.to_string()),
        }
    }

    // ==================== Handlers ====================

    fn handle_example_tool(&self, args: &Value) -> Result<CallToolResult, HandlerError> {
        let args = ExampleToolArgs::parse(args)?;
        let repeated = vec![args.message.as_str(); args.count as usize].join(" ");

        Ok(CallToolResult::text(format!(
            "{} processed: {}",
            self.identity.name, repeated
        )))
    }

    fn handle_example_prompt(
        &self,
        args: &Map<String, Value>,
    ) -> Result<GetPromptResult, HandlerError> {
        let topic = args
            .get("topic")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| HandlerError::invalid(TOPIC_ERROR))?;
        let style = args
            .get("style")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STYLE);

        Ok(GetPromptResult {
            description: Some(format!("Generate {} content about {}", style, topic)),
            messages: vec![
                PromptMessage::text(
                    Role::User,
                    format!(
                        "You are an expert writer creating {} content about {}.",
                        style, topic
                    ),
                ),
                PromptMessage::text(
                    Role::User,
                    format!(
                        "Write comprehensive content about {} in a {} style.",
                        topic, style
                    ),
                ),
            ],
        })
    }

    fn handle_info_resource(&self) -> ReadResourceResult {
        ReadResourceResult {
            contents: vec![ResourceContents::text(
                self.identity.info_uri(),
                INFO_MIME_TYPE,
                info_text(&self.identity),
            )],
        }
    }
}

/// Body of the server information resource
pub fn info_text(identity: &ServerIdentity) -> String {
    format!(
        "{name} MCP Server

Description: {description}
Version: {version}
Author: {author}

This server provides:
- Tools: Custom functions and commands
- Prompts: Structured prompts for AI interactions
- Resources: Dynamic content and data access

Capabilities:
- Example tool for message processing
- Example prompt for content generation
- Server information resource

For more information about MCP, visit: https://modelcontextprotocol.io/
",
        name = identity.name,
        description = identity.description,
        version = identity.version,
        author = identity.author,
    )
}

impl ServerHandler for ExampleHandler {
    fn list_tools(&self) -> Vec<Tool> {
        vec![self.example_tool()]
    }

    fn call_tool<'a>(&'a self, name: &'a str, arguments: Value) -> HandlerFuture<'a, CallToolResult> {
        Box::pin(async move {
            match name {
                EXAMPLE_TOOL => self.handle_example_tool(&arguments),
                _ => Err(HandlerError::unknown_tool(name)),
            }
        })
    }

    fn list_prompts(&self) -> Vec<Prompt> {
        vec![self.example_prompt()]
    }

    fn get_prompt<'a>(
        &'a self,
        name: &'a str,
        arguments: Map<String, Value>,
    ) -> HandlerFuture<'a, GetPromptResult> {
        Box::pin(async move {
            match name {
                EXAMPLE_PROMPT => self.handle_example_prompt(&arguments),
                _ => Err(HandlerError::unknown_prompt(name)),
            }
        })
    }

    fn list_resources(&self) -> Vec<Resource> {
        vec![self.info_resource()]
    }

    fn read_resource<'a>(&'a self, uri: &'a str) -> HandlerFuture<'a, ReadResourceResult> {
        Box::pin(async move {
            if uri == self.identity.info_uri() {
                Ok(self.handle_info_resource())
            } else {
                Err(HandlerError::unknown_resource(uri))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handler::HandlerErrorKind;
    use serde_json::json;

    fn handler() -> ExampleHandler {
        ExampleHandler::new(
            ServerIdentity::new("weather", "2.1.0")
                .with_description("Forecasts on demand")
                .with_author("Ada Lovelace"),
        )
    }

    fn tool_text(result: &CallToolResult) -> &str {
        result.content[0].as_text().unwrap()
    }

    #[tokio::test]
    async fn test_example_tool_repeats_message() {
        let result = handler()
            .call_tool(EXAMPLE_TOOL, json!({"message": "hi", "count": 3}))
            .await
            .unwrap();
        assert_eq!(tool_text(&result), "weather processed: hi hi hi");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_example_tool_default_count() {
        let result = handler()
            .call_tool(EXAMPLE_TOOL, json!({"message": "hello"}))
            .await
            .unwrap();
        assert_eq!(tool_text(&result), "weather processed: hello");
    }

    #[tokio::test]
    async fn test_example_tool_accepts_integral_float() {
        let result = handler()
            .call_tool(EXAMPLE_TOOL, json!({"message": "a", "count": 2.0}))
            .await
            .unwrap();
        assert_eq!(tool_text(&result), "weather processed: a a");
    }

    #[tokio::test]
    async fn test_example_tool_rejects_bad_message() {
        for args in [
            json!({}),
            json!({"message": ""}),
            json!({"message": 42}),
            json!({"message": null}),
            json!("not an object"),
        ] {
            let err = handler().call_tool(EXAMPLE_TOOL, args).await.unwrap_err();
            assert_eq!(err.kind, HandlerErrorKind::InvalidArguments);
            assert_eq!(err.message, MESSAGE_ERROR);
        }
    }

    #[tokio::test]
    async fn test_example_tool_rejects_bad_count() {
        for count in [json!(0), json!(11), json!(-1), json!(2.5), json!("3"), json!(1e12)] {
            let err = handler()
                .call_tool(EXAMPLE_TOOL, json!({"message": "x", "count": count}))
                .await
                .unwrap_err();
            assert_eq!(err.message, COUNT_ERROR, "count {}", count);
        }
    }

    #[tokio::test]
    async fn test_example_tool_count_bounds_inclusive() {
        for count in [1, 10] {
            assert!(handler()
                .call_tool(EXAMPLE_TOOL, json!({"message": "x", "count": count}))
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn test_unknown_names() {
        let h = handler();
        assert_eq!(
            h.call_tool("nope", json!({})).await.unwrap_err().message,
            "Unknown tool: nope"
        );
        assert_eq!(
            h.get_prompt("nope", Map::new()).await.unwrap_err().message,
            "Unknown prompt: nope"
        );
        assert_eq!(
            h.read_resource("other://info").await.unwrap_err().message,
            "Unknown resource: other://info"
        );
    }

    #[tokio::test]
    async fn test_example_prompt() {
        let mut args = Map::new();
        args.insert("topic".to_string(), json!("rust"));
        let result = handler().get_prompt(EXAMPLE_PROMPT, args).await.unwrap();

        assert_eq!(
            result.description.as_deref(),
            Some("Generate professional content about rust")
        );
        assert_eq!(result.messages.len(), 2);
        assert_eq!(
            result.messages[1].content.as_text(),
            Some("Write comprehensive content about rust in a professional style.")
        );
    }

    #[tokio::test]
    async fn test_example_prompt_style_and_missing_topic() {
        let mut args = Map::new();
        args.insert("topic".to_string(), json!("tea"));
        args.insert("style".to_string(), json!("casual"));
        let result = handler().get_prompt(EXAMPLE_PROMPT, args).await.unwrap();
        assert_eq!(
            result.messages[0].content.as_text(),
            Some("You are an expert writer creating casual content about tea.")
        );

        let err = handler().get_prompt(EXAMPLE_PROMPT, Map::new()).await.unwrap_err();
        assert_eq!(err.message, TOPIC_ERROR);
    }

    #[tokio::test]
    async fn test_info_resource_contains_identity() {
        let result = handler().read_resource("weather://info").await.unwrap();
        let contents = &result.contents[0];
        let text = contents.text.as_deref().unwrap();

        assert_eq!(contents.uri, "weather://info");
        assert_eq!(contents.mime_type.as_deref(), Some("text/plain"));
        assert!(text.starts_with("weather MCP Server\n"));
        assert!(text.contains("Description: Forecasts on demand"));
        assert!(text.contains("Version: 2.1.0"));
        assert!(text.contains("Author: Ada Lovelace"));
    }

    #[test]
    fn test_descriptors_embed_name() {
        let h = handler();
        let tool = h.example_tool();
        assert_eq!(tool.description.as_deref(), Some("Example tool for weather"));
        assert_eq!(tool.input_schema["required"], json!(["message"]));
        assert_eq!(tool.input_schema["properties"]["count"]["default"], 1);

        let prompt = h.example_prompt();
        assert!(prompt.arguments[0].required);
        assert!(!prompt.arguments[1].required);

        assert_eq!(h.info_resource().description.as_deref(), Some("Information about weather"));
    }
}
