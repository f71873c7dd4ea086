//! MCP Server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::ServerIdentity;
use crate::error::Result;
use crate::mcp::handler::{HandlerErrorKind, ServerHandler};
use crate::mcp::types::*;

/// MCP server dispatching JSON-RPC requests to a [`ServerHandler`]
pub struct McpServer<H> {
    identity: ServerIdentity,

    handler: H,

    /// Whether the client sent `notifications/initialized`
    initialized: bool,
}

impl<H: ServerHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(identity: ServerIdentity, handler: H) -> Self {
        Self {
            identity,
            handler,
            initialized: false,
        }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio until EOF or a termination signal
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();

        tracing::info!("{} MCP Server running on stdio", self.identity.name);
        self.serve(stdin, stdout, shutdown_signal()).await
    }

    /// Serve line-delimited JSON-RPC until EOF or `shutdown` resolves
    ///
    /// Each request is handled to completion before the next line is read,
    /// so a shutdown only interrupts the wait for input.
    pub async fn serve<R, W, S>(&mut self, mut reader: R, mut writer: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down {} MCP Server...", self.identity.name);
                    break;
                }
                read = reader.read_until(b'\n', &mut line) => read?,
            };

            if read == 0 {
                tracing::info!("Input closed, stopping {} MCP Server", self.identity.name);
                break;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                writer.write_all(response_str.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        writer.shutdown().await?;
        Ok(())
    }

    /// Handle one raw input line; blank lines produce nothing
    pub async fn handle_line(&mut self, line: &[u8]) -> Option<JsonRpcResponse> {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Input line is not valid UTF-8: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };
        if line.trim().is_empty() {
            return None;
        }

        self.handle_message(line).await
    }

    /// Handle an incoming JSON-RPC message, returning the response if one is due
    pub async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(req) => req,
            Err(e) => {
                let id = value
                    .get("id")
                    .and_then(|id| serde_json::from_value(id.clone()).ok());
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(e.to_string()),
                ));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        tracing::debug!(method = %request.method, "Handling request");
        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => to_value(self.initialize_result()),
            methods::PING => Ok(json!({})),
            methods::LIST_TOOLS => to_value(ListToolsResult {
                tools: self.handler.list_tools(),
            }),
            methods::CALL_TOOL => to_value(self.handle_call_tool(&request).await),
            methods::LIST_PROMPTS => to_value(ListPromptsResult {
                prompts: self.handler.list_prompts(),
            }),
            methods::GET_PROMPT => self.handle_get_prompt(&request).await,
            methods::LIST_RESOURCES => to_value(ListResourcesResult {
                resources: self.handler.list_resources(),
            }),
            methods::READ_RESOURCE => self.handle_read_resource(&request).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => {
                self.initialized = true;
                tracing::debug!("Client initialized");
            }
            method if method.starts_with(methods::NOTIFICATION_PREFIX) => {
                tracing::debug!(method, "Ignoring notification");
            }
            method => tracing::warn!(method, "Ignoring notification for unknown method"),
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: self.identity.name.clone(),
                version: self.identity.version.clone(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                resources: Some(ResourcesCapability::default()),
                prompts: Some(PromptsCapability::default()),
            },
            instructions: Some(self.identity.description.clone()),
        }
    }

    /// Tool failures are reported inside a successful response
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> CallToolResult {
        let params: CallToolParams = match parse_params(request) {
            Ok(params) => params,
            Err(message) => return CallToolResult::error(format!("Invalid tool parameters: {}", message)),
        };

        match self.handler.call_tool(&params.name, params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error in tool {}: {}", params.name, e);
                CallToolResult::error(format!("Error executing {}: {}", params.name, e))
            }
        }
    }

    async fn handle_get_prompt(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: GetPromptParams =
            parse_params(request).map_err(|m| JsonRpcError::invalid_params(format!("Invalid prompt parameters: {}", m)))?;

        match self.handler.get_prompt(&params.name, params.arguments).await {
            Ok(result) => to_value(result),
            Err(e) => {
                tracing::error!("Error in prompt {}: {}", params.name, e);
                Err(wrap_error(e.kind, format!("Error with prompt {}: {}", params.name, e)))
            }
        }
    }

    async fn handle_read_resource(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: ReadResourceParams =
            parse_params(request).map_err(|m| JsonRpcError::invalid_params(format!("Invalid resource parameters: {}", m)))?;

        match self.handler.read_resource(&params.uri).await {
            Ok(result) => to_value(result),
            Err(e) => {
                tracing::error!("Error reading resource {}: {}", params.uri, e);
                Err(wrap_error(e.kind, format!("Error reading resource {}: {}", params.uri, e)))
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(request: &JsonRpcRequest) -> std::result::Result<T, String> {
    let params = request
        .params
        .clone()
        .ok_or_else(|| "missing params".to_string())?;
    serde_json::from_value(params).map_err(|e| e.to_string())
}

fn to_value<T: Serialize>(result: T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

fn wrap_error(kind: HandlerErrorKind, message: String) -> JsonRpcError {
    match kind {
        HandlerErrorKind::NotFound | HandlerErrorKind::InvalidArguments => {
            JsonRpcError::invalid_params(message)
        }
        HandlerErrorKind::Internal => JsonRpcError::internal_error(message),
    }
}

/// Resolves on SIGINT or SIGTERM (ctrl-c only on non-unix targets)
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = until_signal("ctrl-c", tokio::signal::ctrl_c()) => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                until_signal("ctrl-c", tokio::signal::ctrl_c()).await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        until_signal("ctrl-c", tokio::signal::ctrl_c()).await;
    }
}

/// Wait for a signal listener; one that fails to install never resolves
async fn until_signal<F, E>(name: &str, listener: F)
where
    F: Future<Output = std::result::Result<(), E>>,
    E: std::fmt::Display,
{
    if let Err(e) = listener.await {
        tracing::warn!("Failed to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::example::ExampleHandler;

    fn server() -> McpServer<ExampleHandler> {
        let identity = ServerIdentity::new("demo", "0.3.0");
        McpServer::new(identity.clone(), ExampleHandler::new(identity))
    }

    async fn call(server: &mut McpServer<ExampleHandler>, message: Value) -> Value {
        let response = server.handle_message(&message.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_identity() {
        let mut server = server();
        let response = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;

        assert_eq!(response["result"]["protocolVersion"], MCP_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "demo");
        assert_eq!(response["result"]["serverInfo"]["version"], "0.3.0");
        assert!(response["result"]["capabilities"]["prompts"].is_object());
        assert!(response["result"]["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_response() {
        let mut server = server();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_parse_error() {
        let mut server = server();
        let response = server.handle_message("{not json").await.unwrap();
        assert!(response.id.is_none());
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_id() {
        let mut server = server();
        let response = server.handle_message(r#"{"jsonrpc":"2.0","id":7}"#).await.unwrap();
        assert_eq!(response.id, Some(RequestId::Number(7)));
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let mut server = server();
        let response = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": "a", "method": "sampling/createMessage"}),
        )
        .await;
        assert_eq!(response["id"], "a");
        assert_eq!(response["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let mut server = server();
        let response = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "missing", "arguments": {}}}),
        )
        .await;

        assert!(response["error"].is_null());
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Error executing missing: Unknown tool: missing"
        );
    }

    #[tokio::test]
    async fn test_tool_call_without_params() {
        let mut server = server();
        let response = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call"}),
        )
        .await;
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_unknown_prompt_is_jsonrpc_error() {
        let mut server = server();
        let response = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "prompts/get",
                   "params": {"name": "missing"}}),
        )
        .await;
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
        assert_eq!(
            response["error"]["message"],
            "Error with prompt missing: Unknown prompt: missing"
        );
    }

    #[tokio::test]
    async fn test_unknown_resource_is_jsonrpc_error() {
        let mut server = server();
        let response = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "resources/read",
                   "params": {"uri": "demo://nothing"}}),
        )
        .await;
        assert_eq!(
            response["error"]["message"],
            "Error reading resource demo://nothing: Unknown resource: demo://nothing"
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_parse_error() {
        let mut server = server();
        let response = server.handle_line(b"\xff\xfe garbage\n").await.unwrap();
        assert!(response.id.is_none());
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_blank_line_has_no_response() {
        let mut server = server();
        assert!(server.handle_line(b"  \r\n").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_signal_listener_never_resolves() {
        let failed = until_signal("test", async { Err::<(), _>("no handler") });
        let waited = tokio::time::timeout(std::time::Duration::from_millis(20), failed).await;
        assert!(waited.is_err());

        let delivered = until_signal("test", async { Ok::<(), &str>(()) });
        assert!(tokio::time::timeout(std::time::Duration::from_millis(20), delivered)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = server();
        let response = call(&mut server, json!({"jsonrpc": "2.0", "id": 6, "method": "ping"})).await;
        assert_eq!(response["result"], json!({}));
    }
}
