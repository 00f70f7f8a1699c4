//! MCP Server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;
use crate::workspace::WorkspaceClient;

/// MCP Server info
pub const SERVER_NAME: &str = "google-workspace-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server exposing the Google Workspace tools
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Whether the client sent `notifications/initialized`
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(workspace: Arc<WorkspaceClient>) -> Self {
        Self {
            tool_handler: ToolHandler::new(workspace),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio until stdin closes
    pub async fn run_stdio(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!("MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                stdout.write_all(response_str.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message, returning the response if one is due
    pub async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        tracing::debug!("Received {}", request.method);

        if request.method == methods::INITIALIZED {
            self.initialized = true;
            return None;
        }

        // Other notifications need no reply
        let id = request.id.clone()?;

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::PING => Ok(json!({})),
            methods::LIST_TOOLS => self.handle_list_tools(),
            methods::CALL_TOOL => self.handle_call_tool(&request).await,
            _ => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::method_not_found(&request.method),
                ))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                tracing::error!("Failed to handle {}: {}", request.method, e);
                JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string()))
            }
        })
    }

    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Result<Value> {
        let params = request
            .params
            .clone()
            .ok_or("Missing tool parameters".to_string())
            .and_then(|p| {
                serde_json::from_value::<CallToolParams>(p)
                    .map_err(|e| format!("Invalid tool parameters: {}", e))
            });

        let result = match params {
            Ok(params) => {
                self.tool_handler
                    .call_tool(&params.name, params.arguments)
                    .await
            }
            Err(message) => CallToolResult::error(message),
        };

        Ok(serde_json::to_value(result)?)
    }
}
