//! MCP Server implementation
//!
//! Implements the Model Context Protocol server over newline-delimited
//! JSON-RPC. Each request runs on its own task; a single writer task owns the
//! output so response lines never interleave.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::{McpError, Result, WorkspaceMcpError};
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server info
pub const SERVER_NAME: &str = "gg-workspace-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pending responses buffered between request tasks and the writer
const RESPONSE_BUFFER: usize = 64;

/// MCP Server for Google Workspace
pub struct McpServer {
    /// Tool handler
    tool_handler: Arc<ToolHandler>,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: Arc<ToolHandler>) -> Self {
        Self { tool_handler }
    }

    /// Run the server on stdio
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`
    pub async fn run<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_BUFFER);
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut lines = reader.lines();
        let mut read_result = Ok(());
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    read_result = Err(WorkspaceMcpError::from(e));
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let server = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                let id = request_id_of(&line);
                let handler = tokio::spawn(async move { server.handle_message(&line).await });

                let response = match handler.await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::error!("Request handler panicked: {}", e);
                        Some(JsonRpcResponse::error(
                            id,
                            JsonRpcError::internal_error(e.to_string()),
                        ))
                    }
                };

                if let Some(response) = response {
                    if tx.send(response).await.is_err() {
                        tracing::warn!("Dropping response, writer has stopped");
                    }
                }
            });
        }

        // Writer exits once every in-flight request has dropped its sender
        drop(tx);
        let write_result = writer_task.await.map_err(|e| {
            WorkspaceMcpError::Mcp(McpError::TransportError {
                message: e.to_string(),
            })
        })?;

        read_result?;
        write_result
    }

    /// Handle an incoming JSON-RPC message
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        tracing::debug!("Received {}", request.method);

        let response = match request.method.as_str() {
            methods::INITIALIZE => JsonRpcResponse::success(request.id.clone(), self.handle_initialize()),
            methods::INITIALIZED => return None,
            methods::PING => JsonRpcResponse::success(request.id.clone(), serde_json::json!({})),
            methods::LIST_TOOLS => JsonRpcResponse::success(request.id.clone(), self.handle_list_tools()),
            methods::CALL_TOOL => match self.handle_call_tool(&request).await {
                Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
                Err(error) => JsonRpcResponse::error(request.id.clone(), error),
            },
            _ => JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::method_not_found(&request.method),
            ),
        };

        // Notifications never get a reply
        if request.is_notification() {
            return None;
        }

        Some(response)
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Value {
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

        serde_json::to_value(result).unwrap_or_default()
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Value {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        serde_json::to_value(result).unwrap_or_default()
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params = request
            .params
            .clone()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool parameters"))?;

        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e)))?;

        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await;

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}

/// Best-effort extraction of the request id, used when a handler panics
fn request_id_of(message: &str) -> Option<RequestId> {
    serde_json::from_str::<JsonRpcRequest>(message)
        .ok()
        .and_then(|request| request.id)
}

async fn write_responses<W>(mut rx: mpsc::Receiver<JsonRpcResponse>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}
