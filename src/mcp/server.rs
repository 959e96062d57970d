// MCP server loop over newline-delimited JSON-RPC

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::{
    InitializeResult, JsonRpcError, JsonRpcResponse, ListChanged, ResourceDef,
    ResourcesReadParams, ServerCapabilities, ServerInfo, ToolsCallParams, PROTOCOL_VERSION,
    SERVER_NAME,
};
use super::tools::{tool_definitions, ToolContext};

pub const API_DOCS_URI: &str = "taiga://docs/api";

pub struct McpServer {
    tools: ToolContext,
}

impl McpServer {
    pub fn new(tools: ToolContext) -> Self {
        Self { tools }
    }

    /// Serve stdin/stdout until the client closes its end
    pub async fn serve_stdio(&self) -> anyhow::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Read one JSON-RPC message per line and write one response per line
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(server = SERVER_NAME, "MCP server ready on stdio");

        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).await?;
            if read == 0 {
                tracing::info!("stdin closed, shutting down");
                break;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            let mut encoded = serde_json::to_string(&response)?;
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Handle one raw line; blank lines and notifications produce nothing
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable message");
                Some(response_value(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(format!("Parse error: {}", e)),
                )))
            }
        }
    }

    /// Handle one decoded JSON-RPC message
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let Some(obj) = message.as_object() else {
            return Some(response_value(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("Request must be a JSON object"),
            )));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(response_value(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            )));
        }

        // Responses to requests we never send
        let method = obj.get("method").and_then(Value::as_str)?;
        let params = obj.get("params").cloned().unwrap_or(Value::Null);

        let Some(id) = obj.get("id").cloned() else {
            tracing::debug!(method = %method, "Notification ignored");
            return None;
        };

        tracing::debug!(method = %method, id = %id, "Request");
        let response = match self.handle_request(method, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::debug!(method = %method, code = error.code, "Request failed: {}", error.message);
                JsonRpcResponse::failure(id, error)
            }
        };
        Some(response_value(response))
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => to_value(&initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(json!({ "resources": [api_docs_resource()] })),
            "resources/read" => self.handle_resources_read(params),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ToolsCallParams = serde_json::from_value(params).map_err(|e| {
            JsonRpcError::invalid_params(format!("tools/call requires a tool name: {}", e))
        })?;

        tracing::info!(tool = %params.name, "Tool call");
        let result = self
            .tools
            .call(&params.name, params.arguments.unwrap_or(Value::Null))
            .await?;
        to_value(&result)
    }

    fn handle_resources_read(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ResourcesReadParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("resources/read requires a uri: {}", e)))?;

        if params.uri != API_DOCS_URI {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown resource: {}",
                params.uri
            )));
        }

        Ok(json!({
            "contents": [{
                "uri": API_DOCS_URI,
                "mimeType": "text/plain",
                "text": api_docs(&self.tools.config().api_url)
            }]
        }))
    }
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ListChanged::default()),
            resources: Some(ListChanged::default()),
            prompts: Some(ListChanged::default()),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}

fn api_docs_resource() -> ResourceDef {
    ResourceDef {
        uri: API_DOCS_URI,
        name: "Taiga MCP API documentation",
        description: "Overview of the tools this server provides",
        mime_type: "text/plain",
    }
}

fn api_docs(api_url: &str) -> String {
    let tools: Vec<String> = tool_definitions()
        .iter()
        .enumerate()
        .map(|(i, tool)| format!("{}. {} - {}", i + 1, tool.name, tool.description))
        .collect();

    format!(
        "Taiga MCP Server - API Documentation\n\n\
         This MCP server lets you work with the Taiga project management platform.\n\n\
         **Available Tools:**\n\n\
         {}\n\n\
         **Configuration:**\n\n\
         - API URL: {}\n\
         - Authentication: Token-based (re-authenticates when the token expires)\n\n\
         **Getting Started:**\n\n\
         1. Authenticate using your Taiga credentials\n\
         2. List your projects to get project IDs or slugs\n\
         3. Create and manage epics, user stories and tasks\n",
        tools.join("\n"),
        api_url
    )
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal(e.to_string()))
}

fn response_value(response: JsonRpcResponse) -> Value {
    serde_json::to_value(&response).unwrap_or_else(|e| {
        json!({
            "jsonrpc": "2.0",
            "id": Value::Null,
            "error": {"code": -32603, "message": e.to_string()}
        })
    })
}
