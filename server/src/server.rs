//! Request routing and the newline-delimited stdio loop.

use std::io::{BufRead, Write};

use serde_json::{Map, Value, json};
use sqlite_mcp_db::ServerConfig;
use sqlite_mcp_sqlite::{Gateway, GatewayError};
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
use crate::tools::ToolHandler;
use crate::{prompts, resources};

/// Name reported in the `initialize` handshake.
pub const SERVER_NAME: &str = "SQLite-MCP-Server";

/// MCP server over a [`Gateway`].
///
/// Requests are handled one at a time in arrival order.
#[derive(Debug, Clone)]
pub struct McpServer {
    tools: ToolHandler,
}

impl McpServer {
    /// Opens the sandbox described by `config` and builds the server.
    ///
    /// # Errors
    ///
    /// Fails when the data directory cannot be created.
    pub fn new(config: ServerConfig) -> std::result::Result<Self, GatewayError> {
        Ok(Self::with_gateway(Gateway::new(config)?))
    }

    pub fn with_gateway(gateway: Gateway) -> Self {
        Self {
            tools: ToolHandler::new(gateway),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        self.tools.gateway()
    }

    /// Serves newline-delimited JSON-RPC messages until `reader` is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport itself fails.
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        info!(
            data_dir = %self.gateway().sandbox().root().display(),
            prompts = prompts::PROMPTS.len(),
            resources = resources::RESOURCES.len(),
            "SQLite MCP server ready"
        );
        for line in reader.lines() {
            let line = line?;
            if let Some(response) = self.handle_line(&line) {
                serde_json::to_writer(&mut writer, &response)?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
        }
        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handles one raw message. Blank lines and notifications yield `None`.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Discarding malformed message");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(format!("Parse error: {e}")),
                ));
            }
        };
        let id = message.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.handle_request(request),
            Err(e) => id.map(|id| {
                JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {e}")),
                )
            }),
        }
    }

    /// Routes a parsed request. Notifications yield `None`.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Handling request");
        let outcome = self.dispatch(&request.method, request.params);
        let id = request.id?;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params = params.unwrap_or(Value::Null);
        let result = match method {
            "initialize" => self.initialize(),
            "notifications/initialized" | "initialized" | "ping" => json!({}),
            "tools/list" => json!({ "tools": self.tools.definitions() }),
            "tools/call" => self.call_tool(&params)?,
            "prompts/list" => json!({ "prompts": prompts::PROMPTS }),
            "prompts/get" => {
                let name = required_str(&params, "name")?;
                prompts::find(name)?.get(&object_field(&params, "arguments"))?
            }
            "resources/list" => json!({ "resources": resources::RESOURCES }),
            "resources/read" => resources::find(required_str(&params, "uri")?)?.read(),
            other => return Err(JsonRpcError::method_not_found(other)),
        };
        Ok(result)
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "prompts": {},
                "resources": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    /// Runs a tool and wraps its response as MCP text content.
    fn call_tool(&self, params: &Value) -> std::result::Result<Value, JsonRpcError> {
        let name = required_str(params, "name")?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let response = self.tools.call(name, arguments)?;
        let success = response
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let text = serde_json::to_string_pretty(&response).map_err(ServerError::from)?;
        Ok(json!({
            "content": [{"type": "text", "text": text}],
            "isError": !success
        }))
    }
}

fn required_str<'a>(params: &'a Value, field: &str) -> std::result::Result<&'a str, JsonRpcError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("missing string field '{field}'")))
}

fn object_field(params: &Value, field: &str) -> Map<String, Value> {
    params
        .get(field)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
