//! Model Context Protocol (MCP) server implementation for smartcart
//!
//! Exposes the smart cart calculation as a tool and the last saved result as
//! a resource, over newline-delimited JSON-RPC 2.0 on stdio.

use crate::classifier::HeuristicConfig;
use crate::sink::{JsonFileSink, read_saved_result};
use crate::smart_cart::{DumpOrderSource, calculate_smart_cart};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

pub const SMART_CART_RESOURCE_URI: &str = "smartcart://smart_cart";
pub const CALCULATE_TOOL_NAME: &str = "calculate_smart_cart";
const PROTOCOL_VERSION: &str = "2024-11-05";

const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const PARSE_ERROR: i64 = -32700;

/// MCP server for smart cart access
pub struct McpServer {
    orders_path: PathBuf,
    output_path: PathBuf,
    heuristics: HeuristicConfig,
    fixed_now: Option<DateTime<Utc>>,
}

/// MCP Resource definition
#[derive(Debug, Clone)]
pub struct McpResource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// MCP Tool definition
#[derive(Debug, Clone)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl McpServer {
    pub fn new(orders_path: PathBuf, output_path: PathBuf, heuristics: HeuristicConfig) -> Self {
        Self {
            orders_path,
            output_path,
            heuristics,
            fixed_now: None,
        }
    }

    /// Pin the reference instant instead of reading the wall clock per call
    pub fn with_fixed_clock(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn list_resources(&self) -> Vec<McpResource> {
        vec![McpResource {
            uri: SMART_CART_RESOURCE_URI.to_string(),
            name: "smart_cart".to_string(),
            description: "Latest smart cart calculation (replenishment and rediscovery lists)"
                .to_string(),
            mime_type: "application/json".to_string(),
        }]
    }

    pub fn list_tools(&self) -> Vec<McpTool> {
        vec![McpTool {
            name: CALCULATE_TOOL_NAME.to_string(),
            description:
                "Analyzes order history and generates smart shopping cart recommendations."
                    .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        }]
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        match uri {
            SMART_CART_RESOURCE_URI => {
                let text = read_saved_result(&self.output_path)?;
                Ok(json!({
                    "contents": [{
                        "uri": uri,
                        "mimeType": "application/json",
                        "text": text
                    }]
                }))
            }
            _ => anyhow::bail!("Unknown resource URI: {}", uri),
        }
    }

    pub async fn call_tool(&self, name: &str, _arguments: Value) -> Result<Value> {
        match name {
            CALCULATE_TOOL_NAME => self.handle_calculate_smart_cart().await,
            _ => anyhow::bail!("Unknown tool: {}", name),
        }
    }

    async fn handle_calculate_smart_cart(&self) -> Result<Value> {
        let source = DumpOrderSource::new(self.orders_path.clone());
        let sink = JsonFileSink::new(self.output_path.clone());
        let now = self.fixed_now.unwrap_or_else(Utc::now);

        let outcome = calculate_smart_cart(&source, &sink, now, &self.heuristics)?;
        Ok(json!({
            "content": [{ "type": "text", "text": outcome.summary() }]
        }))
    }

    /// Answer one JSON-RPC message; notifications get no response
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let id = request.get("id").cloned()?;
        let method = request["method"].as_str().unwrap_or_default();
        let params = request.get("params").cloned().unwrap_or(Value::Null);
        debug!(method, "mcp request");

        let result = match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {}, "resources": {} },
                "serverInfo": get_server_info()
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({
                "tools": self.list_tools().into_iter().map(|tool| json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema
                })).collect::<Vec<_>>()
            })),
            "resources/list" => Ok(json!({
                "resources": self.list_resources().into_iter().map(|resource| json!({
                    "uri": resource.uri,
                    "name": resource.name,
                    "description": resource.description,
                    "mimeType": resource.mime_type
                })).collect::<Vec<_>>()
            })),
            "tools/call" => match params["name"].as_str() {
                Some(name) if self.list_tools().iter().any(|t| t.name == name) => {
                    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                    Ok(match self.call_tool(name, arguments).await {
                        Ok(value) => value,
                        Err(e) => {
                            warn!(tool = name, error = %e, "tool call failed");
                            json!({
                                "content": [{ "type": "text", "text": e.to_string() }],
                                "isError": true
                            })
                        }
                    })
                }
                Some(name) => Err((INVALID_PARAMS, format!("Unknown tool: {}", name))),
                None => Err((INVALID_PARAMS, "Missing tool name".to_string())),
            },
            "resources/read" => match params["uri"].as_str() {
                Some(uri) => self
                    .read_resource(uri)
                    .await
                    .map_err(|e| (INVALID_PARAMS, e.to_string())),
                None => Err((INVALID_PARAMS, "Missing resource uri".to_string())),
            },
            _ => Err((METHOD_NOT_FOUND, format!("Method not found: {}", method))),
        };

        Some(match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => error_response(id, code, &message),
        })
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout until EOF
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Some(error_response(Value::Null, PARSE_ERROR, &e.to_string())),
            };

            if let Some(response) = response {
                let mut payload = serde_json::to_vec(&response)?;
                payload.push(b'\n');
                stdout.write_all(&payload).await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// MCP server capability advertisement
pub fn get_server_info() -> Value {
    json!({
        "name": "smartcart",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Grocery replenishment suggestions via Model Context Protocol"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn server(temp_dir: &TempDir) -> McpServer {
        McpServer::new(
            temp_dir.path().join("orders_dump.json"),
            temp_dir.path().join("smart_cart_calculation.json"),
            HeuristicConfig::default(),
        )
        .with_fixed_clock(now())
    }

    fn write_dump(temp_dir: &TempDir) {
        let orders: Vec<Value> = [78, 48, 18]
            .iter()
            .map(|days_ago| {
                json!({
                    "id": format!("o{}", days_ago),
                    "start_date": (now() - Duration::days(*days_ago)).to_rfc3339(),
                    "lines": [{
                        "product_id": "4241",
                        "ordered_quantity": 2,
                        "product": { "display_name": "Platano" }
                    }]
                })
            })
            .collect();
        fs::write(
            temp_dir.path().join("orders_dump.json"),
            serde_json::to_string(&orders).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_mcp_server_creation() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);

        assert_eq!(server.list_resources().len(), 1);
        assert_eq!(server.list_tools().len(), 1);
        assert_eq!(server.list_tools()[0].name, CALCULATE_TOOL_NAME);
    }

    #[tokio::test]
    async fn test_resource_before_and_after_calculation() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);

        let before = server.read_resource(SMART_CART_RESOURCE_URI).await.unwrap();
        let text = before["contents"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert!(parsed["error"].is_string());

        write_dump(&temp_dir);
        let call = server.call_tool(CALCULATE_TOOL_NAME, json!({})).await.unwrap();
        let summary = call["content"][0]["text"].as_str().unwrap();
        assert!(summary.starts_with("Smart cart calculated with 1 recommendations."));

        let after = server.read_resource(SMART_CART_RESOURCE_URI).await.unwrap();
        let text = after["contents"][0]["text"].as_str().unwrap();
        assert_eq!(
            text,
            fs::read_to_string(temp_dir.path().join("smart_cart_calculation.json")).unwrap()
        );
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["items"][0]["id"], "4241");
        assert_eq!(parsed["items"][0]["suggested_qty"], 2);
    }

    #[tokio::test]
    async fn test_json_rpc_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);

        let init = server
            .handle_request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .await
            .unwrap();
        assert_eq!(init["result"]["serverInfo"]["name"], "smartcart");

        let tools = server
            .handle_request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await
            .unwrap();
        assert_eq!(tools["result"]["tools"][0]["name"], CALCULATE_TOOL_NAME);

        let missing = server
            .handle_request(json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/list"}))
            .await
            .unwrap();
        assert_eq!(missing["error"]["code"], METHOD_NOT_FOUND);

        let notification = server
            .handle_request(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert!(notification.is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);

        // No dump on disk yet
        let response = server
            .handle_request(json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": { "name": CALCULATE_TOOL_NAME }
            }))
            .await
            .unwrap();
        assert_eq!(response["result"]["isError"], true);

        let unknown = server
            .handle_request(json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": { "name": "add_to_cart" }
            }))
            .await
            .unwrap();
        assert_eq!(unknown["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn test_server_info() {
        let info = get_server_info();
        assert_eq!(info["name"], "smartcart");
    }
}
