//! MCP (Model Context Protocol) server implementation.
//!
//! Speaks JSON-RPC 2.0 over stdio, one request per line, and exposes report
//! classification as a single callable tool.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::Result;
use crate::model::BucketSet;
use crate::report;

/// MCP server for LLM tool integration.
pub struct McpServer {
    config: Config,
}

impl McpServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the MCP server with stdio transport.
    pub fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());
        let mut writer = stdout.lock();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => {
                    // JSON-RPC notifications have no `id` field; no response expected.
                    if request.id.is_none() {
                        continue;
                    }
                    let response = self.handle_request(request);
                    serde_json::to_writer(&mut writer, &response)?;
                    writeln!(writer)?;
                    writer.flush()?;
                }
                Err(e) => {
                    let error_response = JsonRpcResponse {
                        jsonrpc: "2.0".to_string(),
                        id: None,
                        result: None,
                        error: Some(JsonRpcError {
                            code: -32700,
                            message: format!("Parse error: {}", e),
                            data: None,
                        }),
                    };
                    serde_json::to_writer(&mut writer, &error_response)?;
                    writeln!(writer)?;
                    writer.flush()?;
                }
            }
        }

        Ok(())
    }

    fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tool_call(request.params),
            "shutdown" => Ok(json!({})),
            _ => Err(format!("Unknown method: {}", request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: Some(value),
                error: None,
            },
            Err(msg) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32603,
                    message: msg,
                    data: None,
                }),
            },
        }
    }

    fn handle_initialize(&self) -> std::result::Result<Value, String> {
        Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "jacors",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn handle_tools_list(&self) -> std::result::Result<Value, String> {
        Ok(json!({
            "tools": [
                {
                    "name": "jacoco_report",
                    "description": "Classify a JaCoCo XML coverage report into coverage buckets and return the per-file line numbers as JSON",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "jacoco_report_path": {"type": "string", "description": "Path to the JaCoCo XML report file"},
                            "covered_types": {"type": "string", "description": "Comma-separated buckets to include: nocovered, partiallycovered, fullcovered (default: all)"}
                        },
                        "required": ["jacoco_report_path"]
                    }
                }
            ]
        }))
    }

    fn handle_tool_call(&self, params: Option<Value>) -> std::result::Result<Value, String> {
        let params = params.ok_or("Missing params")?;
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or("Missing tool name")?;
        if tool_name != "jacoco_report" {
            return Err(format!("Unknown tool: {}", tool_name));
        }
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let path = arguments
            .get("jacoco_report_path")
            .and_then(|v| v.as_str())
            .ok_or("Missing required 'jacoco_report_path' parameter")?;

        let requested = match arguments.get("covered_types").and_then(|v| v.as_str()) {
            Some(list) => BucketSet::parse_list(list).map_err(|e| e.to_string())?,
            None => self.config.default_buckets,
        };

        // Diagnostics go to stderr inside report::run; the RPC result stays
        // a clean JSON document.
        let json_text = report::run(Path::new(path), &requested).map_err(|e| e.to_string())?;

        Ok(json!({
            "content": [{
                "type": "text",
                "text": json_text
            }]
        }))
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_server() -> McpServer {
        McpServer::new(Config::default())
    }

    fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("jacoco.xml");
        std::fs::write(
            &path,
            br#"<report>
<package name="com/example">
  <sourcefile name="Foo.java">
    <line nr="10" ci="5" mi="0"/>
    <line nr="11" ci="0" mi="2"/>
  </sourcefile>
</package>
</report>"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_handle_initialize() {
        let server = create_test_server();
        let result = server.handle_initialize().unwrap();
        assert!(result.get("protocolVersion").is_some());
        assert!(result.get("capabilities").is_some());
        assert_eq!(result["serverInfo"]["name"], "jacors");
    }

    #[test]
    fn test_handle_tools_list() {
        let server = create_test_server();
        let result = server.handle_tools_list().unwrap();
        let tools = result.get("tools").unwrap().as_array().unwrap();
        assert_eq!(tools.len(), 1);

        let tool = &tools[0];
        assert_eq!(tool["name"], "jacoco_report");
        assert!(tool.get("description").is_some());
        let props = tool["inputSchema"].get("properties").unwrap();
        assert!(props.get("jacoco_report_path").is_some());
        assert!(props.get("covered_types").is_some());
    }

    #[test]
    fn test_handle_tool_call_missing_params() {
        let server = create_test_server();
        assert!(server.handle_tool_call(None).is_err());
    }

    #[test]
    fn test_handle_tool_call_missing_name() {
        let server = create_test_server();
        let result = server.handle_tool_call(Some(json!({"arguments": {}})));
        assert!(result.is_err());
    }

    #[test]
    fn test_handle_tool_call_unknown_tool() {
        let server = create_test_server();
        let params = json!({"name": "unknown_tool", "arguments": {}});
        let result = server.handle_tool_call(Some(params));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown tool"));
    }

    #[test]
    fn test_handle_tool_call_missing_path() {
        let server = create_test_server();
        let params = json!({"name": "jacoco_report", "arguments": {}});
        let result = server.handle_tool_call(Some(params));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("jacoco_report_path"));
    }

    #[test]
    fn test_handle_tool_call_classifies_report() {
        let server = create_test_server();
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);

        let params = json!({
            "name": "jacoco_report",
            "arguments": {"jacoco_report_path": path.to_str().unwrap()}
        });
        let result = server.handle_tool_call(Some(params)).unwrap();

        let text = result["content"][0]["text"].as_str().unwrap();
        let value: Value = serde_json::from_str(text).unwrap();
        let record = &value.as_array().unwrap()[0];
        assert_eq!(record["sourcefile"], "Foo.java");
        assert_eq!(record["lines"]["fullcovered"], json!([10]));
        assert_eq!(record["lines"]["nocovered"], json!([11]));
    }

    #[test]
    fn test_handle_tool_call_covered_types_parameter() {
        let server = create_test_server();
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);

        let params = json!({
            "name": "jacoco_report",
            "arguments": {
                "jacoco_report_path": path.to_str().unwrap(),
                "covered_types": "nocovered"
            }
        });
        let result = server.handle_tool_call(Some(params)).unwrap();

        let text = result["content"][0]["text"].as_str().unwrap();
        let value: Value = serde_json::from_str(text).unwrap();
        let record = &value.as_array().unwrap()[0];
        assert_eq!(record["lines"]["nocovered"], json!([11]));
        assert!(record["lines"].get("fullcovered").is_none());
    }

    #[test]
    fn test_handle_tool_call_invalid_covered_types() {
        let server = create_test_server();
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);

        let params = json!({
            "name": "jacoco_report",
            "arguments": {
                "jacoco_report_path": path.to_str().unwrap(),
                "covered_types": "bogus"
            }
        });
        let result = server.handle_tool_call(Some(params));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("bogus"));
    }

    #[test]
    fn test_handle_tool_call_missing_report() {
        let server = create_test_server();
        let params = json!({
            "name": "jacoco_report",
            "arguments": {"jacoco_report_path": "/no/such/report.xml"}
        });
        let result = server.handle_tool_call(Some(params));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Report not found"));
    }

    #[test]
    fn test_handle_request_preserves_id() {
        let server = create_test_server();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(42)),
            method: "initialize".to_string(),
            params: None,
        };
        let response = server.handle_request(request);
        assert_eq!(response.id, Some(json!(42)));
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_handle_request_unknown_method() {
        let server = create_test_server();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "unknown/method".to_string(),
            params: None,
        };
        let response = server.handle_request(request);
        assert!(response.result.is_none());
        assert!(response.error.unwrap().message.contains("Unknown method"));
    }

    #[test]
    fn test_handle_request_shutdown() {
        let server = create_test_server();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "shutdown".to_string(),
            params: None,
        };
        let response = server.handle_request(request);
        assert!(response.result.is_some());
    }

    #[test]
    fn test_notification_has_no_id() {
        // Notifications are requests without an `id`; run_stdio skips them.
        let request_json = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(request_json).unwrap();
        assert!(parsed.id.is_none());
    }

    #[test]
    fn test_json_rpc_response_serialization() {
        let response = JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            result: Some(json!({"status": "ok"})),
            error: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(!json.contains("error"));
    }
}
