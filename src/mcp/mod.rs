//! JSON-RPC envelope + method dispatch for the MCP tool server.
//!
//! handle_line -> parse envelope -> route by method -> JsonRpcResponse
//!
//! Methods: initialize, ping, tools/list, tools/call. Anything else is
//! `-32601 "Method not found"`. Messages without an `id` in the
//! `notifications/` namespace are accepted silently (no response).
//!
//! Protocol errors (bad envelope, unknown method/tool, bad tool arguments)
//! become JSON-RPC `error` objects; failures inside a tool come back as a
//! normal `result` with `isError: true`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::path::PathBuf;

use crate::host::{ProcessLauncher, ProjectValidator};
use crate::tools::{self, RunArgs, ToolDescriptor, ToolKind, ToolResult, TreeArgs};
use crate::tree::Discovery;
use crate::{log_debug, log_info, log_trace};

pub mod transport;

pub use transport::{ServeReport, serve};

pub const JSONRPC_VERSION: &str = "2.0";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "angreal-mcp";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/* ---- Envelope ---- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// `None` when the message carried no `id` at all (a notification);
    /// an explicit `null` id is `Some(Value::Null)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Validate a decoded JSON value as a request envelope.
    pub fn from_value(value: Value) -> Result<Self, (Value, RpcError)> {
        let Value::Object(mut obj) = value else {
            return Err((
                Value::Null,
                RpcError::invalid_request("request must be a JSON object"),
            ));
        };
        let id = obj.remove("id");
        let echo = id.clone().unwrap_or(Value::Null);

        if let Some(version) = obj.get("jsonrpc")
            && version.as_str() != Some(JSONRPC_VERSION)
        {
            return Err((echo, RpcError::invalid_request("jsonrpc must be \"2.0\"")));
        }
        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => return Err((echo, RpcError::invalid_request("method must be a string"))),
            None => return Err((echo, RpcError::invalid_request("missing method"))),
        };

        Ok(Self {
            id,
            method,
            params: obj.remove("params"),
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn from_outcome(id: Value, outcome: Result<Value, RpcError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(error) => Self::failure(id, error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn new(code: i32, message: &str, details: Option<String>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: details.map(|d| json!({ "details": d })),
        }
    }

    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error", None)
    }

    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request", Some(details.into()))
    }

    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found", None)
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, "Invalid params", Some(details.into()))
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, "Internal error", Some(details.into()))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        if let Some(details) = self
            .data
            .as_ref()
            .and_then(|d| d.get("details"))
            .and_then(Value::as_str)
        {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/* ---- Server ---- */

/// Dispatcher over one host and one discovered command tree.
///
/// Holds no mutable state: every request reads the same snapshot.
pub struct McpServer<H> {
    host: H,
    project_dir: PathBuf,
    discovery: Discovery,
    tools: Vec<ToolDescriptor>,
}

impl<H> McpServer<H>
where
    H: ProcessLauncher + ProjectValidator,
{
    pub fn new(host: H, project_dir: impl Into<PathBuf>, discovery: Discovery) -> Self {
        Self {
            host,
            project_dir: project_dir.into(),
            discovery,
            tools: tools::registry(),
        }
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Handle one raw input line. `None` means nothing must be written back.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                log_debug!("parse error: {e}");
                Some(JsonRpcResponse::failure(Value::Null, RpcError::parse_error()))
            }
        }
    }

    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.handle_request(request).await,
            Err((id, error)) => Some(JsonRpcResponse::failure(id, error)),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() && request.method.starts_with("notifications/") {
            log_debug!("notification {}", request.method);
            return None;
        }
        log_trace!("request {} id={:?}", request.method, request.id);

        let id = request.id.unwrap_or(Value::Null);
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools })),
            "tools/call" => self.tools_call(request.params).await,
            other => {
                log_debug!("method not found: {other}");
                Err(RpcError::method_not_found())
            }
        };
        Some(JsonRpcResponse::from_outcome(id, outcome))
    }

    /// Run a tool by name. Shared by `tools/call` and the CLI subcommands.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<ToolResult, RpcError> {
        let kind = ToolKind::from_name(name)
            .ok_or_else(|| RpcError::invalid_params(format!("Unknown tool: {name}")))?;
        log_info!("tools/call {kind}");

        let result = match kind {
            ToolKind::Check => {
                tools::angreal_check(&self.host, &self.project_dir, &self.discovery).await
            }
            ToolKind::Tree => {
                let args: TreeArgs = parse_arguments(kind, arguments)?;
                tools::angreal_tree(&self.discovery, &args)
            }
            ToolKind::Run => {
                let args: RunArgs = parse_arguments(kind, arguments)?;
                tools::angreal_run(&self.host, &self.discovery, &args).await
            }
        };

        if result.is_error {
            log_debug!("{kind} reported a failure");
        }
        Ok(result)
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);
        log_info!("initialize (protocol {requested})");

        json!({
            "protocolVersion": requested,
            "capabilities": {
                "tools": {
                    "listChanged": false,
                    "static": self.tools,
                }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    async fn tools_call(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params = match params {
            Some(p @ Value::Object(_)) => p,
            Some(_) => return Err(RpcError::invalid_params("params must be an object")),
            None => return Err(RpcError::invalid_params("missing params")),
        };
        let call: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| RpcError::invalid_params(format!("invalid tools/call params: {e}")))?;

        let result = self.call_tool(&call.name, call.arguments).await?;
        serde_json::to_value(&result).map_err(|e| RpcError::internal(e.to_string()))
    }
}

/// Missing or `null` arguments mean "all defaults".
fn parse_arguments<T: DeserializeOwned>(
    kind: ToolKind,
    arguments: Option<Value>,
) -> Result<T, RpcError> {
    let arguments = match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v) => v,
    };
    serde_json::from_value(arguments)
        .map_err(|e| RpcError::invalid_params(format!("invalid arguments for {kind}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ProcessOutput;
    use crate::tree::tests::sample_tree;
    use anyhow::Result;
    use std::path::Path;

    struct NullHost;

    impl ProjectValidator for NullHost {
        fn is_valid_project(&self, _cwd: &Path) -> bool {
            true
        }
    }

    impl ProcessLauncher for NullHost {
        fn describe(&self) -> String {
            "angreal".into()
        }

        async fn run(&self, command_path: &[String], args: &[String]) -> Result<ProcessOutput> {
            Ok(ProcessOutput {
                stdout: format!("{} {}", command_path.join(" "), args.join(" ")),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    fn server() -> McpServer<NullHost> {
        McpServer::new(NullHost, "/work", Discovery::from(sample_tree()))
    }

    async fn call(line: &str) -> Value {
        let response = server().handle_line(line).await.expect("a response");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn unknown_method_is_32601() {
        let v = call(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#).await;
        assert_eq!(v["id"], 7);
        assert_eq!(v["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(v["error"]["message"], "Method not found");
        assert!(v.get("result").is_none());
    }

    #[tokio::test]
    async fn parse_error_has_null_id() {
        let v = call("not valid json").await;
        assert_eq!(v["jsonrpc"], "2.0");
        assert!(v["id"].is_null());
        assert_eq!(v["error"]["code"], PARSE_ERROR);
        assert_eq!(v["error"]["message"], "Parse error");
    }

    #[tokio::test]
    async fn missing_method_is_invalid_request() {
        let v = call(r#"{"jsonrpc":"2.0","id":"abc"}"#).await;
        assert_eq!(v["id"], "abc");
        assert_eq!(v["error"]["code"], INVALID_REQUEST);

        let v = call("[1,2,3]").await;
        assert_eq!(v["error"]["code"], INVALID_REQUEST);

        let v = call(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).await;
        assert_eq!(v["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let s = server();
        let none = s
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn initialize_echoes_protocol_version() {
        let v = call(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"1.0","capabilities":{}}}"#,
        )
        .await;
        assert_eq!(v["result"]["protocolVersion"], "1.0");
        assert!(v["result"]["capabilities"]["tools"]["static"].is_array());
        assert_eq!(v["result"]["serverInfo"]["name"], SERVER_NAME);

        let v = call(r#"{"jsonrpc":"2.0","id":2,"method":"initialize"}"#).await;
        assert_eq!(v["result"]["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let v = call(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"angreal_build"}}"#,
        )
        .await;
        assert_eq!(v["error"]["code"], INVALID_PARAMS);
        assert_eq!(v["error"]["data"]["details"], "Unknown tool: angreal_build");
    }

    #[tokio::test]
    async fn bad_tool_arguments_are_invalid_params() {
        let v = call(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"angreal_tree","arguments":{"format":"xml"}}}"#,
        )
        .await;
        assert_eq!(v["error"]["code"], INVALID_PARAMS);

        let v = call(
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"angreal_run","arguments":{}}}"#,
        )
        .await;
        assert_eq!(v["error"]["code"], INVALID_PARAMS);

        let v = call(r#"{"jsonrpc":"2.0","id":8,"method":"tools/call"}"#).await;
        assert_eq!(v["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn tool_failure_is_a_successful_response() {
        let v = call(
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"angreal_run","arguments":{"command":"missing task"}}}"#,
        )
        .await;
        assert!(v.get("error").is_none());
        assert_eq!(v["result"]["isError"], true);
        assert!(
            v["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("unknown group 'missing'")
        );
    }

    #[tokio::test]
    async fn run_forwards_to_host() {
        let result = server()
            .call_tool(
                "angreal_run",
                Some(json!({"command": "call-testing command-2", "args": ["--parameter", "v"]})),
            )
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.text(), "call-testing command-2 --parameter v");
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let v = call(r#"{"jsonrpc":"2.0","id":10,"method":"ping"}"#).await;
        assert_eq!(v["result"], json!({}));
    }
}
