//! MCP server implementation

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tallyman_archive::EdgarArchive;
use tallyman_domain::DocumentRepository;
use tallyman_extractor::FactExtractor;
use tallyman_http::{HttpConfig, RequestGovernor, ResilientClient};
use tracing::{debug, error, info, warn};

use crate::error::McpError;
use crate::protocol::*;
use crate::tools;

/// MCP Server
///
/// Handles Model Context Protocol requests via stdio transport. Requests are
/// served one at a time, in arrival order.
pub struct McpServer<R>
where
    R: DocumentRepository,
{
    extractor: FactExtractor<R>,
}

impl McpServer<EdgarArchive> {
    /// Build the production server from the environment
    ///
    /// Loads `.env` if present, then reads the `SEC_EDGAR_*` variables.
    ///
    /// # Errors
    ///
    /// `McpError::Configuration` when the identity is missing or malformed,
    /// or the HTTP transport cannot be built.
    pub fn from_env() -> Result<Self, McpError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_config(HttpConfig::from_env().sanitized())
    }

    /// Build the production server from explicit settings
    ///
    /// The request governor is built from `config.rate_limit`.
    ///
    /// # Errors
    ///
    /// `McpError::Configuration` when the identity is missing or malformed,
    /// the rate limit is out of range, or the HTTP transport cannot be built.
    pub fn from_config(config: HttpConfig) -> Result<Self, McpError> {
        config.identity()?;
        let governor = Arc::new(RequestGovernor::new(config.rate_limit)?);
        info!(rate_limit = governor.rate(), "Request governor ready");

        let client = ResilientClient::from_config(&config, governor)?;
        let archive = EdgarArchive::new(client);
        Ok(Self::new(FactExtractor::with_defaults(archive)))
    }
}

impl<R> McpServer<R>
where
    R: DocumentRepository,
{
    /// Create a server over an existing extractor
    pub fn new(extractor: FactExtractor<R>) -> Self {
        Self { extractor }
    }

    /// Extractor serving tool calls
    pub fn extractor(&self) -> &FactExtractor<R> {
        &self.extractor
    }

    /// Run the MCP server (stdio transport)
    ///
    /// Reads JSON-RPC requests from stdin and writes responses to stdout.
    pub fn run(&self) -> Result<(), McpError> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.run_with(BufReader::new(stdin.lock()), stdout.lock())
    }

    /// Serve newline-delimited requests from `reader` until it is exhausted
    pub fn run_with<I, W>(&self, reader: I, mut writer: W) -> Result<(), McpError>
    where
        I: BufRead,
        W: Write,
    {
        info!("MCP server started");

        for line in reader.lines() {
            let line = line?;
            if let Some(message) = self.handle_line(&line) {
                self.write_response(&mut writer, &message)?;
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one raw input line
    ///
    /// Returns `None` for blank lines and notifications.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcMessage> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        debug!("Received request: {}", line);

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Some(JsonRpcMessage::Error(JsonRpcError::new(
                    None,
                    -32700,
                    format!("Parse error: {}", e),
                )));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!("Malformed request: {}", e);
                let err = McpError::InvalidRequest(e.to_string());
                Some(JsonRpcMessage::Error(JsonRpcError::new(
                    id,
                    err.error_code(),
                    err.to_string(),
                )))
            }
        }
    }

    /// Handle a JSON-RPC request
    ///
    /// Notifications are processed for their side effects only.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcMessage> {
        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }
        let id = request.id.clone();

        if request.jsonrpc != JSONRPC_VERSION {
            let err = McpError::InvalidRequest(format!(
                "Unsupported jsonrpc version: {}",
                request.jsonrpc
            ));
            return Some(JsonRpcMessage::Error(JsonRpcError::new(
                id,
                err.error_code(),
                err.to_string(),
            )));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tool_call(request.params),
            _ => {
                return Some(JsonRpcMessage::Error(JsonRpcError::new(
                    id,
                    -32601,
                    format!("Method not found: {}", request.method),
                )))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcMessage::Response(JsonRpcResponse::new(id, value)),
            Err(e) => {
                warn!(method = %request.method, error = %e, "Request failed");
                JsonRpcMessage::Error(JsonRpcError::new(id, e.error_code(), e.to_string()))
            }
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Result<Value, McpError> {
        let response = InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_info: ServerInfo {
                name: "tallyman-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: Capabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
        };
        Ok(serde_json::to_value(response)?)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let tools = vec![
            tool_definition_concept(),
            tool_definition_concepts(),
            tool_definition_statement(),
            tool_definition_listing(),
        ];
        Ok(serde_json::to_value(ToolListResponse { tools })?)
    }

    /// Handle tools/call request
    fn handle_tool_call(&self, params: Value) -> Result<Value, McpError> {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidParams("Missing tool name".to_string()))?;

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        // Route to appropriate tool handler
        let output = match tool_name {
            "get_xbrl_concept" => {
                to_text(tools::handle_get_concept(&self.extractor, arguments_as(arguments)?)?)?
            }
            "get_xbrl_concepts" => {
                to_text(tools::handle_get_concepts(&self.extractor, arguments_as(arguments)?)?)?
            }
            "discover_statement_concepts" => to_text(tools::handle_discover_statement(
                &self.extractor,
                arguments_as(arguments)?,
            )?)?,
            "discover_xbrl_concepts" => to_text(tools::handle_discover_concepts(
                &self.extractor,
                arguments_as(arguments)?,
            )?)?,
            _ => return Err(McpError::ToolNotFound(tool_name.to_string())),
        };

        Ok(serde_json::to_value(ToolCallResult::text(output))?)
    }

    /// Write response to stdout
    fn write_response<W: Write>(
        &self,
        writer: &mut W,
        response: &JsonRpcMessage,
    ) -> Result<(), McpError> {
        let response_str = serde_json::to_string(response)?;
        writeln!(writer, "{}", response_str)?;
        writer.flush()?;
        debug!("Sent response: {}", response_str);
        Ok(())
    }
}

fn arguments_as<T: DeserializeOwned>(arguments: Value) -> Result<T, McpError> {
    serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn to_text<T: Serialize>(output: T) -> Result<String, McpError> {
    Ok(serde_json::to_string(&output)?)
}

fn filing_properties() -> Value {
    json!({
        "cik": {"type": ["string", "integer"], "description": "Filer CIK (e.g. 320193)"},
        "accession_number": {"type": "string", "description": "Accession number (e.g. 0000320193-23-000106)"}
    })
}

fn with_filing(extra: Value, required: &[&str]) -> Value {
    let mut properties = filing_properties();
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        props.extend(extra.clone());
    }
    let mut required_fields = vec!["cik", "accession_number"];
    required_fields.extend_from_slice(required);
    json!({
        "type": "object",
        "properties": properties,
        "required": required_fields
    })
}

// Tool definitions for tools/list response
fn tool_definition_concept() -> ToolDefinition {
    ToolDefinition {
        name: "get_xbrl_concept".to_string(),
        description: "Extract one XBRL concept value from an SEC filing".to_string(),
        input_schema: with_filing(
            json!({
                "concept": {"type": "string", "description": "Concept name, e.g. NetIncomeLoss or us-gaap:Assets"}
            }),
            &["concept"],
        ),
    }
}

fn tool_definition_concepts() -> ToolDefinition {
    ToolDefinition {
        name: "get_xbrl_concepts".to_string(),
        description: "Extract several XBRL concepts from an SEC filing; all catalogued concepts when none are given".to_string(),
        input_schema: with_filing(
            json!({
                "concepts": {
                    "type": "array",
                    "description": "Concept names to extract",
                    "items": {"type": "string"}
                }
            }),
            &[],
        ),
    }
}

fn tool_definition_statement() -> ToolDefinition {
    ToolDefinition {
        name: "discover_statement_concepts".to_string(),
        description: "Extract the catalogued concepts of one financial statement".to_string(),
        input_schema: with_filing(
            json!({
                "statement_type": {
                    "type": "string",
                    "enum": ["income", "balance", "cash_flow", "other"],
                    "description": "Statement family"
                }
            }),
            &["statement_type"],
        ),
    }
}

fn tool_definition_listing() -> ToolDefinition {
    ToolDefinition {
        name: "discover_xbrl_concepts".to_string(),
        description: "List the XBRL concepts a filing reports, with each concept's latest value and fact count".to_string(),
        input_schema: with_filing(
            json!({
                "namespace": {"type": "string", "description": "Only concepts in this namespace, e.g. us-gaap or dei"},
                "limit": {"type": "integer", "description": "Maximum concepts to return (default: 20)", "default": 20, "minimum": 1}
            }),
            &[],
        ),
    }
}
