//! stdio transport for MCP JSON-RPC

use crate::Gms2Server;
use crate::environment::ProjectEnvironment;
use crate::mcp::{
    InitializeParams, InitializeResult, PROTOCOL_VERSION, Request, ResourcesCapability, Response,
    ServerCapabilities, ToolsCapability,
};
use crate::tools::{error_code, handle_tool_call, list_tools};
use gms2_core::{Gms2Error, Result, error_codes};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

const SUMMARY_URI: &str = "gms2://project/summary";
const EXPORT_URI: &str = "gms2://project/export";

/// Run the MCP server on stdio
pub async fn run<E: ProjectEnvironment>(server: Gms2Server<E>) -> Result<()> {
    info!("GMS2 MCP server starting on stdio");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve(&server, reader, writer).await
}

/// Serve newline-delimited JSON-RPC until the reader hits EOF
pub async fn serve<E, R, W>(server: &Gms2Server<E>, mut reader: R, mut writer: W) -> Result<()>
where
    E: ProjectEnvironment,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| Gms2Error::io("reading stdin", e))?;

        if bytes_read == 0 {
            // EOF - client disconnected
            info!("Client disconnected (EOF)");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let request: Request = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                continue;
            }
        };

        let Some(response) = handle_request(&request, server).await else {
            continue;
        };
        let mut response_json = serde_json::to_string(&response)
            .map_err(|e| Gms2Error::SerializationError(e.to_string()))?;

        debug!("Sending: {}", response_json);
        response_json.push('\n');

        writer
            .write_all(response_json.as_bytes())
            .await
            .map_err(|e| Gms2Error::io("writing stdout", e))?;
        writer
            .flush()
            .await
            .map_err(|e| Gms2Error::io("flushing stdout", e))?;
    }

    Ok(())
}

/// Dispatch one message; notifications yield no response
pub async fn handle_request<E: ProjectEnvironment>(
    request: &Request,
    server: &Gms2Server<E>,
) -> Option<Response> {
    if request.is_notification() {
        match request.method.as_str() {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification: {}", other),
        }
        return None;
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(request, server).await,
        "ping" => Response::success(request.id.clone(), serde_json::json!({})),
        "tools/list" => handle_tools_list(request),
        "tools/call" => handle_tools_call(request, server).await,
        "resources/list" => handle_resources_list(request),
        "resources/read" => handle_resources_read(request, server).await,
        _ => Response::error(
            request.id.clone(),
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ),
    };
    Some(response)
}

async fn handle_initialize<E: ProjectEnvironment>(
    request: &Request,
    server: &Gms2Server<E>,
) -> Response {
    let params: InitializeParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Invalid initialize params: {}", e),
            );
        }
    };
    info!(
        "Initialize from {} {} (protocol {})",
        params.client_info.name, params.client_info.version, params.protocol_version
    );

    let instructions = {
        let env = server.environment.read().await;
        match env.root() {
            Some(root) => format!("Serving the GMS2 project at {}.", root.display()),
            None => "No project configured; pass project_path to any tool.".to_string(),
        }
    };

    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
        },
        server_info: server.info.clone(),
        instructions: Some(instructions),
    };

    match serde_json::to_value(result) {
        Ok(value) => Response::success(request.id.clone(), value),
        Err(e) => Response::error(request.id.clone(), error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

fn handle_tools_list(request: &Request) -> Response {
    let tools = list_tools();
    Response::success(request.id.clone(), serde_json::json!({ "tools": tools }))
}

async fn handle_tools_call<E: ProjectEnvironment>(
    request: &Request,
    server: &Gms2Server<E>,
) -> Response {
    #[derive(serde::Deserialize)]
    struct ToolCallParams {
        name: String,
        #[serde(default)]
        arguments: serde_json::Value,
    }

    let params: ToolCallParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Invalid tool call params: {}", e),
            );
        }
    };

    handle_tool_call(
        &params.name,
        params.arguments,
        request.id.clone(),
        &server.environment,
    )
    .await
}

fn handle_resources_list(request: &Request) -> Response {
    let resources = vec![
        serde_json::json!({
            "uri": SUMMARY_URI,
            "name": "Project Summary",
            "description": "Asset counts, source files and diagnostics of the current project",
            "mimeType": "application/json"
        }),
        serde_json::json!({
            "uri": EXPORT_URI,
            "name": "Project Export",
            "description": "Full text export of the current project",
            "mimeType": "text/plain"
        }),
    ];

    Response::success(
        request.id.clone(),
        serde_json::json!({ "resources": resources }),
    )
}

async fn handle_resources_read<E: ProjectEnvironment>(
    request: &Request,
    server: &Gms2Server<E>,
) -> Response {
    #[derive(serde::Deserialize)]
    struct ReadParams {
        uri: String,
    }

    let params: ReadParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Invalid read params: {}", e),
            );
        }
    };

    let mut env = server.environment.write().await;
    let content = match params.uri.as_str() {
        SUMMARY_URI => env.scan(false).and_then(|report| {
            serde_json::to_string(&report)
                .map(|text| (text, "application/json"))
                .map_err(Gms2Error::from)
        }),
        EXPORT_URI => env.export().map(|text| (text, "text/plain")),
        _ => {
            return Response::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Unknown resource: {}", params.uri),
            );
        }
    };

    match content {
        Ok((text, mime_type)) => Response::success(
            request.id.clone(),
            serde_json::json!({
                "contents": [{
                    "uri": params.uri,
                    "mimeType": mime_type,
                    "text": text
                }]
            }),
        ),
        Err(e) => Response::error_with_kind(request.id.clone(), error_code(&e), e.kind(), e.to_string()),
    }
}
