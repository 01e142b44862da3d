//! MCP tool handlers for GMS2 project queries

use gms2_core::{AssetFilter, AssetListing, Gms2Error, Result, error_codes};
use gms2_parser::{export, render};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::environment::ProjectEnvironment;
use crate::mcp::{RequestId, Response};

/// Tool definition for MCP tools/list
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn project_path_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Path to the GMS2 project folder (defaults to the configured project)"
    })
}

/// Get list of available tools
pub fn list_tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "scan_gms2_project".into(),
            description: "Scan a GameMaker Studio 2 project: asset counts per category, every .gml file, and build diagnostics.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "refresh": {
                        "type": "boolean",
                        "description": "Rebuild the asset catalog from disk",
                        "default": false
                    }
                }
            }),
        },
        ToolDef {
            name: "get_gml_file_content".into(),
            description: "Read a .gml source file. Example: {\"file_path\": \"obj_player / Create_0\"}".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "file_path": {
                        "type": "string",
                        "description": "Path relative to the project root, absolute path inside it, or \"<asset> / <file>\" as listed by scan_gms2_project"
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolDef {
            name: "get_room_info".into(),
            description: "Room size, speed, layers and placed instances, with objects missing from the project flagged.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "room_name": {
                        "type": "string",
                        "description": "Room name. Example: \"rm_level1\""
                    }
                },
                "required": ["room_name"]
            }),
        },
        ToolDef {
            name: "get_object_info".into(),
            description: "Object properties, parent and sprite, child objects, and every event with its GML code.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "object_name": {
                        "type": "string",
                        "description": "Object name. Example: \"obj_player\""
                    }
                },
                "required": ["object_name"]
            }),
        },
        ToolDef {
            name: "get_sprite_info".into(),
            description: "Sprite size, origin, frames, playback and collision settings.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "sprite_name": {
                        "type": "string",
                        "description": "Sprite name. Example: \"spr_player\""
                    }
                },
                "required": ["sprite_name"]
            }),
        },
        ToolDef {
            name: "list_project_assets".into(),
            description: "List project assets grouped by category.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "category": {
                        "type": "string",
                        "description": "Only list this category",
                        "enum": ["Objects", "Scripts", "Rooms", "Sprites", "Other", "Notes", "Tile Sets", "Timelines", "Fonts", "Sounds", "Extensions"]
                    }
                }
            }),
        },
        ToolDef {
            name: "export_project_data".into(),
            description: "Export the whole project (objects with event code, scripts, rooms, sprites) as one text document.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_path": project_path_schema(),
                    "save_to_file": {
                        "type": "boolean",
                        "description": "Write the document to a file instead of returning it",
                        "default": false
                    },
                    "output_file": {
                        "type": "string",
                        "description": "Where to save when save_to_file is true (default <project>_export.txt)"
                    }
                }
            }),
        },
    ]
}

/// Parameters for scan_gms2_project
#[derive(Debug, Default, Deserialize)]
pub struct ScanParams {
    pub project_path: Option<PathBuf>,
    #[serde(default)]
    pub refresh: bool,
}

/// Parameters for get_gml_file_content
#[derive(Debug, Deserialize)]
pub struct SourceFileParams {
    pub project_path: Option<PathBuf>,
    pub file_path: String,
}

/// Parameters for get_room_info
#[derive(Debug, Deserialize)]
pub struct RoomInfoParams {
    pub project_path: Option<PathBuf>,
    pub room_name: String,
}

/// Parameters for get_object_info
#[derive(Debug, Deserialize)]
pub struct ObjectInfoParams {
    pub project_path: Option<PathBuf>,
    pub object_name: String,
}

/// Parameters for get_sprite_info
#[derive(Debug, Deserialize)]
pub struct SpriteInfoParams {
    pub project_path: Option<PathBuf>,
    pub sprite_name: String,
}

/// Parameters for list_project_assets
#[derive(Debug, Default, Deserialize)]
pub struct ListAssetsParams {
    pub project_path: Option<PathBuf>,
    pub category: Option<String>,
}

/// Parameters for export_project_data
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub project_path: Option<PathBuf>,
    #[serde(default)]
    pub save_to_file: bool,
    pub output_file: Option<PathBuf>,
}

/// Result of a tool: rendered text plus the typed detail
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
    pub structured: serde_json::Value,
}

impl ToolOutput {
    fn new(text: String, detail: &impl Serialize) -> Result<Self> {
        Ok(Self {
            text,
            structured: serde_json::to_value(detail)?,
        })
    }
}

/// JSON-RPC error code for an error kind
pub fn error_code(error: &Gms2Error) -> i32 {
    match error {
        Gms2Error::NotFound(_) => error_codes::NOT_FOUND,
        Gms2Error::ParseError { .. } => error_codes::PARSE_ERROR,
        Gms2Error::InvalidPath(_) => error_codes::INVALID_PATH,
        Gms2Error::Conflict(_) => error_codes::CONFLICT,
        Gms2Error::ProtocolError(_) => error_codes::INVALID_PARAMS,
        Gms2Error::Io { .. } | Gms2Error::SerializationError(_) => error_codes::INTERNAL_ERROR,
    }
}

/// Handle a tools/call request
pub async fn handle_tool_call<E: ProjectEnvironment>(
    name: &str,
    params: serde_json::Value,
    id: Option<RequestId>,
    environment: &Arc<RwLock<E>>,
) -> Response {
    debug!("Tool call: {}", name);
    let result = match name {
        "scan_gms2_project" => handle_scan(params, environment).await,
        "get_gml_file_content" => handle_source_file(params, environment).await,
        "get_room_info" => handle_room_info(params, environment).await,
        "get_object_info" => handle_object_info(params, environment).await,
        "get_sprite_info" => handle_sprite_info(params, environment).await,
        "list_project_assets" => handle_list_assets(params, environment).await,
        "export_project_data" => handle_export(params, environment).await,
        _ => Err(Gms2Error::ProtocolError(format!("Unknown tool: {}", name))),
    };

    match result {
        Ok(output) => Response::success(
            id,
            serde_json::json!({
                "content": [{ "type": "text", "text": output.text }],
                "structuredContent": output.structured,
            }),
        ),
        Err(e) => {
            warn!("Tool {} failed: {}", name, e);
            Response::error_with_kind(id, error_code(&e), e.kind(), e.to_string())
        }
    }
}

/// Null or missing arguments count as an empty object
fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T> {
    let params = if params.is_null() {
        serde_json::json!({})
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| Gms2Error::ProtocolError(format!("Invalid arguments: {}", e)))
}

fn retarget<E: ProjectEnvironment>(env: &mut E, project_path: Option<&PathBuf>) -> Result<()> {
    match project_path {
        Some(path) => env.open(path),
        None => Ok(()),
    }
}

async fn handle_scan<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: ScanParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;
    let report = env.scan(p.refresh)?;

    ToolOutput::new(render::scan_report(&report), &report)
}

async fn handle_source_file<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: SourceFileParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;
    let text = env.source_file(&p.file_path)?;

    ToolOutput::new(render::source(&text), &text)
}

async fn handle_room_info<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: RoomInfoParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;
    let detail = env.room_info(&p.room_name)?;

    ToolOutput::new(render::room(&detail), &detail)
}

async fn handle_object_info<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: ObjectInfoParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;
    let detail = env.object_info(&p.object_name)?;

    ToolOutput::new(render::object(&detail), &detail)
}

async fn handle_sprite_info<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: SpriteInfoParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;
    let detail = env.sprite_info(&p.sprite_name)?;

    ToolOutput::new(render::sprite(&detail), &detail)
}

async fn handle_list_assets<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: ListAssetsParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;

    let listing = match p.category.as_deref() {
        None => env.list_assets(None)?,
        Some(name) => match AssetFilter::parse(name) {
            Some(filter) => env.list_assets(Some(filter))?,
            None => {
                // Unknown categories simply have no assets
                debug!("Unknown asset category filter: {}", name);
                AssetListing {
                    categories: Default::default(),
                }
            }
        },
    };

    ToolOutput::new(render::asset_listing(&listing), &listing)
}

async fn handle_export<E: ProjectEnvironment>(
    params: serde_json::Value,
    environment: &Arc<RwLock<E>>,
) -> Result<ToolOutput> {
    let p: ExportParams = parse_params(params)?;

    let mut env = environment.write().await;
    retarget(&mut *env, p.project_path.as_ref())?;
    let document = env.export()?;

    if !p.save_to_file {
        let detail = serde_json::json!({
            "characters": document.chars().count(),
            "sha256": export::fingerprint(&document),
            "document": document,
        });
        return Ok(ToolOutput {
            text: document,
            structured: detail,
        });
    }

    let path = match p.output_file {
        Some(path) => path,
        None => PathBuf::from(export::default_file_name(&env.scan(false)?.project_name)),
    };
    let saved = export::write_export(&document, &path)?;
    let text = format!(
        "Project exported to {}\nCharacters: {}\nSHA-256: {}\n",
        saved.path.display(),
        saved.characters,
        saved.sha256
    );
    ToolOutput::new(text, &saved)
}
