//! Project environment trait

use gms2_core::{
    AssetFilter, AssetListing, Gms2Error, ObjectDetail, Result, RoomDetail, ScanReport, SourceText,
    SpriteDetail,
};
use gms2_parser::{ParserConfig, ProjectService};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// What the MCP tools run against
///
/// Implement this trait to serve a project through the tool handlers. All
/// methods are synchronous; the server serializes access behind a lock.
pub trait ProjectEnvironment: Send + Sync + 'static {
    /// Point the environment at a project root
    ///
    /// Re-opening the current root keeps the existing catalog.
    fn open(&mut self, project_path: &Path) -> Result<()>;

    /// Current project root, if one is open
    fn root(&self) -> Option<&Path>;

    /// Project summary; rebuilds the catalog when `refresh` is set
    fn scan(&mut self, refresh: bool) -> Result<ScanReport>;

    /// Raw text of a source file
    fn source_file(&mut self, file_path: &str) -> Result<SourceText>;

    fn room_info(&mut self, room_name: &str) -> Result<RoomDetail>;

    fn object_info(&mut self, object_name: &str) -> Result<ObjectDetail>;

    fn sprite_info(&mut self, sprite_name: &str) -> Result<SpriteDetail>;

    fn list_assets(&mut self, filter: Option<AssetFilter>) -> Result<AssetListing>;

    /// Full text export of the project
    fn export(&mut self) -> Result<String>;
}

/// Session over at most one project at a time
#[derive(Debug, Default)]
pub struct ProjectSession {
    config: ParserConfig,
    service: Option<ProjectService>,
}

impl ProjectSession {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            service: None,
        }
    }

    /// Session opened on a configured root
    ///
    /// A root that cannot be opened only logs a warning; tools then need an
    /// explicit `project_path`.
    pub fn with_root(root: &Path, config: ParserConfig) -> Self {
        let mut session = Self::new(config);
        if let Err(e) = session.open(root) {
            warn!("Configured project path unavailable: {}", e);
        }
        session
    }

    fn service(&mut self) -> Result<&mut ProjectService> {
        self.service.as_mut().ok_or_else(|| {
            Gms2Error::NotFound(
                "No project open; pass project_path or start the server with --project-path"
                    .into(),
            )
        })
    }
}

impl ProjectEnvironment for ProjectSession {
    fn open(&mut self, project_path: &Path) -> Result<()> {
        if let (Some(service), Ok(canonical)) = (&self.service, fs::canonicalize(project_path)) {
            if service.root() == canonical.as_path() {
                return Ok(());
            }
        }

        let service = ProjectService::with_config(project_path, self.config.clone())?;
        info!("Opened project at {}", service.root().display());
        self.service = Some(service);
        Ok(())
    }

    fn root(&self) -> Option<&Path> {
        self.service.as_ref().map(ProjectService::root)
    }

    fn scan(&mut self, refresh: bool) -> Result<ScanReport> {
        self.service()?.scan_project(refresh)
    }

    fn source_file(&mut self, file_path: &str) -> Result<SourceText> {
        self.service()?.source_file(file_path)
    }

    fn room_info(&mut self, room_name: &str) -> Result<RoomDetail> {
        self.service()?.room_info(room_name)
    }

    fn object_info(&mut self, object_name: &str) -> Result<ObjectDetail> {
        self.service()?.object_info(object_name)
    }

    fn sprite_info(&mut self, sprite_name: &str) -> Result<SpriteDetail> {
        self.service()?.sprite_info(sprite_name)
    }

    fn list_assets(&mut self, filter: Option<AssetFilter>) -> Result<AssetListing> {
        self.service()?.list_assets(filter)
    }

    fn export(&mut self) -> Result<String> {
        self.service()?.export()
    }
}
