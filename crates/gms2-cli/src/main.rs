//! GMS2 MCP Server
//!
//! Serves one GameMaker Studio 2 project over MCP on stdio, or writes its
//! text export to disk:
//!   gms2-mcp-server --project-path ./MyGame            # serve (default)
//!   gms2-mcp-server --project-path ./MyGame export -o dump.txt

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gms2_core::AssetCategory;
use gms2_parser::{ParserConfig, ProjectService, export, write_export};
use gms2_server::{Gms2Server, ProjectSession};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Optional settings file read before the command line
const CONFIG_ENV_FILE: &str = "config.env";

#[derive(Parser, Debug)]
#[command(name = "gms2-mcp-server")]
#[command(about = "MCP server for GameMaker Studio 2 projects")]
#[command(version)]
struct Cli {
    /// Project root (the directory holding the .yyp file); also read from
    /// `config.env`
    #[arg(long, env = "GMS2_PROJECT_PATH")]
    project_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,
    /// Write the full project export to a file
    Export {
        /// Output file (defaults to <project>_export.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Real environment variables take precedence over the file
    load_config_env(Path::new(CONFIG_ENV_FILE));
    let cli = Cli::parse();

    if let Some(path) = &cli.project_path {
        if !path.exists() {
            warn!("Configured project path does not exist: {}", path.display());
        }
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.project_path).await,
        Commands::Export { output } => export_project(cli.project_path, output),
    }
}

/// Best-effort load of `KEY=value` settings into the environment
fn load_config_env(path: &Path) -> bool {
    match dotenvy::from_filename(path) {
        Ok(_) => {
            info!("Loaded settings from {}", path.display());
            true
        }
        Err(e) if e.not_found() => {
            debug!("No {} found", path.display());
            false
        }
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            false
        }
    }
}

async fn serve(project_path: Option<PathBuf>) -> Result<()> {
    let config = ParserConfig::default();
    let session = match &project_path {
        Some(path) => ProjectSession::with_root(path, config),
        None => {
            info!("No project path configured; tools need project_path");
            ProjectSession::new(config)
        }
    };

    let server = Gms2Server::new(session);
    info!("{} v{}", server.info().name, server.info().version);
    server.run_stdio().await?;
    Ok(())
}

fn export_project(project_path: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let root = project_path.context("export needs --project-path or GMS2_PROJECT_PATH")?;
    let mut service = ProjectService::new(&root)
        .with_context(|| format!("Failed to open project at {}", root.display()))?;

    let report = service.scan_project(false)?;
    info!(
        "Exporting {} ({} objects, {} scripts, {} rooms, {} sprites, {} diagnostics)",
        report.project_name,
        report.count(AssetCategory::Objects),
        report.count(AssetCategory::Scripts),
        report.count(AssetCategory::Rooms),
        report.count(AssetCategory::Sprites),
        report.diagnostics.len(),
    );

    let document = service.export()?;
    let path = output
        .unwrap_or_else(|| PathBuf::from(export::default_file_name(&report.project_name)));
    let saved = write_export(&document, &path)?;

    println!("Project exported to {}", saved.path.display());
    println!("Characters: {}", saved.characters);
    println!("SHA-256: {}", saved.sha256);
    Ok(())
}
