//! # gms2-parser
//!
//! Reads GameMaker Studio 2 projects from disk.
//!
//! This crate provides:
//! - Project layout resolution (`.yyp` lookup, category directories)
//! - A lenient descriptor reader for `.yy`/`.yyp` files
//! - The asset catalog, with per-asset diagnostics
//! - `ProjectService`, the query API over one project root
//! - Plain-text rendering and deterministic export

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod events;
pub mod export;
pub mod layout;
pub mod render;
pub mod service;
pub mod sources;

#[cfg(test)]
pub(crate) mod fixtures;

pub use catalog::Catalog;
pub use config::ParserConfig;
pub use export::{SavedExport, fingerprint, write_export};
pub use layout::ProjectLayout;
pub use service::ProjectService;
