//! # gms2-core
//!
//! Core types for working with GameMaker Studio 2 projects.
//!
//! This crate provides the foundational types shared by the parser and the
//! MCP server:
//! - Asset categories and typed assets (objects, scripts, rooms, sprites)
//! - The object event taxonomy and its canonical ordering
//! - Query results with name links resolved
//! - Build diagnostics and the error taxonomy

pub mod asset;
pub mod detail;
pub mod diagnostic;
pub mod error;
pub mod event;

pub use asset::{
    Asset, AssetCategory, AssetFilter, AssetHeader, BboxMode, Instance, LayerKind, ObjectAsset,
    ObjectVariable, OtherAsset, RoomAsset, RoomLayer, ScriptAsset, SpeedUnit, SpriteAsset,
};
pub use detail::{
    AssetLink, AssetListing, EventDetail, InstanceDetail, ListedAsset, ObjectDetail, RoomDetail,
    ScanReport, SourceFileEntry, SourceText, SpriteDetail,
};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{Gms2Error, Result, error_codes};
pub use event::{Event, EventType};
