//! Plain-text views of query results
//!
//! These are the human-readable halves of tool results and the building
//! blocks of the export document. Paths are always shown relative to the
//! project root with `/` separators.

use gms2_core::{
    AssetCategory, AssetListing, Diagnostic, ObjectDetail, RoomDetail, ScanReport, SourceText,
    SpriteDetail,
};
use std::path::Path;

/// Assets with at most this many source files have them listed
const LISTED_SOURCE_FILES: usize = 5;

pub(crate) const RULE: &str = "==================================================";

/// Root-relative path with `/` separators
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub(crate) fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "-".repeat(title.chars().count()))
}

pub fn scan_report(report: &ScanReport) -> String {
    let mut out = format!("Project: {}\n", report.project_name);
    out.push_str(&format!("Path: {}\n", report.project_path.display()));
    out.push_str(&format!("Descriptor: {}\n", display_path(&report.descriptor)));
    if let Some(version) = &report.ide_version {
        out.push_str(&format!("IDE version: {}\n", version));
    }

    out.push('\n');
    out.push_str(&counts(report.counts.iter().map(|(c, n)| (*c, *n))));
    out.push_str(&format!("Source files: {}\n", report.source_files.len()));

    if !report.source_files.is_empty() {
        out.push('\n');
        out.push_str(&heading("Source files"));
        for file in &report.source_files {
            out.push_str(&format!(
                "  {} ({})\n",
                file.display_name,
                display_path(&file.relative_path)
            ));
        }
    }

    out.push_str(&diagnostics(&report.diagnostics));
    out
}

pub(crate) fn counts(counts: impl Iterator<Item = (AssetCategory, usize)>) -> String {
    counts
        .map(|(category, count)| format!("{}: {}\n", category, count))
        .collect()
}

pub fn diagnostics(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{}", heading(&format!("Diagnostics ({})", diagnostics.len())));
    for diagnostic in diagnostics {
        out.push_str(&format!("  {}\n", diagnostic));
    }
    out
}

pub fn asset_listing(listing: &AssetListing) -> String {
    if listing.is_empty() {
        return "No assets found.\n".to_string();
    }

    let mut out = String::new();
    for (category, assets) in &listing.categories {
        if assets.is_empty() {
            continue;
        }
        out.push_str(&format!("{} ({}):\n", category, assets.len()));
        for asset in assets {
            let kind = asset.kind.as_deref().map(|k| format!(" [{}]", k)).unwrap_or_default();
            out.push_str(&format!(
                "  - {}{} (GML: {}, YY: {})\n",
                asset.name,
                kind,
                asset.source_files.len(),
                if asset.has_descriptor { "✓" } else { "✗" }
            ));
            // Short file lists are spelled out
            if asset.source_files.len() <= LISTED_SOURCE_FILES {
                for file in &asset.source_files {
                    out.push_str(&format!("    • {}\n", file));
                }
            }
        }
    }
    out
}

/// Source text with its header line
pub fn source(text: &SourceText) -> String {
    let mut out = format!(
        "// {} ({} lines{})\n",
        display_path(&text.relative_path),
        text.line_count,
        if text.truncated { ", truncated" } else { "" }
    );
    out.push_str(&text.content);
    if !text.content.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn indented(text: &str, prefix: &str) -> String {
    text.lines().map(|line| format!("{}{}\n", prefix, line)).collect()
}

pub fn object(detail: &ObjectDetail) -> String {
    let object = &detail.object;
    let mut out = format!("Object: {}\n", object.header.name);
    out.push_str(&format!("  Parent: {}\n", detail.parent));
    out.push_str(&format!("  Sprite: {}\n", detail.sprite));
    out.push_str(&format!("  Mask: {}\n", detail.mask_sprite));
    if !detail.children.is_empty() {
        out.push_str(&format!("  Children: {}\n", detail.children.join(", ")));
    }

    out.push_str("  Attributes:\n");
    for (key, value) in &object.attributes {
        out.push_str(&format!("    {}: {}\n", key, value));
    }

    if !object.variables.is_empty() {
        out.push_str("  Variables:\n");
        for var in &object.variables {
            out.push_str(&format!("    {} ({}) = {}\n", var.name, var.var_type, var.value));
        }
    }

    if detail.events.is_empty() {
        out.push_str("  Events: none\n");
        return out;
    }
    out.push_str(&format!("  Events ({}):\n", detail.events.len()));
    for event in &detail.events {
        out.push_str(&format!(
            "    --- {} ({}) ---\n",
            event.display_name,
            display_path(&event.source_path)
        ));
        match (&event.source, &event.source_error) {
            (Some(text), _) => {
                out.push_str(&indented(&text.content, "    "));
                if text.truncated {
                    out.push_str("    [truncated]\n");
                }
            }
            (None, Some(error)) => out.push_str(&format!("    [source unavailable: {}]\n", error)),
            (None, None) => out.push_str("    [source unavailable]\n"),
        }
    }
    out
}

pub fn room(detail: &RoomDetail) -> String {
    let room = &detail.room;
    let mut out = format!("Room: {}\n", room.header.name);
    let size = |v: Option<u32>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
    out.push_str(&format!("  Size: {} x {}\n", size(room.width), size(room.height)));
    out.push_str(&format!("  Speed: {}\n", room.speed));
    out.push_str(&format!("  Persistent: {}\n", room.persistent));
    if let Some(code) = &room.creation_code {
        out.push_str(&format!("  Creation code: {}\n", display_path(code)));
    }

    out.push_str(&format!("  Layers ({}):\n", room.layers.len()));
    let top_level: Vec<_> = room.layers.iter().filter(|l| l.group.is_none()).collect();
    for (i, layer) in top_level.iter().enumerate() {
        layer_tree(room, layer, "    ", i + 1 == top_level.len(), &mut out);
    }

    out.push_str(&format!("  Instances ({}):\n", detail.instances.len()));
    for inst in &detail.instances {
        out.push_str(&format!(
            "    {} : {} at ({}, {}) on {}",
            inst.instance.name, inst.object, inst.instance.x, inst.instance.y, inst.layer
        ));
        if inst.instance.scale_x != 1.0 || inst.instance.scale_y != 1.0 {
            out.push_str(&format!(
                " scale ({}, {})",
                inst.instance.scale_x, inst.instance.scale_y
            ));
        }
        if inst.instance.rotation != 0.0 {
            out.push_str(&format!(" rotation {}", inst.instance.rotation));
        }
        out.push('\n');
    }

    if !detail.unresolved_objects.is_empty() {
        out.push_str(&format!(
            "  Unresolved objects: {}\n",
            detail.unresolved_objects.join(", ")
        ));
    }
    out
}

fn layer_tree(
    room: &gms2_core::RoomAsset,
    layer: &gms2_core::RoomLayer,
    prefix: &str,
    last: bool,
    out: &mut String,
) {
    let branch = if last { "└── " } else { "├── " };
    let depth = layer.depth.map(|d| format!(", depth {}", d)).unwrap_or_default();
    let hidden = if layer.visible { "" } else { ", hidden" };
    let instances = if layer.instances.is_empty() {
        String::new()
    } else {
        format!(", {} instances", layer.instances.len())
    };
    out.push_str(&format!(
        "{}{}{} [{}{}{}{}]\n",
        prefix, branch, layer.name, layer.kind, depth, hidden, instances
    ));

    let children: Vec<_> = room
        .layers
        .iter()
        .filter(|l| l.group.as_deref() == Some(layer.name.as_str()))
        .collect();
    let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
    for (i, child) in children.iter().enumerate() {
        layer_tree(room, child, &child_prefix, i + 1 == children.len(), out);
    }
}

pub fn sprite(detail: &SpriteDetail) -> String {
    let sprite = &detail.sprite;
    let mut out = format!("Sprite: {}\n", sprite.header.name);
    out.push_str(&format!("  Size: {} x {}\n", sprite.width, sprite.height));
    out.push_str(&format!("  Origin: ({}, {})\n", sprite.origin_x, sprite.origin_y));
    out.push_str(&format!("  Frames: {}\n", sprite.frame_count));
    out.push_str(&format!(
        "  Playback: {} {}{}\n",
        sprite.playback_speed,
        sprite.speed_unit,
        if sprite.looping { ", looping" } else { "" }
    ));
    out.push_str(&format!("  Bounding box: {}\n", sprite.bbox_mode));
    out.push_str(&format!("  Collision kind: {}\n", sprite.collision_kind));
    if let Some(group) = &sprite.texture_group {
        out.push_str(&format!("  Texture group: {}\n", group));
    }
    if !detail.used_by.is_empty() {
        out.push_str(&format!("  Used by: {}\n", detail.used_by.join(", ")));
    }
    out
}
