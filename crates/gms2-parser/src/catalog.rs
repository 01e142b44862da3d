//! Asset catalog
//!
//! Each category directory holds one folder per asset, named after the asset
//! and containing `<name>.yy` plus auxiliary files (event code for objects,
//! the script body, frame images for sprites). The builder reads every
//! folder it finds; a folder that cannot be read or parsed is recorded as a
//! diagnostic and skipped, never failing the build.

use gms2_core::{
    Asset, AssetCategory, AssetHeader, AssetLink, BboxMode, Diagnostic, DiagnosticKind,
    Gms2Error, Instance, LayerKind, ObjectAsset, ObjectVariable, OtherAsset, Result, RoomAsset,
    RoomLayer, ScriptAsset, SourceFileEntry, SpeedUnit, SpriteAsset,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ParserConfig;
use crate::descriptor::{self, array_at, bool_at, f64_at, i64_at, link_name, string_at, u32_at};
use crate::events;
use crate::layout::{self, CategoryDir, ProjectLayout};
use crate::sources;

/// Default room speed when the descriptor has none
const DEFAULT_ROOM_SPEED: u32 = 30;
/// Default sprite playback speed when the descriptor has none
const DEFAULT_SPRITE_SPEED: f64 = 15.0;

/// In-memory index of a project's assets
#[derive(Debug)]
pub struct Catalog {
    layout: ProjectLayout,
    assets: BTreeMap<AssetCategory, BTreeMap<String, Asset>>,
    source_files: Vec<SourceFileEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl Catalog {
    /// Build a catalog for a resolved layout
    ///
    /// Fails only when the project root itself cannot be read.
    pub fn build(layout: ProjectLayout, config: &ParserConfig) -> Result<Self> {
        let mut builder = CatalogBuilder {
            layout: &layout,
            config,
            assets: BTreeMap::new(),
            diagnostics: layout.diagnostics.clone(),
        };

        for dir in &layout.categories {
            builder.build_category_dir(dir);
        }

        let CatalogBuilder {
            assets,
            diagnostics,
            ..
        } = builder;
        let source_files = sources::discover(&layout, config)?;

        let catalog = Self {
            layout,
            assets,
            source_files,
            diagnostics,
        };
        info!(
            "Catalogued {}: {} objects, {} scripts, {} rooms, {} sprites, {} other, {} source files, {} diagnostics",
            catalog.layout.name,
            catalog.count(AssetCategory::Objects),
            catalog.count(AssetCategory::Scripts),
            catalog.count(AssetCategory::Rooms),
            catalog.count(AssetCategory::Sprites),
            catalog.count(AssetCategory::Other),
            catalog.source_files.len(),
            catalog.diagnostics.len()
        );
        Ok(catalog)
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn get(&self, category: AssetCategory, name: &str) -> Option<&Asset> {
        self.assets.get(&category)?.get(name)
    }

    pub fn contains(&self, category: AssetCategory, name: &str) -> bool {
        self.get(category, name).is_some()
    }

    /// Assets of a category, sorted by name
    pub fn assets(&self, category: AssetCategory) -> impl Iterator<Item = &Asset> {
        self.assets
            .get(&category)
            .into_iter()
            .flat_map(|assets| assets.values())
    }

    pub fn count(&self, category: AssetCategory) -> usize {
        self.assets.get(&category).map_or(0, BTreeMap::len)
    }

    pub fn counts(&self) -> BTreeMap<AssetCategory, usize> {
        AssetCategory::ALL
            .iter()
            .map(|&category| (category, self.count(category)))
            .collect()
    }

    pub fn object(&self, name: &str) -> Option<&ObjectAsset> {
        match self.get(AssetCategory::Objects, name)? {
            Asset::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn script(&self, name: &str) -> Option<&ScriptAsset> {
        match self.get(AssetCategory::Scripts, name)? {
            Asset::Script(script) => Some(script),
            _ => None,
        }
    }

    pub fn room(&self, name: &str) -> Option<&RoomAsset> {
        match self.get(AssetCategory::Rooms, name)? {
            Asset::Room(room) => Some(room),
            _ => None,
        }
    }

    pub fn sprite(&self, name: &str) -> Option<&SpriteAsset> {
        match self.get(AssetCategory::Sprites, name)? {
            Asset::Sprite(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectAsset> {
        self.assets(AssetCategory::Objects).filter_map(|asset| match asset {
            Asset::Object(object) => Some(object),
            _ => None,
        })
    }

    /// Resolve a name link against a category
    pub fn link(&self, category: AssetCategory, name: Option<&str>) -> AssetLink {
        match name {
            None => AssetLink::None,
            Some(name) if self.contains(category, name) => AssetLink::Resolved(name.to_string()),
            Some(name) => AssetLink::Unresolved(name.to_string()),
        }
    }

    pub fn source_files(&self) -> &[SourceFileEntry] {
        &self.source_files
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostic recorded for a skipped asset folder
    pub fn skipped(&self, category: AssetCategory, name: &str) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| {
            d.category == Some(category)
                && d.asset.as_deref() == Some(name)
                && d.kind != DiagnosticKind::Conflict
        })
    }
}

/// Diagnostic text for a build failure
///
/// Diagnostics carry the root-relative path separately, so the message drops
/// the absolute path embedded in parse and I/O errors.
fn diagnostic_message(error: Gms2Error) -> String {
    match error {
        Gms2Error::ParseError { message, .. } => message,
        Gms2Error::Io { source, .. } => format!("unreadable: {}", source),
        other => other.to_string(),
    }
}

struct CatalogBuilder<'a> {
    layout: &'a ProjectLayout,
    config: &'a ParserConfig,
    assets: BTreeMap<AssetCategory, BTreeMap<String, Asset>>,
    diagnostics: Vec<Diagnostic>,
}

impl CatalogBuilder<'_> {
    fn build_category_dir(&mut self, dir: &CategoryDir) {
        let entries = match layout::list_dir(&dir.path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping category directory {}: {}", dir.dir_name, e);
                self.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::Unreadable, diagnostic_message(e))
                        .with_path(dir.dir_name.clone()),
                );
                return;
            }
        };

        for folder in entries.iter().filter(|p| p.is_dir()) {
            if layout::is_symlink(folder) && !layout::links_inside(&self.layout.root, folder) {
                warn!(
                    "Skipping {} folder linked outside the project: {}",
                    dir.category,
                    self.layout.relative(folder).display()
                );
                continue;
            }
            match self.build_asset(dir, folder) {
                Ok(asset) => self.insert(asset),
                Err(e) => {
                    let folder_name = layout::file_name(folder);
                    let kind = match &e {
                        Gms2Error::NotFound(_) => DiagnosticKind::MissingDescriptor,
                        Gms2Error::ParseError { .. } => DiagnosticKind::ParseError,
                        _ => DiagnosticKind::Unreadable,
                    };
                    warn!("Skipping {} asset {}: {}", dir.category, folder_name, e);
                    self.diagnostics.push(
                        Diagnostic::new(kind, diagnostic_message(e))
                            .with_asset(dir.category, folder_name)
                            .with_path(self.layout.relative(folder)),
                    );
                }
            }
        }
    }

    /// First occurrence of a name wins; later ones become conflicts
    fn insert(&mut self, asset: Asset) {
        let category = asset.category();
        let assets = self.assets.entry(category).or_default();

        if let Some(existing) = assets.get(asset.name()) {
            let message = format!(
                "name '{}' already taken by {}; {} dropped",
                asset.name(),
                existing.header().dir.display(),
                asset.header().dir.display()
            );
            warn!("Asset conflict in {}: {}", category, message);
            self.diagnostics.push(
                Diagnostic::new(DiagnosticKind::Conflict, message)
                    .with_asset(category, asset.name())
                    .with_path(asset.header().dir.clone()),
            );
            return;
        }

        assets.insert(asset.name().to_string(), asset);
    }

    fn build_asset(&self, dir: &CategoryDir, folder: &Path) -> Result<Asset> {
        let folder_name = layout::file_name(folder);
        let descriptor_path = self.find_file(folder, &folder_name, &self.config.descriptor_extension)?;

        if dir.category == AssetCategory::Scripts {
            return self.build_script(folder, &folder_name, descriptor_path);
        }

        let descriptor_path = descriptor_path.ok_or_else(|| {
            Gms2Error::NotFound(format!(
                "no .{} descriptor in {}",
                self.config.descriptor_extension,
                self.layout.relative(folder).display()
            ))
        })?;
        let value = descriptor::read(&descriptor_path)?;
        let header = AssetHeader {
            name: string_at(&value, &["name"]).unwrap_or(folder_name),
            category: dir.category,
            dir: self.layout.relative(folder),
            descriptor: Some(self.layout.relative(&descriptor_path)),
        };

        let asset = match dir.category {
            AssetCategory::Objects => Asset::Object(self.build_object(header, &value, folder)?),
            AssetCategory::Rooms => Asset::Room(self.build_room(header, &value, folder)),
            AssetCategory::Sprites => Asset::Sprite(self.build_sprite(header, &value, folder)?),
            AssetCategory::Scripts | AssetCategory::Other => Asset::Other(OtherAsset {
                header,
                kind: dir.dir_name.clone(),
            }),
        };
        Ok(asset)
    }

    /// `<folder>/<name>.<ext>`, else the first file with that extension
    fn find_file(&self, folder: &Path, name: &str, extension: &str) -> Result<Option<PathBuf>> {
        let preferred = folder.join(format!("{}.{}", name, extension));
        if preferred.is_file() {
            return Ok(Some(preferred));
        }
        Ok(layout::list_dir(folder)?
            .into_iter()
            .find(|p| p.is_file() && layout::has_extension(p, extension)))
    }

    fn build_script(
        &self,
        folder: &Path,
        folder_name: &str,
        descriptor_path: Option<PathBuf>,
    ) -> Result<Asset> {
        let source = self.find_file(folder, folder_name, &self.config.source_extension)?;
        if descriptor_path.is_none() && source.is_none() {
            return Err(Gms2Error::NotFound(format!(
                "no descriptor or source file in {}",
                self.layout.relative(folder).display()
            )));
        }

        let name = match &descriptor_path {
            Some(path) => {
                let value = descriptor::read(path)?;
                string_at(&value, &["name"]).unwrap_or_else(|| folder_name.to_string())
            }
            None => folder_name.to_string(),
        };

        Ok(Asset::Script(ScriptAsset {
            header: AssetHeader {
                name,
                category: AssetCategory::Scripts,
                dir: self.layout.relative(folder),
                descriptor: descriptor_path.map(|p| self.layout.relative(&p)),
            },
            source: source.map(|p| self.layout.relative(&p)),
        }))
    }

    fn build_object(&self, header: AssetHeader, value: &Value, folder: &Path) -> Result<ObjectAsset> {
        Ok(ObjectAsset {
            header,
            parent: link_name(value, "parentObjectId"),
            sprite: link_name(value, "spriteId"),
            mask_sprite: link_name(value, "spriteMaskId"),
            events: events::scan(self.layout, folder, self.config)?,
            declared_events: array_at(value, &["eventList"]).len(),
            attributes: object_attributes(value),
            variables: array_at(value, &["properties"])
                .iter()
                .map(object_variable)
                .collect(),
        })
    }

    fn build_room(&self, header: AssetHeader, value: &Value, folder: &Path) -> RoomAsset {
        let creation_code = self
            .existing(folder, "RoomCreationCode.gml")
            .or_else(|| {
                string_at(value, &["creationCodeFile"])
                    .and_then(|file| Path::new(&file).file_name().map(|n| n.to_os_string()))
                    .and_then(|name| self.existing(folder, &name.to_string_lossy()))
            });

        let mut layers = Vec::new();
        for layer in array_at(value, &["layers"]) {
            self.flatten_layer(layer, None, folder, &mut layers);
        }

        RoomAsset {
            header,
            width: u32_at(value, &["roomSettings", "Width"]),
            height: u32_at(value, &["roomSettings", "Height"]),
            speed: u32_at(value, &["roomSettings", "Speed"]).unwrap_or(DEFAULT_ROOM_SPEED),
            persistent: bool_at(value, &["isPersistent"], false)
                || bool_at(value, &["roomSettings", "persistent"], false),
            creation_code,
            layers,
        }
    }

    /// Group layers come before the layers they contain
    fn flatten_layer(&self, value: &Value, group: Option<&str>, folder: &Path, out: &mut Vec<RoomLayer>) {
        let name = string_at(value, &["name"]).unwrap_or_else(|| format!("Layer {}", out.len()));

        let instances = array_at(value, &["instances"])
            .iter()
            .enumerate()
            .map(|(i, inst)| {
                let inst_name = string_at(inst, &["name"]).unwrap_or_else(|| format!("instance_{}", i));
                Instance {
                    object: link_name(inst, "objectId")
                        .or_else(|| link_name(inst, "objId"))
                        .unwrap_or_else(|| "UnknownObject".to_string()),
                    x: f64_at(inst, &["x"], 0.0),
                    y: f64_at(inst, &["y"], 0.0),
                    scale_x: f64_at(inst, &["scaleX"], 1.0),
                    scale_y: f64_at(inst, &["scaleY"], 1.0),
                    rotation: f64_at(inst, &["rotation"], 0.0),
                    creation_code: self
                        .existing(folder, &format!("InstanceCreationCode_{}.gml", inst_name)),
                    name: inst_name,
                }
            })
            .collect();

        out.push(RoomLayer {
            name: name.clone(),
            kind: layer_kind(value),
            depth: i64_at(value, &["depth"]),
            visible: bool_at(value, &["visible"], true),
            group: group.map(str::to_string),
            instances,
        });

        for child in array_at(value, &["layers"]) {
            self.flatten_layer(child, Some(&name), folder, out);
        }
    }

    fn build_sprite(&self, header: AssetHeader, value: &Value, folder: &Path) -> Result<SpriteAsset> {
        let frame_files: Vec<String> = layout::list_dir(folder)?
            .iter()
            .filter(|p| p.is_file() && layout::has_extension(p, "png"))
            .map(|p| layout::file_name(p))
            .collect();

        let declared_frames = array_at(value, &["frames"]).len();
        let frame_count = if declared_frames > 0 {
            declared_frames
        } else {
            frame_files.len()
        };

        let sequence_or_top = |key: &str| {
            descriptor::get(value, &["sequence", key]).or_else(|| value.get(key))
        };
        let speed_type = sequence_or_top("playbackSpeedType").and_then(Value::as_i64);
        let playback = sequence_or_top("playback").and_then(Value::as_i64);

        Ok(SpriteAsset {
            header,
            frame_count,
            width: u32_at(value, &["width"]).unwrap_or(0),
            height: u32_at(value, &["height"]).unwrap_or(0),
            origin_x: i64_at(value, &["sequence", "xorigin"])
                .or_else(|| i64_at(value, &["xorigin"]))
                .unwrap_or(0),
            origin_y: i64_at(value, &["sequence", "yorigin"])
                .or_else(|| i64_at(value, &["yorigin"]))
                .unwrap_or(0),
            playback_speed: sequence_or_top("playbackSpeed")
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_SPRITE_SPEED),
            speed_unit: match speed_type {
                Some(1) => SpeedUnit::FramesPerGameFrame,
                _ => SpeedUnit::FramesPerSecond,
            },
            looping: playback.is_none_or(|p| p != 0),
            bbox_mode: BboxMode::from_code(i64_at(value, &["bboxMode"]).unwrap_or(0)),
            collision_kind: i64_at(value, &["collisionKind"]).unwrap_or(1),
            texture_group: link_name(value, "textureGroupId"),
            frame_files,
        })
    }

    fn existing(&self, folder: &Path, file_name: &str) -> Option<PathBuf> {
        let path = folder.join(file_name);
        path.is_file().then(|| self.layout.relative(&path))
    }
}

/// Visibility and physics flags, defaults filled in
fn object_attributes(value: &Value) -> BTreeMap<String, Value> {
    let defaults = [
        ("visible", json!(true)),
        ("solid", json!(false)),
        ("persistent", json!(false)),
        ("managed", json!(true)),
        ("physicsObject", json!(false)),
        ("physicsSensor", json!(false)),
        ("physicsShape", json!(1)),
        ("physicsDensity", json!(0.5)),
        ("physicsRestitution", json!(0.1)),
        ("physicsGroup", json!(1)),
        ("physicsLinearDamping", json!(0.1)),
        ("physicsAngularDamping", json!(0.1)),
        ("physicsFriction", json!(0.2)),
        ("physicsStartAwake", json!(true)),
        ("physicsKinematic", json!(false)),
    ];

    defaults
        .into_iter()
        .map(|(key, default)| {
            let actual = value
                .get(key)
                .filter(|v| {
                    (v.is_boolean() && default.is_boolean()) || (v.is_number() && default.is_number())
                })
                .cloned()
                .unwrap_or(default);
            (key.to_string(), actual)
        })
        .collect()
}

fn object_variable(value: &Value) -> ObjectVariable {
    let name = string_at(value, &["name"])
        .or_else(|| string_at(value, &["varName"]))
        .unwrap_or_else(|| "UnknownVar".to_string());
    let raw = value.get("value").or_else(|| value.get("varValue"));
    let text = match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "UnknownVal".to_string(),
        Some(other) => other.to_string(),
    };
    let var_type = match value.get("varType").or_else(|| value.get("type")) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => "Real".to_string(),
            Some(1) => "Integer".to_string(),
            Some(2) => "String".to_string(),
            Some(3) => "Boolean".to_string(),
            Some(4) => "Expression".to_string(),
            Some(5) => "Asset".to_string(),
            Some(6) => "List".to_string(),
            Some(7) => "Colour".to_string(),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        _ => "?".to_string(),
    };

    ObjectVariable {
        name,
        value: text,
        var_type,
    }
}

/// `GMRInstanceLayer` → Instances, `GMRTileLayer` → Tiles, ...
fn layer_kind(value: &Value) -> LayerKind {
    let Some(tag) = descriptor::resource_type(value) else {
        return LayerKind::Other("Unknown".to_string());
    };
    // Pre-2.3 tags carry a model suffix: `GMInstanceLayer_Model:#YoYoStudio...`
    let stripped = tag
        .strip_prefix("GMR")
        .or_else(|| tag.strip_prefix("GM"))
        .unwrap_or(&tag);
    let stripped = stripped.split('_').next().unwrap_or(stripped);

    match stripped {
        "InstanceLayer" => LayerKind::Instances,
        "TileLayer" => LayerKind::Tiles,
        "BackgroundLayer" => LayerKind::Background,
        other => match other.strip_suffix("Layer").unwrap_or(other) {
            "" => LayerKind::Other("Group".to_string()),
            kind => LayerKind::Other(kind.to_string()),
        },
    }
}
