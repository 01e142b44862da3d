//! Asset model
//!
//! Every relationship between assets is a name, resolved against the catalog
//! when a query asks for it. Nothing here points at another asset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::event::Event;

/// Asset category, in the order categories are always presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Objects,
    Scripts,
    Rooms,
    Sprites,
    Other,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 5] = [
        AssetCategory::Objects,
        AssetCategory::Scripts,
        AssetCategory::Rooms,
        AssetCategory::Sprites,
        AssetCategory::Other,
    ];

    /// Directory name under the project root; `None` for the catch-all
    pub fn dir_name(self) -> Option<&'static str> {
        match self {
            AssetCategory::Objects => Some("objects"),
            AssetCategory::Scripts => Some("scripts"),
            AssetCategory::Rooms => Some("rooms"),
            AssetCategory::Sprites => Some("sprites"),
            AssetCategory::Other => None,
        }
    }

    /// Category owning a top-level directory
    pub fn from_dir_name(dir: &str) -> Self {
        match dir {
            "objects" => AssetCategory::Objects,
            "scripts" => AssetCategory::Scripts,
            "rooms" => AssetCategory::Rooms,
            "sprites" => AssetCategory::Sprites,
            _ => AssetCategory::Other,
        }
    }

    /// Lenient parse of a caller-supplied category filter
    ///
    /// Accepts `Objects`, `objects`, `object`, and the IDE's display names
    /// for the other resource kinds (`Sounds`, `Tile Sets`, ...), which all
    /// fall into [`AssetCategory::Other`].
    pub fn parse(name: &str) -> Option<Self> {
        AssetFilter::parse(name).map(|filter| filter.category)
    }
}

/// Resource directories of the `Other` category a filter can name
const RESOURCE_KINDS: [&str; 11] = [
    "notes",
    "tilesets",
    "timelines",
    "fonts",
    "sounds",
    "extensions",
    "shaders",
    "paths",
    "sequences",
    "animcurves",
    "particles",
];

/// Category filter for asset listings
///
/// `kind` narrows the `Other` category to one resource directory, so
/// `Sounds` lists only what lives under `sounds/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFilter {
    pub category: AssetCategory,
    pub kind: Option<String>,
}

impl AssetFilter {
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        let category = match normalized.as_str() {
            "objects" | "object" => AssetCategory::Objects,
            "scripts" | "script" => AssetCategory::Scripts,
            "rooms" | "room" => AssetCategory::Rooms,
            "sprites" | "sprite" => AssetCategory::Sprites,
            "other" | "others" => AssetCategory::Other,
            kind if RESOURCE_KINDS.contains(&kind) => {
                return Some(Self {
                    category: AssetCategory::Other,
                    kind: Some(kind.to_string()),
                });
            }
            _ => return None,
        };
        Some(category.into())
    }

    /// Whether an asset of `category` found under resource directory `kind`
    /// passes the filter
    pub fn matches(&self, category: AssetCategory, kind: Option<&str>) -> bool {
        if category != self.category {
            return false;
        }
        match (&self.kind, kind) {
            (None, _) => true,
            (Some(wanted), Some(kind)) => wanted.eq_ignore_ascii_case(kind),
            (Some(_), None) => false,
        }
    }
}

impl From<AssetCategory> for AssetFilter {
    fn from(category: AssetCategory) -> Self {
        Self {
            category,
            kind: None,
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssetCategory::Objects => "Objects",
            AssetCategory::Scripts => "Scripts",
            AssetCategory::Rooms => "Rooms",
            AssetCategory::Sprites => "Sprites",
            AssetCategory::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Fields shared by every asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHeader {
    pub name: String,
    pub category: AssetCategory,
    /// Asset folder, relative to the project root
    pub dir: PathBuf,
    /// Descriptor file, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<PathBuf>,
}

/// Object variable declared in the object editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectVariable {
    pub name: String,
    pub value: String,
    pub var_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAsset {
    pub header: AssetHeader,
    pub parent: Option<String>,
    pub sprite: Option<String>,
    pub mask_sprite: Option<String>,
    /// Event files, in canonical event order
    pub events: Vec<Event>,
    /// Number of entries in the descriptor's `eventList`
    pub declared_events: usize,
    /// Visibility and physics flags
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub variables: Vec<ObjectVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptAsset {
    pub header: AssetHeader,
    /// Source file, relative to the project root
    pub source: Option<PathBuf>,
}

/// Room layer classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Instances,
    Tiles,
    Background,
    /// Any other layer type, tagged with its descriptor type name
    Other(String),
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Instances => f.write_str("Instances"),
            LayerKind::Tiles => f.write_str("Tiles"),
            LayerKind::Background => f.write_str("Background"),
            LayerKind::Other(tag) => f.write_str(tag),
        }
    }
}

/// One object instance placed in a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance id (`inst_XXXXXXXX`)
    pub name: String,
    /// Object name the instance is created from
    pub object: String,
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    /// Instance creation code, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_code: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLayer {
    pub name: String,
    pub kind: LayerKind,
    pub depth: Option<i64>,
    pub visible: bool,
    /// Name of the enclosing group layer, if nested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAsset {
    pub header: AssetHeader,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub speed: u32,
    pub persistent: bool,
    /// Room creation code, relative to the project root
    pub creation_code: Option<PathBuf>,
    pub layers: Vec<RoomLayer>,
}

impl RoomAsset {
    pub fn instance_count(&self) -> usize {
        self.layers.iter().map(|l| l.instances.len()).sum()
    }
}

/// Sprite bounding-box mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BboxMode {
    Automatic,
    FullImage,
    Manual,
    Unknown(i64),
}

impl BboxMode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => BboxMode::Automatic,
            1 => BboxMode::FullImage,
            2 => BboxMode::Manual,
            n => BboxMode::Unknown(n),
        }
    }
}

impl std::fmt::Display for BboxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BboxMode::Automatic => f.write_str("Automatic"),
            BboxMode::FullImage => f.write_str("Full Image"),
            BboxMode::Manual => f.write_str("Manual"),
            BboxMode::Unknown(n) => write!(f, "Unknown ({})", n),
        }
    }
}

/// Unit of a sprite's playback speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    FramesPerSecond,
    FramesPerGameFrame,
}

impl std::fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedUnit::FramesPerSecond => f.write_str("frames per second"),
            SpeedUnit::FramesPerGameFrame => f.write_str("frames per game frame"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteAsset {
    pub header: AssetHeader,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub origin_x: i64,
    pub origin_y: i64,
    pub playback_speed: f64,
    pub speed_unit: SpeedUnit,
    pub looping: bool,
    pub bbox_mode: BboxMode,
    pub collision_kind: i64,
    pub texture_group: Option<String>,
    /// Frame image files, relative to the sprite folder
    pub frame_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherAsset {
    pub header: AssetHeader,
    /// Resource directory the asset was found in (`sounds`, `fonts`, ...)
    pub kind: String,
}

/// Any catalogued asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Asset {
    Object(ObjectAsset),
    Script(ScriptAsset),
    Room(RoomAsset),
    Sprite(SpriteAsset),
    Other(OtherAsset),
}

impl Asset {
    pub fn header(&self) -> &AssetHeader {
        match self {
            Asset::Object(a) => &a.header,
            Asset::Script(a) => &a.header,
            Asset::Room(a) => &a.header,
            Asset::Sprite(a) => &a.header,
            Asset::Other(a) => &a.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn category(&self) -> AssetCategory {
        self.header().category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(AssetCategory::parse("Objects"), Some(AssetCategory::Objects));
        assert_eq!(AssetCategory::parse("room"), Some(AssetCategory::Rooms));
        assert_eq!(AssetCategory::parse("Tile Sets"), Some(AssetCategory::Other));
        assert_eq!(AssetCategory::parse("shaders"), Some(AssetCategory::Other));
        assert_eq!(AssetCategory::parse("levels"), None);
    }

    #[test]
    fn test_filter_keeps_resource_kind() {
        let sounds = AssetFilter::parse("Sounds").unwrap();
        assert_eq!(sounds.category, AssetCategory::Other);
        assert_eq!(sounds.kind.as_deref(), Some("sounds"));
        assert!(sounds.matches(AssetCategory::Other, Some("sounds")));
        assert!(!sounds.matches(AssetCategory::Other, Some("fonts")));

        let tilesets = AssetFilter::parse("Tile Sets").unwrap();
        assert_eq!(tilesets.kind.as_deref(), Some("tilesets"));

        let other = AssetFilter::parse("Other").unwrap();
        assert!(other.kind.is_none());
        assert!(other.matches(AssetCategory::Other, Some("fonts")));
        assert!(!other.matches(AssetCategory::Rooms, None));

        assert_eq!(AssetFilter::parse("rooms"), Some(AssetCategory::Rooms.into()));
    }

    #[test]
    fn test_category_order() {
        let mut all = vec![
            AssetCategory::Other,
            AssetCategory::Sprites,
            AssetCategory::Objects,
            AssetCategory::Rooms,
            AssetCategory::Scripts,
        ];
        all.sort();
        assert_eq!(all, AssetCategory::ALL.to_vec());
    }
}
