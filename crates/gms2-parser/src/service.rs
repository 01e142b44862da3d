//! Project query service
//!
//! [`ProjectService`] owns one project root and the catalog built from it.
//! The catalog is built on first use and replaced wholesale on rescan; a
//! query always sees one complete catalog.

use gms2_core::{
    Asset, AssetCategory, AssetFilter, AssetListing, DiagnosticKind, EventDetail, Gms2Error,
    InstanceDetail, ListedAsset, ObjectDetail, Result, RoomDetail, ScanReport, SourceText,
    SpriteDetail,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::ParserConfig;
use crate::export;
use crate::layout;
use crate::sources;

/// Query service for one GMS2 project
#[derive(Debug)]
pub struct ProjectService {
    root: PathBuf,
    config: ParserConfig,
    catalog: Option<Arc<Catalog>>,
}

impl ProjectService {
    /// Service over the project at `root`, with default configuration
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(root, ParserConfig::default())
    }

    pub fn with_config(root: impl AsRef<Path>, config: ParserConfig) -> Result<Self> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).map_err(|e| {
            Gms2Error::NotFound(format!("Project path not found: {} ({})", root.display(), e))
        })?;
        if !root.is_dir() {
            return Err(Gms2Error::NotFound(format!(
                "Project path is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            config,
            catalog: None,
        })
    }

    /// Canonical project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Current catalog, built on first use
    pub fn catalog(&mut self) -> Result<Arc<Catalog>> {
        match &self.catalog {
            Some(catalog) => Ok(Arc::clone(catalog)),
            None => self.rescan(),
        }
    }

    /// Build a fresh catalog and swap it in
    ///
    /// On failure the previous catalog stays in place.
    pub fn rescan(&mut self) -> Result<Arc<Catalog>> {
        info!("Scanning project at {}", self.root.display());
        let layout = layout::resolve(&self.root, &self.config)?;
        let catalog = Arc::new(Catalog::build(layout, &self.config)?);
        self.catalog = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Summary of the project; rebuilds when `refresh` is set or nothing is built yet
    pub fn scan_project(&mut self, refresh: bool) -> Result<ScanReport> {
        let catalog = if refresh { self.rescan()? } else { self.catalog()? };
        Ok(scan_report(&catalog))
    }

    /// Raw text of a source file
    ///
    /// Accepts a path relative to the root, an absolute path inside it, or
    /// an asset-qualified name such as `"obj_player / Create_0"`. An existing
    /// file at the literal path takes precedence over a qualified-name match.
    pub fn source_file(&mut self, requested: &str) -> Result<SourceText> {
        let path = match sources::resolve_path(&self.root, requested) {
            Ok(path) => path,
            Err(Gms2Error::NotFound(message)) => {
                let catalog = self.catalog()?;
                let key = sources::qualified_key(requested, &self.config);
                let entry = catalog
                    .source_files()
                    .iter()
                    .find(|entry| sources::qualified_key(&entry.display_name, &self.config) == key)
                    .ok_or(Gms2Error::NotFound(message))?;
                debug!("Resolved {} to {}", requested, entry.relative_path.display());
                sources::resolve_path(&self.root, &entry.relative_path.to_string_lossy())?
            }
            Err(e) => return Err(e),
        };

        sources::read_source(&self.root, &path, self.config.max_source_bytes)
    }

    pub fn object_info(&mut self, name: &str) -> Result<ObjectDetail> {
        let catalog = self.catalog()?;
        object_detail(&catalog, &self.config, name)
    }

    pub fn room_info(&mut self, name: &str) -> Result<RoomDetail> {
        let catalog = self.catalog()?;
        room_detail(&catalog, name)
    }

    pub fn sprite_info(&mut self, name: &str) -> Result<SpriteDetail> {
        let catalog = self.catalog()?;
        sprite_detail(&catalog, name)
    }

    /// Asset names grouped by category, optionally just one category or
    /// resource kind
    pub fn list_assets(&mut self, filter: Option<AssetFilter>) -> Result<AssetListing> {
        let catalog = self.catalog()?;
        Ok(asset_listing(&catalog, filter.as_ref()))
    }

    /// Full text export of the project
    pub fn export(&mut self) -> Result<String> {
        let catalog = self.catalog()?;
        Ok(export::document(&catalog, &self.config))
    }
}

pub fn scan_report(catalog: &Catalog) -> ScanReport {
    let layout = catalog.layout();
    ScanReport {
        project_name: layout.name.clone(),
        project_path: layout.root.clone(),
        descriptor: layout.relative(&layout.descriptor),
        ide_version: layout.ide_version.clone(),
        counts: catalog.counts(),
        source_files: catalog.source_files().to_vec(),
        diagnostics: catalog.diagnostics().to_vec(),
    }
}

/// `NotFound` for a name the catalog lacks, or the `ParseError` that kept it out
fn missing(catalog: &Catalog, category: AssetCategory, name: &str) -> Gms2Error {
    match catalog.skipped(category, name) {
        Some(diagnostic) if diagnostic.kind == DiagnosticKind::ParseError => Gms2Error::parse(
            diagnostic.path.clone().unwrap_or_default(),
            diagnostic.message.clone(),
        ),
        _ => {
            let kind = match category {
                AssetCategory::Objects => "Object",
                AssetCategory::Scripts => "Script",
                AssetCategory::Rooms => "Room",
                AssetCategory::Sprites => "Sprite",
                AssetCategory::Other => "Asset",
            };
            Gms2Error::NotFound(format!("{} '{}' not found", kind, name))
        }
    }
}

pub fn object_detail(catalog: &Catalog, config: &ParserConfig, name: &str) -> Result<ObjectDetail> {
    let object = catalog
        .object(name)
        .ok_or_else(|| missing(catalog, AssetCategory::Objects, name))?;
    let root = &catalog.layout().root;

    let events = object
        .events
        .iter()
        .map(|event| {
            let (source, source_error) =
                match sources::read_source(root, &root.join(&event.source), config.max_source_bytes) {
                    Ok(text) => (Some(text), None),
                    Err(e) => (None, Some(e.to_string())),
                };
            EventDetail {
                event_type: event.event_type.clone(),
                display_name: event.event_type.display_name(),
                source_path: event.source.clone(),
                source,
                source_error,
            }
        })
        .collect();

    let children = catalog
        .objects()
        .filter(|child| child.parent.as_deref() == Some(name))
        .map(|child| child.header.name.clone())
        .collect();

    Ok(ObjectDetail {
        parent: catalog.link(AssetCategory::Objects, object.parent.as_deref()),
        sprite: catalog.link(AssetCategory::Sprites, object.sprite.as_deref()),
        mask_sprite: catalog.link(AssetCategory::Sprites, object.mask_sprite.as_deref()),
        object: object.clone(),
        children,
        events,
    })
}

pub fn room_detail(catalog: &Catalog, name: &str) -> Result<RoomDetail> {
    let room = catalog
        .room(name)
        .ok_or_else(|| missing(catalog, AssetCategory::Rooms, name))?;

    let instances: Vec<InstanceDetail> = room
        .layers
        .iter()
        .flat_map(|layer| {
            layer.instances.iter().map(|instance| InstanceDetail {
                layer: layer.name.clone(),
                object: catalog.link(AssetCategory::Objects, Some(&instance.object)),
                instance: instance.clone(),
            })
        })
        .collect();

    let unresolved_objects: BTreeSet<String> = instances
        .iter()
        .filter(|i| i.object.is_unresolved())
        .filter_map(|i| i.object.name().map(str::to_string))
        .collect();

    Ok(RoomDetail {
        room: room.clone(),
        instances,
        unresolved_objects: unresolved_objects.into_iter().collect(),
    })
}

pub fn sprite_detail(catalog: &Catalog, name: &str) -> Result<SpriteDetail> {
    let sprite = catalog
        .sprite(name)
        .ok_or_else(|| missing(catalog, AssetCategory::Sprites, name))?;

    let used_by = catalog
        .objects()
        .filter(|o| o.sprite.as_deref() == Some(name) || o.mask_sprite.as_deref() == Some(name))
        .map(|o| o.header.name.clone())
        .collect();

    Ok(SpriteDetail {
        sprite: sprite.clone(),
        used_by,
    })
}

pub fn asset_listing(catalog: &Catalog, filter: Option<&AssetFilter>) -> AssetListing {
    let selected: Vec<AssetCategory> = match filter {
        Some(filter) => vec![filter.category],
        None => AssetCategory::ALL.to_vec(),
    };

    let categories: BTreeMap<AssetCategory, Vec<ListedAsset>> = selected
        .into_iter()
        .map(|category| {
            let assets = catalog
                .assets(category)
                .filter(|asset| filter.is_none_or(|f| f.matches(category, resource_kind(asset))))
                .map(|asset| listed(catalog, asset))
                .collect();
            (category, assets)
        })
        .collect();

    AssetListing { categories }
}

fn resource_kind(asset: &Asset) -> Option<&str> {
    match asset {
        Asset::Other(other) => Some(other.kind.as_str()),
        _ => None,
    }
}

fn listed(catalog: &Catalog, asset: &Asset) -> ListedAsset {
    let header = asset.header();
    let source_files = catalog
        .source_files()
        .iter()
        .filter(|entry| entry.relative_path.parent() == Some(header.dir.as_path()))
        .map(|entry| entry.display_name.clone())
        .collect();

    ListedAsset {
        name: header.name.clone(),
        kind: resource_kind(asset).map(str::to_string),
        source_files,
        has_descriptor: header.descriptor.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ProjectFixture, ROOM_LEVEL1, SPRITE_PLAYER};
    use gms2_core::{AssetLink, EventType};

    fn player_project() -> ProjectFixture {
        let fixture = ProjectFixture::new();
        fixture.object(
            "obj_player",
            r#""spriteId": {"name": "spr_player", "path": "sprites/spr_player/spr_player.yy",},"#,
            &[("Create_0", "hp = 3;\nspeed = 4;"), ("Step_0", "x += speed;")],
        );
        fixture.script("scr_util", None, "function scr_util() {\n    return 1;\n}");
        fixture
    }

    #[test]
    fn test_scan_player_scenario() {
        let fixture = player_project();
        let mut service = fixture.service();

        let report = service.scan_project(false).unwrap();
        assert_eq!(report.project_name, "Game");
        assert_eq!(report.count(AssetCategory::Objects), 1);
        assert_eq!(report.count(AssetCategory::Scripts), 1);
        assert_eq!(report.count(AssetCategory::Rooms), 0);
        assert_eq!(report.count(AssetCategory::Sprites), 0);
        assert_eq!(report.source_files.len(), 3);
        assert_eq!(report.descriptor, Path::new("Game.yyp"));
        assert_eq!(report.ide_version.as_deref(), Some("2023.8.2.108"));

        let detail = service.object_info("obj_player").unwrap();
        let kinds: Vec<&EventType> = detail.events.iter().map(|e| &e.event_type).collect();
        assert_eq!(kinds, vec![&EventType::Create, &EventType::Step]);
        let create = detail.events[0].source.as_ref().unwrap();
        assert_eq!(create.content, "hp = 3;\nspeed = 4;");
        assert_eq!(create.line_count, 2);
        assert_eq!(detail.sprite, AssetLink::Unresolved("spr_player".into()));
        assert_eq!(detail.parent, AssetLink::None);

        let err = service.object_info("missing_obj").unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[test]
    fn test_catalog_is_lazy_and_refreshable() {
        let fixture = player_project();
        let mut service = fixture.service();
        let first = service.catalog().unwrap();
        assert!(Arc::ptr_eq(&first, &service.catalog().unwrap()));

        fixture.object("obj_wall", "", &[]);
        assert_eq!(service.scan_project(false).unwrap().count(AssetCategory::Objects), 1);
        assert_eq!(service.scan_project(true).unwrap().count(AssetCategory::Objects), 2);

        // The catalog handed out earlier is untouched
        assert_eq!(first.count(AssetCategory::Objects), 1);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectService::new(dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[test]
    fn test_root_without_project_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = ProjectService::new(dir.path()).unwrap();
        let err = service.scan_project(false).unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[test]
    fn test_source_file_lookup_forms() {
        let fixture = player_project();
        let mut service = fixture.service();
        let absolute = service.root().join("objects/obj_player/Step_0.gml");

        for requested in [
            "objects/obj_player/Step_0.gml",
            "obj_player / Step_0",
            "obj_player/Step_0.gml",
            absolute.to_str().unwrap(),
        ] {
            let text = service.source_file(requested).unwrap();
            assert_eq!(text.content, "x += speed;", "{}", requested);
            assert_eq!(text.relative_path, Path::new("objects/obj_player/Step_0.gml"));
        }

        let script = service.source_file("scr_util / scr_util").unwrap();
        assert_eq!(script.line_count, 3);
    }

    #[test]
    fn test_source_file_literal_path_wins() {
        let fixture = ProjectFixture::new();
        fixture.write("x/y.gml", "// top level");
        fixture.write("scripts/x/y.gml", "// nested");
        let mut service = fixture.service();

        let text = service.source_file("x/y.gml").unwrap();
        assert_eq!(text.content, "// top level");
        assert_eq!(text.relative_path, Path::new("x/y.gml"));

        let text = service.source_file("x / y").unwrap();
        assert_eq!(text.relative_path, Path::new("scripts/x/y.gml"));
    }

    #[test]
    fn test_source_file_rejects_escape() {
        let fixture = player_project();
        let mut service = fixture.service();

        let err = service.source_file("../outside.gml").unwrap_err();
        assert!(matches!(err, Gms2Error::InvalidPath(_)));
        let err = service.source_file("objects/../../../etc/passwd").unwrap_err();
        assert!(matches!(err, Gms2Error::InvalidPath(_)));
        let err = service.source_file("obj_player / Draw_0").unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[test]
    fn test_source_file_is_not_cached() {
        let fixture = player_project();
        let mut service = fixture.service();
        assert_eq!(service.source_file("obj_player / Step_0").unwrap().content, "x += speed;");

        fixture.write("objects/obj_player/Step_0.gml", "x -= speed;");
        assert_eq!(service.source_file("obj_player / Step_0").unwrap().content, "x -= speed;");
    }

    #[test]
    fn test_room_with_unresolved_object() {
        let fixture = ProjectFixture::new();
        fixture.room("rm_level1", ROOM_LEVEL1);
        let mut service = fixture.service();

        let detail = service.room_info("rm_level1").unwrap();
        assert_eq!(detail.instances.len(), 1);
        assert_eq!(detail.instances[0].layer, "Instances");
        assert_eq!(detail.instances[0].object, AssetLink::Unresolved("obj_enemy".into()));
        assert_eq!(detail.unresolved_objects, vec!["obj_enemy".to_string()]);

        fixture.object("obj_enemy", "", &[]);
        service.rescan().unwrap();
        let detail = service.room_info("rm_level1").unwrap();
        assert_eq!(detail.instances[0].object, AssetLink::Resolved("obj_enemy".into()));
        assert!(detail.unresolved_objects.is_empty());
    }

    #[test]
    fn test_object_hierarchy_and_sprite_users() {
        let fixture = ProjectFixture::new();
        fixture.sprite("spr_player", SPRITE_PLAYER, 2);
        fixture.object("obj_base", "", &[]);
        fixture.object(
            "obj_player",
            r#""parentObjectId": {"name": "obj_base",}, "spriteId": {"name": "spr_player",},"#,
            &[],
        );
        fixture.object(
            "obj_ghost",
            r#""parentObjectId": {"name": "obj_base",}, "spriteMaskId": {"name": "spr_player",},"#,
            &[],
        );
        let mut service = fixture.service();

        let base = service.object_info("obj_base").unwrap();
        assert_eq!(base.children, vec!["obj_ghost".to_string(), "obj_player".to_string()]);

        let player = service.object_info("obj_player").unwrap();
        assert_eq!(player.parent, AssetLink::Resolved("obj_base".into()));
        assert_eq!(player.sprite, AssetLink::Resolved("spr_player".into()));

        let sprite = service.sprite_info("spr_player").unwrap();
        assert_eq!(sprite.used_by, vec!["obj_ghost".to_string(), "obj_player".to_string()]);
        assert!(matches!(
            service.sprite_info("spr_none").unwrap_err(),
            Gms2Error::NotFound(_)
        ));
    }

    #[test]
    fn test_unparseable_object_reports_parse_error() {
        let fixture = ProjectFixture::new();
        fixture.write("objects/obj_broken/obj_broken.yy", "{{{");
        let mut service = fixture.service();

        let err = service.object_info("obj_broken").unwrap_err();
        assert!(matches!(err, Gms2Error::ParseError { .. }));
        let report = service.scan_project(false).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_listed_names_all_resolve() {
        let fixture = player_project();
        fixture.room("rm_level1", ROOM_LEVEL1);
        fixture.sprite("spr_player", SPRITE_PLAYER, 2);
        fixture.write("sounds/snd_jump/snd_jump.yy", r#"{"name": "snd_jump"}"#);
        let mut service = fixture.service();

        let listing = service.list_assets(None).unwrap();
        for name in listing.names(AssetCategory::Objects) {
            service.object_info(name).unwrap();
        }
        for name in listing.names(AssetCategory::Rooms) {
            service.room_info(name).unwrap();
        }
        for name in listing.names(AssetCategory::Sprites) {
            service.sprite_info(name).unwrap();
        }
        let catalog = service.catalog().unwrap();
        for category in AssetCategory::ALL {
            for name in listing.names(category) {
                assert!(catalog.contains(category, name), "{} {}", category, name);
            }
        }

        let player = &listing.categories[&AssetCategory::Objects][0];
        assert_eq!(player.source_files, vec!["obj_player / Create_0", "obj_player / Step_0"]);
        assert!(player.has_descriptor);
        let script = &listing.categories[&AssetCategory::Scripts][0];
        assert!(!script.has_descriptor);
        assert_eq!(listing.categories[&AssetCategory::Other][0].kind.as_deref(), Some("sounds"));
    }

    #[test]
    fn test_list_single_category() {
        let fixture = player_project();
        let mut service = fixture.service();

        let rooms = service.list_assets(Some(AssetCategory::Rooms.into())).unwrap();
        assert_eq!(rooms.categories.len(), 1);
        assert!(rooms.is_empty());

        let scripts = service.list_assets(Some(AssetCategory::Scripts.into())).unwrap();
        assert_eq!(scripts.names(AssetCategory::Scripts), vec!["scr_util"]);
        assert!(scripts.names(AssetCategory::Objects).is_empty());
    }

    #[test]
    fn test_list_single_resource_kind() {
        let fixture = player_project();
        fixture.write("sounds/snd_jump/snd_jump.yy", r#"{"name": "snd_jump"}"#);
        fixture.write("fonts/fnt_main/fnt_main.yy", r#"{"name": "fnt_main"}"#);
        let mut service = fixture.service();

        let sounds = service.list_assets(AssetFilter::parse("Sounds")).unwrap();
        assert_eq!(sounds.names(AssetCategory::Other), vec!["snd_jump"]);

        let fonts = service.list_assets(AssetFilter::parse("fonts")).unwrap();
        assert_eq!(fonts.names(AssetCategory::Other), vec!["fnt_main"]);

        let other = service.list_assets(AssetFilter::parse("Other")).unwrap();
        assert_eq!(other.names(AssetCategory::Other), vec!["fnt_main", "snd_jump"]);

        let timelines = service.list_assets(AssetFilter::parse("Timelines")).unwrap();
        assert!(timelines.is_empty());
    }
}
