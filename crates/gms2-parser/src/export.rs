//! Whole-project text export
//!
//! The document only depends on the files under the root: no timestamps, no
//! absolute paths, categories in declared order and assets by name. Two
//! exports of an unchanged tree are byte-identical, which the SHA-256
//! fingerprint makes easy to check.

use gms2_core::{AssetCategory, Gms2Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::ParserConfig;
use crate::render::{self, RULE, display_path, heading};
use crate::service::{asset_listing, object_detail, room_detail, sprite_detail};
use crate::sources;

/// Where an export was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedExport {
    pub path: PathBuf,
    /// Document length in characters
    pub characters: usize,
    /// SHA-256 of the document, hex encoded
    pub sha256: String,
}

/// SHA-256 hex digest of a document
pub fn fingerprint(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    hex::encode(hasher.finalize())
}

/// Default file name for a project's export
pub fn default_file_name(project_name: &str) -> String {
    let safe: String = project_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}_export.txt", safe)
}

pub fn write_export(document: &str, path: &Path) -> Result<SavedExport> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Gms2Error::io(format!("creating '{}'", parent.display()), e))?;
    }
    fs::write(path, document)
        .map_err(|e| Gms2Error::io(format!("writing export to '{}'", path.display()), e))?;

    let saved = SavedExport {
        path: path.to_path_buf(),
        characters: document.chars().count(),
        sha256: fingerprint(document),
    };
    info!(
        "Exported {} characters to {} (sha256 {})",
        saved.characters,
        saved.path.display(),
        saved.sha256
    );
    Ok(saved)
}

/// Build the export document
pub fn document(catalog: &Catalog, config: &ParserConfig) -> String {
    let layout = catalog.layout();
    let mut out = format!("GMS2 Project Export: {}\n{}\n", layout.name, RULE);
    out.push_str(&format!("Descriptor: {}\n", display_path(&layout.relative(&layout.descriptor))));
    if let Some(version) = &layout.ide_version {
        out.push_str(&format!("IDE version: {}\n", version));
    }

    out.push('\n');
    out.push_str(&heading("Project summary"));
    out.push_str(&render::counts(catalog.counts().into_iter()));
    out.push_str(&format!("Source files: {}\n", catalog.source_files().len()));

    out.push('\n');
    out.push_str(&heading("Assets"));
    out.push_str(&render::asset_listing(&asset_listing(catalog, None)));

    section(&mut out, "Objects", catalog, AssetCategory::Objects, |name| {
        object_detail(catalog, config, name).map(|detail| render::object(&detail))
    });
    section(&mut out, "Scripts", catalog, AssetCategory::Scripts, |name| {
        Ok(script(catalog, config, name))
    });
    section(&mut out, "Rooms", catalog, AssetCategory::Rooms, |name| {
        room_detail(catalog, name).map(|detail| render::room(&detail))
    });
    section(&mut out, "Sprites", catalog, AssetCategory::Sprites, |name| {
        sprite_detail(catalog, name).map(|detail| render::sprite(&detail))
    });

    out.push_str(&render::diagnostics(catalog.diagnostics()));
    out.push_str(&format!("\n{}\nEnd of export\n", RULE));
    out
}

fn section(
    out: &mut String,
    title: &str,
    catalog: &Catalog,
    category: AssetCategory,
    entry: impl Fn(&str) -> Result<String>,
) {
    if catalog.count(category) == 0 {
        return;
    }
    out.push('\n');
    out.push_str(&heading(title));
    for asset in catalog.assets(category) {
        out.push('\n');
        match entry(asset.name()) {
            Ok(text) => out.push_str(&text),
            Err(e) => {
                warn!("Export placeholder for {}: {}", asset.name(), e);
                out.push_str(&format!("{}: [unavailable: {}]\n", asset.name(), e));
            }
        }
    }
}

fn script(catalog: &Catalog, config: &ParserConfig, name: &str) -> String {
    let mut out = format!("Script: {}\n", name);
    let Some(path) = catalog.script(name).and_then(|s| s.source.as_ref()) else {
        out.push_str("[no source file]\n");
        return out;
    };

    let root = &catalog.layout().root;
    match sources::read_source(root, &root.join(path), config.max_source_bytes) {
        Ok(text) => out.push_str(&render::source(&text)),
        Err(e) => {
            warn!("Export placeholder for {}: {}", display_path(path), e);
            out.push_str(&format!(
                "// {}\n[source unavailable: {}]\n",
                display_path(path),
                e
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ProjectFixture, ROOM_LEVEL1, SPRITE_PLAYER};

    fn full_project() -> ProjectFixture {
        let fixture = ProjectFixture::new();
        fixture.object(
            "obj_player",
            r#""spriteId": {"name": "spr_player",}, "properties": [{"varType": 1, "value": "3", "name": "lives",},],"#,
            &[("Step_0", "x += 1;"), ("Create_0", "hp = 3;")],
        );
        fixture.object("obj_wall", r#""solid": true,"#, &[]);
        fixture.script("scr_util", None, "function scr_util() {\n    return 1;\n}\n");
        fixture.room("rm_level1", ROOM_LEVEL1);
        fixture.sprite("spr_player", SPRITE_PLAYER, 2);
        fixture.write("objects/obj_broken/obj_broken.yy", "not json");
        fixture
    }

    #[test]
    fn test_export_is_deterministic() {
        let fixture = full_project();

        let first = fixture.service().export().unwrap();
        let second = fixture.service().export().unwrap();
        assert_eq!(first, second);
        assert_eq!(fingerprint(&first), fingerprint(&second));

        let root = fixture.path().canonicalize().unwrap();
        assert!(!first.contains(root.to_str().unwrap()));
    }

    #[test]
    fn test_export_contents_and_order() {
        let fixture = full_project();
        let doc = fixture.service().export().unwrap();

        assert!(doc.starts_with("GMS2 Project Export: Game\n"));
        assert!(doc.contains("Objects: 2\nScripts: 1\nRooms: 1\nSprites: 1\nOther: 0\n"));
        assert!(doc.contains("    lives (Integer) = 3\n"));
        assert!(doc.contains("// scripts/scr_util/scr_util.gml (3 lines)\nfunction scr_util() {\n"));
        assert!(doc.contains("inst_enemy1 : obj_enemy (unresolved)"));
        assert!(doc.contains("Sprite: spr_player\n  Size: 32 x 48\n"));
        assert!(doc.contains("[ParseError] Objects/obj_broken"));

        let order: Vec<usize> = ["\nObjects\n", "\nScripts\n", "\nRooms\n", "\nSprites\n", "Diagnostics (1)"]
            .iter()
            .map(|marker| doc.find(marker).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        let create = doc.find("--- Create (").unwrap();
        let step = doc.find("--- Step (").unwrap();
        assert!(create < step);
        assert!(doc.find("Object: obj_player").unwrap() < doc.find("Object: obj_wall").unwrap());
    }

    #[test]
    fn test_vanished_sources_become_placeholders() {
        let fixture = ProjectFixture::new();
        fixture.object("obj_player", "", &[("Create_0", "hp = 3;")]);
        fixture.script("scr_gone", None, "x = 1;");
        let mut service = fixture.service();
        service.catalog().unwrap();

        fs::remove_file(fixture.path().join("objects/obj_player/Create_0.gml")).unwrap();
        fs::remove_file(fixture.path().join("scripts/scr_gone/scr_gone.gml")).unwrap();

        let doc = service.export().unwrap();
        assert!(doc.contains("    --- Create (objects/obj_player/Create_0.gml) ---\n    [source unavailable: "));
        assert!(doc.contains("Script: scr_gone\n// scripts/scr_gone/scr_gone.gml\n[source unavailable: "));
        assert!(doc.ends_with("End of export\n"));
    }

    #[test]
    fn test_write_export() {
        let fixture = full_project();
        let doc = fixture.service().export().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("nested/Game_export.txt");

        let saved = write_export(&doc, &path).unwrap();
        assert_eq!(saved.characters, doc.chars().count());
        assert_eq!(saved.sha256, fingerprint(&doc));
        assert_eq!(saved.sha256.len(), 64);
        assert_eq!(fs::read_to_string(&path).unwrap(), doc);
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(default_file_name("Game"), "Game_export.txt");
        assert_eq!(default_file_name("My Game: 2"), "My_Game__2_export.txt");
    }
}
