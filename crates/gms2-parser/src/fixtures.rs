//! On-disk project fixtures for tests

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::ParserConfig;
use crate::layout::{self, ProjectLayout};
use crate::service::ProjectService;

/// Room with one enemy instance, a group layer, and a background
pub const ROOM_LEVEL1: &str = r#"{
  "$GMRoom": "",
  "resourceType": "GMRoom",
  "name": "rm_level1",
  "isPersistent": false,
  "layers": [
    {"resourceType": "GMRInstanceLayer", "name": "Instances", "depth": 0, "visible": true,
     "instances": [
       {"resourceType": "GMRInstance", "name": "inst_enemy1",
        "objectId": {"name": "obj_enemy", "path": "objects/obj_enemy/obj_enemy.yy",},
        "x": 64.0, "y": 128.0, "scaleX": 2.0, "scaleY": 1.0, "rotation": 0.0,},
     ],
     "layers": [],},
    {"resourceType": "GMRLayer", "name": "Decor", "depth": 100, "visible": true,
     "layers": [
       {"resourceType": "GMRTileLayer", "name": "Tiles_1", "depth": 200, "visible": false, "layers": [],},
     ],},
    {"resourceType": "GMRBackgroundLayer", "name": "Background", "depth": 300, "visible": true, "layers": [],},
  ],
  "roomSettings": {"inheritRoomSettings": false, "Width": 1024, "Height": 768, "persistent": false,},
}"#;

/// Two-frame sprite with a manual mask
pub const SPRITE_PLAYER: &str = r#"{
  "resourceType": "GMSprite",
  "name": "spr_player",
  "bboxMode": 2,
  "collisionKind": 1,
  "width": 32,
  "height": 48,
  "textureGroupId": {"name": "Default", "path": "texturegroups/Default",},
  "frames": [
    {"resourceType": "GMSpriteFrame", "name": "a1b2",},
    {"resourceType": "GMSpriteFrame", "name": "c3d4",},
  ],
  "sequence": {
    "playback": 0,
    "playbackSpeed": 12.0,
    "playbackSpeedType": 0,
    "xorigin": 16,
    "yorigin": 47,
  },
}"#;

/// A throwaway project directory with a `Game.yyp` at its root
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Game.yyp"),
            r#"{"resourceType": "GMProject", "name": "Game", "MetaData": {"IDEVersion": "2023.8.2.108",},}"#,
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Object descriptor plus event files; `members` is spliced into the descriptor
    pub fn object(&self, name: &str, members: &str, events: &[(&str, &str)]) {
        self.write(
            &format!("objects/{0}/{0}.yy", name),
            &format!(
                "{{\n  \"resourceType\": \"GMObject\",\n  \"name\": \"{}\",\n  {}\n  \"eventList\": [],\n}}",
                name, members
            ),
        );
        for (stem, code) in events {
            self.write(&format!("objects/{}/{}.gml", name, stem), code);
        }
    }

    pub fn script(&self, name: &str, descriptor: Option<&str>, source: &str) {
        if let Some(descriptor) = descriptor {
            self.write(&format!("scripts/{0}/{0}.yy", name), descriptor);
        }
        self.write(&format!("scripts/{0}/{0}.gml", name), source);
    }

    pub fn room(&self, name: &str, descriptor: &str) {
        self.write(&format!("rooms/{0}/{0}.yy", name), descriptor);
    }

    /// Sprite descriptor plus `frames` placeholder images
    pub fn sprite(&self, name: &str, descriptor: &str, frames: usize) {
        self.write(&format!("sprites/{0}/{0}.yy", name), descriptor);
        for i in 0..frames {
            self.write(&format!("sprites/{}/frame{}.png", name, i), "PNG");
        }
    }

    pub fn layout(&self) -> ProjectLayout {
        layout::resolve(self.dir.path(), &ParserConfig::default()).unwrap()
    }

    pub fn service(&self) -> ProjectService {
        ProjectService::new(self.dir.path()).unwrap()
    }
}
