//! Project layout resolution
//!
//! Finds the `.yyp` project descriptor at the root and the category
//! directories assets live in.

use gms2_core::{AssetCategory, Diagnostic, DiagnosticKind, Gms2Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::descriptor;

/// A top-level directory holding assets of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDir {
    pub category: AssetCategory,
    /// Directory name (`objects`, `sounds`, ...)
    pub dir_name: String,
    pub path: PathBuf,
}

/// Resolved project layout
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Canonical project root
    pub root: PathBuf,
    /// Project descriptor (`.yyp`)
    pub descriptor: PathBuf,
    /// Display name from the descriptor, or its file stem
    pub name: String,
    pub ide_version: Option<String>,
    /// Category directories that exist, recognized categories first
    pub categories: Vec<CategoryDir>,
    /// Problems found while resolving
    pub diagnostics: Vec<Diagnostic>,
}

impl ProjectLayout {
    /// Path relative to the project root
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Directories holding assets of a category
    pub fn dirs(&self, category: AssetCategory) -> impl Iterator<Item = &CategoryDir> {
        self.categories.iter().filter(move |d| d.category == category)
    }
}

/// Resolve the layout of the project rooted at `root`
pub fn resolve(root: &Path, config: &ParserConfig) -> Result<ProjectLayout> {
    let root = fs::canonicalize(root).map_err(|e| {
        Gms2Error::NotFound(format!("Project path not found: {} ({})", root.display(), e))
    })?;
    if !root.is_dir() {
        return Err(Gms2Error::NotFound(format!(
            "Project path is not a directory: {}",
            root.display()
        )));
    }

    let entries = list_dir(&root)?;
    let mut diagnostics = Vec::new();

    let descriptors: Vec<&PathBuf> = entries
        .iter()
        .filter(|p| p.is_file() && has_extension(p, &config.project_extension))
        .collect();

    let descriptor = match descriptors.as_slice() {
        [] => {
            return Err(Gms2Error::NotFound(format!(
                "No .{} file found in {}",
                config.project_extension,
                root.display()
            )));
        }
        [only] => (*only).clone(),
        [first, rest @ ..] => {
            let ignored: Vec<String> = rest.iter().map(|p| file_name(p)).collect();
            warn!(
                "Multiple project descriptors in {}, using {} (ignoring {})",
                root.display(),
                file_name(first),
                ignored.join(", ")
            );
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MultipleDescriptors,
                    format!("using {}, ignoring {}", file_name(first), ignored.join(", ")),
                )
                .with_path(file_name(first)),
            );
            (*first).clone()
        }
    };

    let (name, ide_version) = read_project_meta(&descriptor);

    let mut categories: Vec<CategoryDir> = entries
        .iter()
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let dir_name = file_name(p);
            if config.is_excluded(&dir_name) {
                debug!("Skipping excluded directory {}", dir_name);
                return None;
            }
            Some(CategoryDir {
                category: AssetCategory::from_dir_name(&dir_name),
                dir_name,
                path: p.clone(),
            })
        })
        .collect();
    categories.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.dir_name.cmp(&b.dir_name))
    });

    Ok(ProjectLayout {
        root,
        descriptor,
        name,
        ide_version,
        categories,
        diagnostics,
    })
}

/// Project name and IDE version, best-effort
fn read_project_meta(descriptor_path: &Path) -> (String, Option<String>) {
    let stem = descriptor_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match descriptor::read(descriptor_path) {
        Ok(value) => (
            descriptor::string_at(&value, &["name"]).unwrap_or(stem),
            descriptor::string_at(&value, &["MetaData", "IDEVersion"]),
        ),
        Err(e) => {
            warn!("Could not read project descriptor: {}", e);
            (stem, None)
        }
    }
}

/// Directory entries sorted by file name
pub(crate) fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Gms2Error::io(format!("reading directory '{}'", dir.display()), e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Gms2Error::io(format!("reading entry in directory '{}'", dir.display()), e)
        })?;
        paths.push(entry.path());
    }
    paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(paths)
}

pub(crate) fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Whether a link resolves to somewhere under the canonical `root`
pub(crate) fn links_inside(root: &Path, path: &Path) -> bool {
    fs::canonicalize(path).is_ok_and(|target| target.starts_with(root))
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(&dir.path().join("nope"), &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[test]
    fn test_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("game.yyp");
        fs::write(&file, "{}").unwrap();
        let err = resolve(&file, &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[test]
    fn test_no_project_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("objects")).unwrap();
        let err = resolve(dir.path(), &ParserConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No .yyp file"));
    }

    #[test]
    fn test_multiple_descriptors_pick_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zeta.yyp"), r#"{"name": "Zeta"}"#).unwrap();
        fs::write(dir.path().join("alpha.yyp"), r#"{"name": "Alpha",}"#).unwrap();

        let layout = resolve(dir.path(), &ParserConfig::default()).unwrap();
        assert_eq!(file_name(&layout.descriptor), "alpha.yyp");
        assert_eq!(layout.name, "Alpha");
        assert_eq!(layout.diagnostics.len(), 1);
        assert_eq!(layout.diagnostics[0].kind, DiagnosticKind::MultipleDescriptors);
    }

    #[test]
    fn test_categories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Game.yyp"),
            r#"{"name": "Game", "MetaData": {"IDEVersion": "2023.8.2.108",},}"#,
        )
        .unwrap();
        for d in ["sprites", "objects", "sounds", "options", ".git", "fonts"] {
            fs::create_dir(dir.path().join(d)).unwrap();
        }

        let layout = resolve(dir.path(), &ParserConfig::default()).unwrap();
        let names: Vec<&str> = layout.categories.iter().map(|c| c.dir_name.as_str()).collect();
        assert_eq!(names, vec!["objects", "sprites", "fonts", "sounds"]);
        assert_eq!(layout.dirs(AssetCategory::Other).count(), 2);
        assert_eq!(layout.dirs(AssetCategory::Rooms).count(), 0);
        assert_eq!(layout.ide_version.as_deref(), Some("2023.8.2.108"));
    }

    #[test]
    fn test_unparseable_project_descriptor_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("MyGame.yyp"), "garbage").unwrap();
        let layout = resolve(dir.path(), &ParserConfig::default()).unwrap();
        assert_eq!(layout.name, "MyGame");
        assert!(layout.ide_version.is_none());
    }
}
