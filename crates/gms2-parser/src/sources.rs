//! Source file discovery and access
//!
//! Source text is never cached; every read goes to disk, capped at
//! [`ParserConfig::max_source_bytes`].

use gms2_core::{Gms2Error, Result, SourceFileEntry, SourceText};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::layout::{self, ProjectLayout};

/// Every source file under the project root, sorted by relative path
pub fn discover(layout: &ProjectLayout, config: &ParserConfig) -> Result<Vec<SourceFileEntry>> {
    let mut pending: VecDeque<PathBuf> = VecDeque::from([layout.root.clone()]);
    let mut files = Vec::new();

    while let Some(dir) = pending.pop_front() {
        let entries = match layout::list_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir == layout.root => return Err(e),
            Err(e) => {
                warn!("Skipping unreadable directory: {}", e);
                continue;
            }
        };

        for path in entries {
            if layout::is_symlink(&path) && !layout::links_inside(&layout.root, &path) {
                debug!("Skipping link to outside the project: {}", layout.relative(&path).display());
                continue;
            }
            if path.is_dir() {
                // Directory links inside the root would revisit the same tree
                if layout::is_symlink(&path) {
                    debug!("Skipping directory link: {}", layout.relative(&path).display());
                    continue;
                }
                let top_level = dir == layout.root;
                if top_level && config.is_excluded(&layout::file_name(&path)) {
                    continue;
                }
                pending.push_back(path);
            } else if layout::has_extension(&path, &config.source_extension) {
                files.push(entry_for(layout, config, &path));
            }
        }
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn entry_for(layout: &ProjectLayout, config: &ParserConfig, path: &Path) -> SourceFileEntry {
    let parent = path.parent().unwrap_or(&layout.root);
    let asset_name = layout::file_name(parent);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let descriptor = parent.join(format!("{}.{}", asset_name, config.descriptor_extension));
    let asset_descriptor = descriptor.is_file().then(|| layout.relative(&descriptor));

    SourceFileEntry {
        display_name: format!("{} / {}", asset_name, stem),
        relative_path: layout.relative(path),
        asset_descriptor,
    }
}

/// Comparison key for asset-qualified names
///
/// `"obj_player / Create_0"`, `"obj_player/Create_0.gml"` and
/// `"obj_player\Create_0"` all compare equal.
pub fn qualified_key(name: &str, config: &ParserConfig) -> String {
    let joined: String = name
        .split(['/', '\\'])
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("/");
    let suffix = format!(".{}", config.source_extension);
    joined
        .strip_suffix(suffix.as_str())
        .map(str::to_string)
        .unwrap_or(joined)
}

/// Resolve a caller-supplied path to an existing file inside the root
///
/// Fails with `InvalidPath` when the path escapes the root, lexically or
/// through a symlink, and with `NotFound` when no such file exists.
pub fn resolve_path(root: &Path, requested: &str) -> Result<PathBuf> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(Gms2Error::InvalidPath("empty file path".into()));
    }

    let candidate = Path::new(requested);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    let normalized = normalize_lexically(&joined);

    if !normalized.starts_with(root) {
        let canonical_inside = fs::canonicalize(&normalized)
            .map(|p| p.starts_with(root))
            .unwrap_or(false);
        if !canonical_inside {
            return Err(Gms2Error::InvalidPath(format!(
                "'{}' resolves outside the project root",
                requested
            )));
        }
    }

    let canonical = match fs::canonicalize(&normalized) {
        Ok(path) => path,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Gms2Error::NotFound(format!("File not found: {}", requested)));
        }
        Err(e) => return Err(Gms2Error::io(format!("resolving '{}'", requested), e)),
    };
    if !canonical.starts_with(root) {
        return Err(Gms2Error::InvalidPath(format!(
            "'{}' links outside the project root",
            requested
        )));
    }
    if !canonical.is_file() {
        return Err(Gms2Error::NotFound(format!("Not a file: {}", requested)));
    }

    Ok(canonical)
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Read a source file inside the root, up to `max_bytes`
pub fn read_source(root: &Path, path: &Path, max_bytes: u64) -> Result<SourceText> {
    let relative_path = path
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf());
    let shown = relative_path.display();

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Gms2Error::NotFound(format!("File not found: {}", shown)),
        _ => Gms2Error::io(format!("opening '{}'", shown), e),
    })?;
    let size = file
        .metadata()
        .map_err(|e| Gms2Error::io(format!("reading metadata of '{}'", shown), e))?
        .len();

    let mut bytes = Vec::new();
    file.take(max_bytes)
        .read_to_end(&mut bytes)
        .map_err(|e| Gms2Error::io(format!("reading '{}'", shown), e))?;

    let truncated = size > max_bytes;
    let content = decode(bytes, truncated);

    Ok(SourceText {
        line_count: content.lines().count(),
        content,
        relative_path,
        truncated,
    })
}

/// Decode as UTF-8; a character split by truncation is dropped
fn decode(bytes: Vec<u8>, truncated: bool) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let error = e.utf8_error();
            let mut bytes = e.into_bytes();
            if truncated && error.error_len().is_none() {
                bytes.truncate(error.valid_up_to());
            }
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ProjectFixture;

    #[test]
    fn test_discover_sources() {
        let fixture = ProjectFixture::new();
        fixture.object("obj_player", "", &[("Create_0", "x = 1;"), ("Step_0", "x++;")]);
        fixture.script("scr_util", None, "function scr_util() {}");
        fixture.write("options/main/options_main.gml", "// ignored");
        fixture.write("notes/readme/readme.txt", "text");

        let layout = fixture.layout();
        let files = discover(&layout, &ParserConfig::default()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["obj_player / Create_0", "obj_player / Step_0", "scr_util / scr_util"]
        );
        assert_eq!(
            files[0].asset_descriptor.as_deref(),
            Some(Path::new("objects/obj_player/obj_player.yy"))
        );
        assert!(files[2].asset_descriptor.is_none());
    }

    #[test]
    fn test_qualified_key() {
        let config = ParserConfig::default();
        assert_eq!(qualified_key("obj_player / Create_0", &config), "obj_player/Create_0");
        assert_eq!(qualified_key("obj_player/Create_0.gml", &config), "obj_player/Create_0");
        assert_eq!(qualified_key("obj_player\\Create_0", &config), "obj_player/Create_0");
    }

    #[test]
    fn test_resolve_inside_root() {
        let fixture = ProjectFixture::new();
        fixture.script("scr_util", None, "x");
        let root = fixture.layout().root;

        let path = resolve_path(&root, "scripts/scr_util/scr_util.gml").unwrap();
        assert!(path.ends_with("scr_util.gml"));

        let dotted = resolve_path(&root, "scripts/../scripts/./scr_util/scr_util.gml").unwrap();
        assert_eq!(dotted, path);

        let absolute = resolve_path(&root, path.to_str().unwrap()).unwrap();
        assert_eq!(absolute, path);
    }

    #[test]
    fn test_traversal_is_rejected() {
        let fixture = ProjectFixture::new();
        let root = fixture.layout().root;

        for bad in ["../outside.gml", "scripts/../../etc/passwd", "/etc/passwd"] {
            let err = resolve_path(&root, bad).unwrap_err();
            assert!(matches!(err, Gms2Error::InvalidPath(_)), "{}: {:?}", bad, err);
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let fixture = ProjectFixture::new();
        let root = fixture.layout().root;
        let err = resolve_path(&root, "scripts/nope.gml").unwrap_err();
        assert!(matches!(err, Gms2Error::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.gml"), "secret").unwrap();

        let fixture = ProjectFixture::new();
        let root = fixture.layout().root;
        std::os::unix::fs::symlink(outside.path().join("secret.gml"), root.join("link.gml"))
            .unwrap();

        let err = resolve_path(&root, "link.gml").unwrap_err();
        assert!(matches!(err, Gms2Error::InvalidPath(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_directory_links() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("shared.gml"), "// shared").unwrap();

        let fixture = ProjectFixture::new();
        fixture.script("scr_util", None, "function scr_util() {}");
        let layout = fixture.layout();
        let scripts = layout.root.join("scripts");
        std::os::unix::fs::symlink(outside.path(), scripts.join("ext")).unwrap();
        std::os::unix::fs::symlink(&layout.root, scripts.join("loop")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("shared.gml"),
            scripts.join("scr_util").join("linked.gml"),
        )
        .unwrap();

        let files = discover(&layout, &ParserConfig::default()).unwrap();
        let paths: Vec<&Path> = files.iter().map(|f| f.relative_path.as_path()).collect();
        assert_eq!(paths, vec![Path::new("scripts/scr_util/scr_util.gml")]);

        // Everything discovered can be served
        for file in &files {
            let path = resolve_path(&layout.root, &file.relative_path.to_string_lossy()).unwrap();
            read_source(&layout.root, &path, 1024).unwrap();
        }
    }

    #[test]
    fn test_read_source_cap() {
        let fixture = ProjectFixture::new();
        fixture.write("scripts/scr_big/scr_big.gml", "line one\nline two\nline three\n");
        let root = fixture.layout().root;
        let path = root.join("scripts/scr_big/scr_big.gml");

        let full = read_source(&root, &path, 1024).unwrap();
        assert_eq!(full.line_count, 3);
        assert!(!full.truncated);
        assert_eq!(full.relative_path, Path::new("scripts/scr_big/scr_big.gml"));

        let capped = read_source(&root, &path, 8).unwrap();
        assert_eq!(capped.content, "line one");
        assert!(capped.truncated);
    }

    #[test]
    fn test_truncation_keeps_char_boundary() {
        let text = decode("añb".as_bytes()[..2].to_vec(), true);
        assert_eq!(text, "a");
    }
}
