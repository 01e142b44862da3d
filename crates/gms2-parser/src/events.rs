//! Object event file scanning

use gms2_core::{Event, EventType, Result};
use std::path::Path;
use tracing::debug;

use crate::config::ParserConfig;
use crate::layout::{self, ProjectLayout};

/// Event files in an object folder, in canonical event order
///
/// Source files whose name does not follow the `<Kind>_<n>` convention are
/// not events and are left out.
pub fn scan(layout: &ProjectLayout, object_dir: &Path, config: &ParserConfig) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for path in layout::list_dir(object_dir)? {
        if !path.is_file() || !layout::has_extension(&path, &config.source_extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match EventType::from_file_stem(stem) {
            Some(event_type) => events.push(Event {
                event_type,
                source: layout.relative(&path),
            }),
            None => debug!("Not an event file: {}", path.display()),
        }
    }

    events.sort_by(|a, b| a.event_type.cmp(&b.event_type));
    Ok(events)
}
