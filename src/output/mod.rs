//! Output module for harvested records
//!
//! This module handles:
//! - The `RecordSink` interface records are emitted into
//! - Per-event JSON array files with commit-on-finish semantics
//! - The on-disk layout of event files

mod json;
mod traits;

pub use json::JsonArraySink;
pub use traits::{OutputError, OutputResult, RecordSink};

use std::path::{Path, PathBuf};

/// Location of one event's output file: `<events_dir>/<year>/<event_id>.json`
///
/// Path separators and other characters unsafe in file names are replaced
/// with `_` in both components.
pub fn event_output_path(events_dir: &Path, year: &str, event_id: &str) -> PathBuf {
    events_dir
        .join(sanitize_component(year))
        .join(format!("{}.json", sanitize_component(event_id)))
}

fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
