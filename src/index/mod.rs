//! Progress index of harvested events
//!
//! The index maps `year -> event_id -> event_name` and records only events
//! whose output file has been committed. It is stored as pretty-printed
//! JSON with sorted keys so that it diffs cleanly between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing the index file
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to access index file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Index file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Completed events, grouped by year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressIndex {
    years: BTreeMap<String, BTreeMap<String, String>>,
}

impl ProgressIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the index, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No index at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(IndexError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let index: Self = serde_json::from_str(&content).map_err(|source| IndexError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            "Loaded index {} with {} events",
            path.display(),
            index.total_events()
        );
        Ok(index)
    }

    /// Writes the index through a temporary file and a rename
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let io_error = |source: std::io::Error| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let content = self.to_pretty_json()?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path).map_err(io_error)?;
        file.write_all(&content).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        drop(file);

        fs::rename(&tmp_path, path).map_err(io_error)?;
        Ok(())
    }

    /// Serializes with 4-space indentation and non-ASCII text kept as is
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, IndexError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        Ok(buffer)
    }

    /// True once the event has an entry, whatever its name
    pub fn is_complete(&self, year: &str, event_id: &str) -> bool {
        self.years
            .get(year)
            .is_some_and(|events| events.contains_key(event_id))
    }

    pub fn mark_complete(&mut self, year: &str, event_id: &str, event_name: &str) {
        self.years
            .entry(year.to_string())
            .or_default()
            .insert(event_id.to_string(), event_name.to_string());
    }

    pub fn event_name(&self, year: &str, event_id: &str) -> Option<&str> {
        self.years
            .get(year)
            .and_then(|events| events.get(event_id))
            .map(String::as_str)
    }

    /// Completed event ids of one year, sorted
    pub fn events(&self, year: &str) -> impl Iterator<Item = &str> {
        self.years
            .get(year)
            .into_iter()
            .flat_map(|events| events.keys().map(String::as_str))
    }

    pub fn total_events(&self) -> usize {
        self.years.values().map(BTreeMap::len).sum()
    }
}
