//! Rolling history of recent identifications, persisted as a JSON file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::AttributeRecord;
use crate::source_image::SourceImage;

/// Entries kept; adding beyond this evicts the oldest.
pub const MAX_ENTRIES: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch at creation, as a decimal string.
    pub id: String,
    /// Photo as a `data:` URI.
    pub image: String,
    pub result: AttributeRecord,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn source_image(&self) -> SourceImage {
        SourceImage::DataUri(self.image.clone())
    }
}

/// Most-recent-first list of at most [`MAX_ENTRIES`] entries.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Load the history at `path`. A missing file is an empty history, and so
    /// is an unreadable one, after a warning.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let entries = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Vec<HistoryEntry>>(&text) {
                Ok(mut entries) => {
                    entries.truncate(MAX_ENTRIES);
                    entries
                }
                Err(e) => {
                    log::warn!("Ignoring corrupt history file {}: {e}", path.display());
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(Error::History(format!("{}: {e}", path.display())));
            }
        };
        log::debug!("HISTORY opened {} ({} entries)", path.display(), entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Record a new identification at the front, evict past [`MAX_ENTRIES`], and persist.
    pub fn add(
        &mut self,
        image: &SourceImage,
        record: &AttributeRecord,
    ) -> Result<&HistoryEntry, Error> {
        let timestamp = Utc::now();
        let mut id = timestamp.timestamp_millis();
        // Two adds within the same millisecond still get distinct ids.
        while self.entries.iter().any(|e| e.id == id.to_string()) {
            id += 1;
        }

        let entry = HistoryEntry {
            id: id.to_string(),
            image: image.to_data_uri()?,
            result: record.clone(),
            timestamp,
        };
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.save()?;
        log::info!(
            "HISTORY added {:?} ({} of {MAX_ENTRIES} entries)",
            record.common_name,
            self.entries.len()
        );
        Ok(&self.entries[0])
    }

    /// Empty the history and delete its file.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.entries.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::History(format!("{}: {e}", self.path.display()))),
        }
    }

    fn save(&self) -> Result<(), Error> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::History(format!("{}: {e}", dir.display())))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::History(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| Error::History(format!("{}: {e}", self.path.display())))
    }
}

/// `$XDG_DATA_HOME/leafwise/history.json`, falling back to `~/.local/share`.
pub fn default_path() -> PathBuf {
    let data_home = std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    data_home.join("leafwise").join("history.json")
}
