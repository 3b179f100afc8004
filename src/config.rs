//! Runtime configuration: where notes live and which (future) backend is configured.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{BlobStore, FileBlobStore, SqliteBlobStore};

/// Directory name searched for when no data directory is given.
pub const DATA_DIR: &str = ".ocean-notes";

/// Backend endpoints. Presence only flips [`BackendConfig::using_backend`];
/// no networking is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub api_base: String,
    pub backend_url: String,
    pub ws_url: String,
}

impl BackendConfig {
    /// Build from optional settings, trimming each value.
    pub fn new(
        api_base: Option<String>,
        backend_url: Option<String>,
        ws_url: Option<String>,
    ) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        Self {
            api_base: clean(api_base),
            backend_url: clean(backend_url),
            ws_url: clean(ws_url),
        }
    }

    pub fn using_backend(&self) -> bool {
        !self.api_base.is_empty() || !self.backend_url.is_empty() || !self.ws_url.is_empty()
    }

    /// First configured endpoint, preferring the API base.
    pub fn endpoint(&self) -> Option<&str> {
        [&self.api_base, &self.backend_url, &self.ws_url]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
    }
}

/// Which blob store holds the notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON file per key.
    #[default]
    File,
    /// Key/value table in `notes.db`.
    Sqlite,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::File => write!(f, "file"),
            StorageKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(StorageKind::File),
            "sqlite" | "db" => Ok(StorageKind::Sqlite),
            _ => Err(format!("Invalid storage kind: {}", s)),
        }
    }
}

/// Location and kind of the note blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub storage: StorageKind,
}

impl StoreConfig {
    /// Open the configured blob store. Nothing is created until the first write,
    /// except for SQLite which creates its database file on open.
    pub fn open(&self) -> Result<Box<dyn BlobStore>> {
        Ok(match self.storage {
            StorageKind::File => Box::new(FileBlobStore::new(&self.data_dir)),
            StorageKind::Sqlite => Box::new(SqliteBlobStore::open(&self.data_dir)?),
        })
    }
}

/// Find the data directory by looking for `.ocean-notes/` in `start` and its
/// ancestors, falling back to `start/.ocean-notes`.
pub fn find_data_dir(start: &Path) -> PathBuf {
    let mut current = start;
    loop {
        let candidate = current.join(DATA_DIR);
        if candidate.is_dir() {
            return candidate;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return start.join(DATA_DIR),
        }
    }
}
