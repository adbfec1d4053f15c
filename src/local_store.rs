//! Local key-value persistence.
//!
//! Each scope is one JSON object stored as `<root>/<scope>.json`. Writes go
//! through a temporary file and a rename so a crash never leaves a half
//! written scope behind. There is no locking: concurrent writers to the same
//! scope overwrite each other and the last rename wins.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Json(serde_json::Error),
    InvalidScope(String),
    InvalidKey(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Json(e) => write!(f, "Malformed stored data: {e}"),
            StoreError::InvalidScope(s) => write!(f, "Invalid storage scope '{s}'"),
            StoreError::InvalidKey(k) => write!(f, "Invalid storage key '{k}'"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

fn valid_scope(scope: &str) -> bool {
    !scope.is_empty()
        && scope
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !scope.starts_with('.')
}

impl LocalStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_path(&self, scope: &str) -> Result<PathBuf, StoreError> {
        if !valid_scope(scope) {
            return Err(StoreError::InvalidScope(scope.to_string()));
        }
        Ok(self.root.join(format!("{scope}.json")))
    }

    /// The whole scope as a JSON object; a missing scope is empty.
    pub fn read_scope(&self, scope: &str) -> Result<Map<String, Value>, StoreError> {
        let path = self.scope_path(scope)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_scope(&self, scope: &str, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let path = self.scope_path(scope)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, scope: &str, key: &str) -> Result<Option<T>, StoreError> {
        match self.read_scope(scope)?.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, scope: &str, key: &str, value: &T) -> Result<(), StoreError> {
        if key.trim().is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        let mut entries = self.read_scope(scope)?;
        entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.write_scope(scope, &entries)
    }

    /// Remove `key`; returns whether it was present.
    pub fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.read_scope(scope)?;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.write_scope(scope, &entries)?;
        Ok(true)
    }

    pub fn keys(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.read_scope(scope)?.keys().cloned().collect())
    }
}
