//! # Dedup Store
//!
//! Durable set of feed item ids that have already been announced.
//! The whole set is written as a JSON array on every `record`, in insertion order,
//! so reloading the file reproduces the same set. The set only grows.

use crate::domain::error::RelayError;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    order: Vec<String>,
    index: HashSet<String>,
    // set while the file lags behind the in-memory set
    dirty: bool,
}

impl DedupStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RelayError> {
        let path = path.into();
        let order = Self::load(&path)?;
        let mut store = Self {
            path,
            order: Vec::with_capacity(order.len()),
            index: HashSet::with_capacity(order.len()),
            dirty: false,
        };
        for id in order {
            store.insert(id);
        }
        tracing::debug!(path = %store.path.display(), count = store.len(), "Loaded seen items");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// True after a failed persist, until a later one succeeds.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persists only if an earlier write failed.
    pub fn flush(&mut self) -> Result<(), RelayError> {
        if self.dirty {
            self.persist()
        } else {
            Ok(())
        }
    }

    /// Adds `id` and persists the whole set.
    /// On a persist failure the in-memory set still holds `id` and the store
    /// is marked dirty; the next successful persist or `flush` writes it out.
    pub fn record(&mut self, id: &str) -> Result<(), RelayError> {
        if !self.contains(id) {
            self.insert(id.to_string());
        }
        self.persist()
    }

    /// Reads the id sequence stored at `path`.
    pub fn load(path: &Path) -> Result<Vec<String>, RelayError> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| RelayError::Parse {
                what: "seen item list",
                input: path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(RelayError::Persist {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes the current set, replacing the file.
    pub fn persist(&mut self) -> Result<(), RelayError> {
        let result = self.write();
        self.dirty = result.is_err();
        result
    }

    fn write(&self) -> Result<(), RelayError> {
        let to_err = |source: io::Error| RelayError::Persist {
            path: self.path.clone(),
            source,
        };
        let content = serde_json::to_string_pretty(&self.order).map_err(|e| to_err(io::Error::other(e)))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(to_err)?;
        }
        // write-then-rename so a crash never leaves a half-written list
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(to_err)?;
        fs::rename(&tmp, &self.path).map_err(to_err)
    }

    fn insert(&mut self, id: String) {
        if self.index.insert(id.clone()) {
            self.order.push(id);
        }
    }
}
