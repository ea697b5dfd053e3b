//! Load cache for normalised count tables.
//!
//! Keyed by (path, expected shape). Entries live until `invalidate`,
//! `invalidate_path` or `clear` is called; file modification times are never
//! consulted, so an edited file keeps serving its old contents until the
//! owner invalidates it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use trendscope_common::Result;

use crate::models::{CanonicalTable, ExpectedShape};
use crate::normalise::normalize;
use crate::table::RawTable;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub shape: ExpectedShape,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<CanonicalTable>,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `(path, shape)`, reading and normalising
    /// the file on a miss. Failed loads are not cached.
    pub fn get_or_load(&mut self, path: &Path, shape: ExpectedShape) -> Result<Arc<CanonicalTable>> {
        self.get_or_load_with(path, shape, |path, shape| {
            let raw = RawTable::from_path(path)?;
            normalize(&raw, shape)
        })
    }

    /// Same as `get_or_load` with a caller-supplied loader.
    pub fn get_or_load_with<F>(
        &mut self,
        path: &Path,
        shape: ExpectedShape,
        load: F,
    ) -> Result<Arc<CanonicalTable>>
    where
        F: FnOnce(&Path, ExpectedShape) -> Result<CanonicalTable>,
    {
        let key = CacheKey {
            path: path.to_path_buf(),
            shape,
        };

        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            debug!(path = %path.display(), ?shape, "Table cache hit");
            return Ok(Arc::clone(&entry.table));
        }

        self.misses += 1;
        debug!(path = %path.display(), ?shape, "Table cache miss");

        let table = Arc::new(load(path, shape)?);
        info!(
            path = %path.display(),
            ?shape,
            rows = table.len(),
            "Loaded count table"
        );

        self.entries.insert(
            key,
            CacheEntry {
                table: Arc::clone(&table),
                loaded_at: Utc::now(),
            },
        );
        Ok(table)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, path: &Path, shape: ExpectedShape) -> bool {
        let key = CacheKey {
            path: path.to_path_buf(),
            shape,
        };
        self.entries.remove(&key).is_some()
    }

    /// Drop every shape cached for `path`. Returns how many were removed.
    pub fn invalidate_path(&mut self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.path != path);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(dropped, "Table cache cleared");
    }

    pub fn contains(&self, path: &Path, shape: ExpectedShape) -> bool {
        self.entries.contains_key(&CacheKey {
            path: path.to_path_buf(),
            shape,
        })
    }

    /// When the entry for `(path, shape)` was loaded.
    pub fn loaded_at(&self, path: &Path, shape: ExpectedShape) -> Option<DateTime<Utc>> {
        self.entries
            .get(&CacheKey {
                path: path.to_path_buf(),
                shape,
            })
            .map(|e| e.loaded_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
