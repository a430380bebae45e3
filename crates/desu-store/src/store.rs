//! File-backed record store.
//!
//! Every collection lives in memory and is written out as one JSON document.
//! Writes mark the store dirty; [`FileStore::flush`] (usually driven by the
//! autosave task) persists the document with a temp-file-and-rename.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use desu_core::Result;
use desu_core::error::StoreError;
use desu_core::record::{Predicate, Query, Record, RecordId};

use crate::collection::Collection;

/// On-disk format version.
const DOCUMENT_VERSION: u32 = 1;

/// Declaration of a collection and the fields it indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub indices: Vec<String>,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indices: Vec::new(),
        }
    }

    /// Declare an index on a top-level payload field.
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indices.push(field.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    collections: BTreeMap<String, CollectionDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionDocument {
    next_id: RecordId,
    #[serde(default)]
    indices: Vec<String>,
    records: Vec<Record<Value>>,
}

#[derive(Debug)]
struct StoreState {
    collections: BTreeMap<String, Collection>,
    dirty: bool,
}

impl StoreState {
    fn collection(&self, name: &str) -> Result<&Collection> {
        self.collections.get(name).ok_or_else(|| {
            StoreError::UnknownCollection {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection> {
        self.collections.get_mut(name).ok_or_else(|| {
            StoreError::UnknownCollection {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn to_document(&self) -> StoreDocument {
        let collections = self
            .collections
            .iter()
            .map(|(name, collection)| {
                let doc = CollectionDocument {
                    next_id: collection.next_id(),
                    indices: collection.index_fields(),
                    records: collection
                        .records()
                        .map(|(id, data)| Record::new(id, data.clone()))
                        .collect(),
                };
                (name.clone(), doc)
            })
            .collect();

        StoreDocument {
            version: DOCUMENT_VERSION,
            collections,
        }
    }
}

#[derive(Debug)]
struct Backing {
    path: PathBuf,
    // Held for the life of the store; dropping it releases the lock.
    _lock: File,
}

#[derive(Debug)]
struct StoreInner {
    backing: Option<Backing>,
    specs: Vec<CollectionSpec>,
    state: Mutex<StoreState>,
    /// Held across snapshot and write; every flush goes through the same
    /// temp file and must land in snapshot order.
    flush: Mutex<()>,
}

/// Collection-oriented record store persisted to a single file.
///
/// Cloning is cheap and every clone shares the same state; the process that
/// opened the store holds an exclusive lock on its file until the last clone
/// is dropped.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<StoreInner>,
}

impl FileStore {
    /// Open (or create) a store backed by `path`, declaring `specs`.
    ///
    /// Collections present in the file but not declared are kept as they are.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, specs: Vec<CollectionSpec>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let lock_path = sibling(&path, "lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;
        lock.try_lock_exclusive()
            .map_err(|_| StoreError::Locked { path: path.clone() })?;

        let mut collections = if path.exists() {
            load_document(&path, &specs)?
        } else {
            BTreeMap::new()
        };

        let mut dirty = false;
        for spec in &specs {
            if !collections.contains_key(&spec.name) {
                collections.insert(spec.name.clone(), Collection::new(&spec.indices));
                dirty = true;
            }
        }

        info!(collections = collections.len(), "Opened record store");

        Ok(Self::from_parts(
            Some(Backing { path, _lock: lock }),
            specs,
            collections,
            dirty,
        ))
    }

    /// A store that never touches the filesystem.
    pub fn memory(specs: Vec<CollectionSpec>) -> Self {
        let collections = specs
            .iter()
            .map(|spec| (spec.name.clone(), Collection::new(&spec.indices)))
            .collect();
        Self::from_parts(None, specs, collections, false)
    }

    fn from_parts(
        backing: Option<Backing>,
        specs: Vec<CollectionSpec>,
        collections: BTreeMap<String, Collection>,
        dirty: bool,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backing,
                specs,
                state: Mutex::new(StoreState { collections, dirty }),
                flush: Mutex::new(()),
            }),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.inner.backing.as_ref().map(|b| b.path.as_path())
    }

    /// Names of every collection currently held.
    pub fn collections(&self) -> Vec<String> {
        self.state().collections.keys().cloned().collect()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a record and return it with its assigned id.
    ///
    /// The record is visible to every subsequent read immediately; it reaches
    /// disk on the next flush.
    #[instrument(skip(self, data))]
    pub fn insert<T: Serialize>(&self, collection: &str, data: T) -> Result<Record<T>> {
        let value = serde_json::to_value(&data).map_err(StoreError::from)?;
        let mut state = self.state();
        let id = state.collection_mut(collection)?.insert(value);
        state.dirty = true;
        debug!(%id, "Inserted record");
        Ok(Record::new(id, data))
    }

    /// First record (in id order) matching `predicate`.
    pub fn find_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<Record<T>>> {
        let found = self.state().collection(collection)?.find_one(predicate);
        found.map(decode).transpose()
    }

    /// Filter, sort, and window records.
    pub fn query<T: DeserializeOwned>(&self, collection: &str, query: &Query) -> Result<Vec<Record<T>>> {
        let hits = self.state().collection(collection)?.query(query);
        hits.into_iter().map(decode).collect()
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.state().collection(collection)?.len())
    }

    /// Delete every record matching `predicate`, returning how many went.
    #[instrument(skip(self))]
    pub fn delete_where(&self, collection: &str, predicate: &Predicate) -> Result<usize> {
        let mut state = self.state();
        let removed = state.collection_mut(collection)?.delete_where(predicate);
        if removed > 0 {
            state.dirty = true;
            debug!(removed, "Deleted records");
        }
        Ok(removed)
    }

    /// Drop a collection's records and id counter.
    ///
    /// Declared collections come back empty with their indices; undeclared
    /// ones disappear entirely.
    #[instrument(skip(self))]
    pub fn reset(&self, collection: &str) -> Result<()> {
        let mut state = self.state();
        state.collection(collection)?;

        match self.inner.specs.iter().find(|s| s.name == collection) {
            Some(spec) => {
                state
                    .collections
                    .insert(collection.to_string(), Collection::new(&spec.indices));
            }
            None => {
                state.collections.remove(collection);
            }
        }
        state.dirty = true;
        debug!("Reset collection");
        Ok(())
    }

    /// Whether there are writes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    /// Write the document to disk if anything changed since the last flush.
    ///
    /// Returns whether a write happened. On failure the store stays dirty so
    /// the next flush retries.
    pub fn flush(&self) -> Result<bool> {
        let Some(backing) = &self.inner.backing else {
            self.state().dirty = false;
            return Ok(false);
        };

        let _flushing = self.inner.flush.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = {
            let mut state = self.state();
            if !state.dirty {
                return Ok(false);
            }
            let bytes = serde_json::to_vec_pretty(&state.to_document()).map_err(StoreError::from)?;
            state.dirty = false;
            bytes
        };

        if let Err(e) = write_atomic(&backing.path, &bytes) {
            self.state().dirty = true;
            return Err(e.into());
        }

        debug!(bytes = bytes.len(), "Flushed record store");
        Ok(true)
    }
}

fn decode<T: DeserializeOwned>(record: Record<Value>) -> Result<Record<T>> {
    let Record { id, data } = record;
    let data = serde_json::from_value(data).map_err(StoreError::from)?;
    Ok(Record::new(id, data))
}

/// `path` with `.suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::result::Result<(), StoreError> {
    let temp_path = sibling(path, "tmp");
    fs::write(&temp_path, bytes).map_err(|e| StoreError::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn load_document(path: &Path, specs: &[CollectionSpec]) -> Result<BTreeMap<String, Collection>> {
    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let document: StoreDocument =
        serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

    if document.version != DOCUMENT_VERSION {
        return Err(corrupt(format!("unsupported version {}", document.version)).into());
    }

    let mut collections = BTreeMap::new();
    for (name, doc) in document.collections {
        // Declared indices win over whatever the file remembers.
        let indices = specs
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.indices.clone())
            .unwrap_or(doc.indices);
        let collection = Collection::restore(doc.next_id, doc.records, &indices)
            .map_err(|reason| corrupt(format!("collection '{name}': {reason}")))?;
        collections.insert(name, collection);
    }

    Ok(collections)
}
