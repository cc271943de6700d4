//! In-memory store implementations for orchestrator tests.
//!
//! `MemoryStore` records every bulk-insert call and can be told to fail
//! specific batches, which is how the batch-fallback behavior is exercised
//! without a live MongoDB.

use crate::files::FileStore;
use crate::store::DocumentStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use vault_core::{CollectionStats, IndexSpec, Value};

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Value>>>,
    indexes: Mutex<BTreeMap<String, Vec<IndexSpec>>>,
    /// Zero-based indexes of `insert_many` calls that should fail.
    failing_batches: Mutex<HashSet<usize>>,
    /// Sizes of every `insert_many` call, in order.
    batch_sizes: Mutex<Vec<usize>>,
    dropped: Mutex<bool>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with documents.
    pub fn seed(&self, collection: &str, documents: Vec<Value>) {
        self.collections
            .lock()
            .unwrap()
            .insert(collection.to_string(), documents);
    }

    /// Seed a collection's indexes.
    pub fn seed_indexes(&self, collection: &str, indexes: Vec<IndexSpec>) {
        self.indexes
            .lock()
            .unwrap()
            .insert(collection.to_string(), indexes);
    }

    /// Make the n-th `insert_many` call (zero-based) report failure.
    pub fn fail_batch(&self, call_index: usize) {
        self.failing_batches.lock().unwrap().insert(call_index);
    }

    /// Sizes of all bulk inserts submitted so far.
    pub fn recorded_batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    /// Documents currently held in a collection.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Indexes currently registered for a collection.
    pub fn collection_indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.indexes
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `drop_database` was called.
    pub fn was_dropped(&self) -> bool {
        *self.dropped.lock().unwrap()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.collections.lock().unwrap().keys().cloned().collect())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        Ok(self.documents(collection).len() as u64)
    }

    async fn sample_documents(&self, collection: &str, limit: u64) -> Result<Vec<Value>> {
        Ok(self
            .documents(collection)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn read_all_documents(&self, collection: &str) -> Result<Vec<Value>> {
        Ok(self.documents(collection))
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>> {
        Ok(self.collection_indexes(collection))
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        self.indexes
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(spec.clone());
        Ok(())
    }

    async fn delete_all_documents(&self, collection: &str) -> Result<()> {
        if let Some(documents) = self.collections.lock().unwrap().get_mut(collection) {
            documents.clear();
        }
        Ok(())
    }

    async fn insert_many(&self, collection: &str, documents: &[Value]) -> Result<()> {
        let call_index = {
            let mut sizes = self.batch_sizes.lock().unwrap();
            sizes.push(documents.len());
            sizes.len() - 1
        };
        if self.failing_batches.lock().unwrap().contains(&call_index) {
            bail!("injected bulk insert failure for batch {call_index}");
        }
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(documents.iter().cloned());
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: &Value) -> Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        Ok(CollectionStats {
            document_count: self.documents(collection).len() as u64,
            ..Default::default()
        })
    }

    async fn drop_database(&self) -> Result<()> {
        self.collections.lock().unwrap().clear();
        self.indexes.lock().unwrap().clear();
        *self.dropped.lock().unwrap() = true;
        Ok(())
    }
}

/// In-memory file store keyed by relative path.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryFileStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn write_text(&self, path: &str, content: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn read_text(&self, path: &str) -> Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .with_context(|| format!("No such file: {path}"))
    }

    async fn ensure_directory(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn list_files(&self, directory: &str) -> Result<Vec<String>> {
        let prefix = format!("{directory}/");
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}
