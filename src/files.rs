//! File store abstraction and the local filesystem implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Narrow contract for reading and writing whole text artifacts by name.
///
/// Paths are relative to the store root, e.g. `data/users.json`.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write a text artifact, replacing any previous content.
    async fn write_text(&self, path: &str, content: &str) -> Result<()>;

    /// Read a text artifact in full.
    async fn read_text(&self, path: &str) -> Result<String>;

    /// Create a directory (and parents) if missing.
    async fn ensure_directory(&self, path: &str) -> Result<()>;

    /// List file names (not subdirectories) directly under a directory.
    async fn list_files(&self, directory: &str) -> Result<Vec<String>>;
}

/// Local filesystem file store rooted at the export directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a store rooted at `root`. The directory itself is created
    /// lazily by `ensure_directory`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn write_text(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        tokio::fs::write(&full, content)
            .await
            .with_context(|| format!("Failed to write file: {}", full.display()))
    }

    async fn read_text(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("Failed to read file: {}", full.display()))
    }

    async fn ensure_directory(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        tokio::fs::create_dir_all(&full)
            .await
            .with_context(|| format!("Failed to create directory: {}", full.display()))
    }

    async fn list_files(&self, directory: &str) -> Result<Vec<String>> {
        let full = self.resolve(directory);
        let mut entries = tokio::fs::read_dir(&full)
            .await
            .with_context(|| format!("Failed to read directory: {}", full.display()))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.metadata().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        // Sort for consistent ordering
        names.sort();
        Ok(names)
    }
}

/// Relative path helpers for the artifact layout shared by export and import.
pub mod layout {
    /// Raw documents for one collection.
    pub fn data_file(collection: &str) -> String {
        format!("data/{collection}.json")
    }

    /// Per-collection schema artifact.
    pub fn schema_file(collection: &str) -> String {
        format!("schema/{collection}_schema.json")
    }

    /// The canonical import manifest.
    pub const DATABASE_SCHEMA: &str = "schema/database_schema.json";

    /// Per-collection SQL migration.
    pub fn migration_file(collection: &str) -> String {
        format!("migration/{collection}.sql")
    }

    /// Concatenated migration for all collections.
    pub const COMPLETE_MIGRATION: &str = "migration/complete_migration.sql";

    /// Index recreation script in the store's native query language.
    pub const INDEX_SCRIPT: &str = "migration/recreate_indexes.js";
}

/// The directories every export run creates up front.
pub fn artifact_dirs() -> [&'static str; 3] {
    ["data", "schema", "migration"]
}
