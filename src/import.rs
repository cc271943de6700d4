//! Import orchestrator: persisted artifacts → validated documents → store.

use crate::config::ImportOpts;
use crate::files::{layout, FileStore};
use crate::store::DocumentStore;
use anyhow::{Context, Result};
use vault_coerce::validate;
use vault_core::{DatabaseSchema, Value};

/// Aggregated counters for one import run.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Collections processed
    pub collections_imported: usize,
    /// Documents successfully handed to the store
    pub documents_imported: usize,
    /// Documents skipped (invalid with --skip-invalid, or insert failures)
    pub documents_skipped: usize,
    /// Successful type casts applied during validation
    pub casts_performed: usize,
    /// Unresolved type mismatches
    pub validation_warnings: usize,
    /// Missing required fields
    pub validation_errors: usize,
    /// Indexes recreated
    pub indexes_created: usize,
    /// Index recreations that failed
    pub index_failures: usize,
}

impl ImportSummary {
    fn log(&self) {
        tracing::info!(
            "Import complete: {} collections, {} documents imported, {} skipped, \
             {} casts, {} warnings, {} errors, {} indexes created ({} failed)",
            self.collections_imported,
            self.documents_imported,
            self.documents_skipped,
            self.casts_performed,
            self.validation_warnings,
            self.validation_errors,
            self.indexes_created,
            self.index_failures
        );
    }
}

/// Import previously exported collections back into the store.
///
/// A missing manifest is a fatal precondition failure, checked before the
/// store is touched. Everything below the collection level degrades: batch
/// failures retry per document, index failures are counted and skipped.
pub async fn run_import(
    store: &dyn DocumentStore,
    files: &dyn FileStore,
    opts: &ImportOpts,
) -> Result<ImportSummary> {
    let manifest_text = files
        .read_text(layout::DATABASE_SCHEMA)
        .await
        .context("No export manifest found; run `mongovault export` first")?;
    let manifest =
        DatabaseSchema::from_json(&manifest_text).context("Malformed export manifest")?;
    tracing::info!(
        "Importing database '{}' ({} collections in manifest)",
        manifest.database_name,
        manifest.total_collections
    );

    if !opts.no_drop {
        store.drop_database().await?;
        tracing::info!("Dropped target database before import");
    }

    let mut summary = ImportSummary::default();

    // Surface data files that no manifest entry claims; they are ignored.
    if let Ok(data_files) = files.list_files("data").await {
        for file in data_files {
            if let Some(stem) = file.strip_suffix(".json") {
                if !manifest.collections.contains_key(stem) {
                    tracing::warn!("Data file '{}' has no manifest entry, ignoring it", file);
                }
            }
        }
    }

    for (name, schema) in &manifest.collections {
        if !opts.includes_collection(name) {
            continue;
        }

        let data_text = match files.read_text(&layout::data_file(name)).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!("No data file for '{}', skipping: {:#}", name, error);
                continue;
            }
        };
        let data_json: serde_json::Value = match serde_json::from_str(&data_text) {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!("Malformed data file for '{}', skipping: {}", name, error);
                continue;
            }
        };
        let raw: Vec<Value> = data_json
            .as_array()
            .map(|items| items.iter().map(Value::from_json).collect())
            .unwrap_or_default();

        if !opts.no_clear {
            if let Err(error) = store.delete_all_documents(name).await {
                tracing::warn!("Could not clear '{}' before import: {:#}", name, error);
            }
        }

        let documents = if opts.no_validate {
            raw
        } else {
            let mut validated = Vec::with_capacity(raw.len());
            for (index, document) in raw.iter().enumerate() {
                let report = validate(document, &schema.fields);
                summary.casts_performed += report.casts_performed;
                summary.validation_warnings += report.warnings.len();
                for warning in &report.warnings {
                    tracing::warn!("'{}' document {}: {}", name, index, warning);
                }
                if !report.is_valid {
                    summary.validation_errors += report.errors.len();
                    for error in &report.errors {
                        tracing::warn!("'{}' document {}: {}", name, index, error);
                    }
                    if opts.skip_invalid {
                        summary.documents_skipped += 1;
                        continue;
                    }
                }
                validated.push(report.document);
                if (index + 1) % 1000 == 0 {
                    tracing::debug!("'{}': validated {} documents", name, index + 1);
                }
            }
            validated
        };

        insert_in_batches(store, name, &documents, opts.batch_size, &mut summary).await;

        if !opts.no_indexes {
            for spec in schema.indexes.iter().filter(|s| !s.is_primary()) {
                match store.create_index(name, spec).await {
                    Ok(()) => summary.indexes_created += 1,
                    Err(error) => {
                        tracing::warn!(
                            "Index '{}' on '{}' not recreated: {:#}",
                            spec.name,
                            name,
                            error
                        );
                        summary.index_failures += 1;
                    }
                }
            }
        }

        tracing::info!("Imported '{}': {} documents", name, documents.len());
        summary.collections_imported += 1;
    }

    summary.log();
    Ok(summary)
}

/// Submit documents in fixed-size bulk batches. A failed batch degrades to
/// per-document inserts, so a poison document costs its batch throughput but
/// never blocks the rest of the run.
async fn insert_in_batches(
    store: &dyn DocumentStore,
    collection: &str,
    documents: &[Value],
    batch_size: usize,
    summary: &mut ImportSummary,
) {
    for batch in documents.chunks(batch_size.max(1)) {
        match store.insert_many(collection, batch).await {
            Ok(()) => summary.documents_imported += batch.len(),
            Err(error) => {
                tracing::warn!(
                    "Bulk insert of {} documents into '{}' failed, retrying per document: {:#}",
                    batch.len(),
                    collection,
                    error
                );
                for document in batch {
                    match store.insert_one(collection, document).await {
                        Ok(()) => summary.documents_imported += 1,
                        Err(error) => {
                            tracing::warn!("Document skipped in '{}': {:#}", collection, error);
                            summary.documents_skipped += 1;
                        }
                    }
                }
            }
        }
    }
}
