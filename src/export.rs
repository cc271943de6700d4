//! Export orchestrator: collections → JSON, schema and migration artifacts.

use crate::files::{artifact_dirs, layout, FileStore};
use crate::store::DocumentStore;
use anyhow::Result;
use vault_core::{infer_fields, CollectionSchema, DatabaseSchema, IndexSpec, Value};
use vault_sql::project;

/// How many documents feed schema inference per collection.
pub const SCHEMA_SAMPLE_LIMIT: u64 = 100;

/// Aggregated counters for one export run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Collections exported with all artifacts
    pub collections_exported: usize,
    /// Collections skipped (empty or unreadable)
    pub collections_skipped: usize,
    /// Total documents written to data files
    pub documents_exported: usize,
    /// Non-fatal per-collection errors (read failures, column collisions)
    pub errors: usize,
}

impl ExportSummary {
    fn log(&self) {
        tracing::info!(
            "Export complete: {} collections exported, {} skipped, {} documents, {} errors",
            self.collections_exported,
            self.collections_skipped,
            self.documents_exported,
            self.errors
        );
    }
}

/// Export every collection of the configured database.
///
/// Only store-connection failures abort the run; per-collection problems are
/// logged, counted and skipped.
pub async fn run_export(
    store: &dyn DocumentStore,
    files: &dyn FileStore,
    database_name: &str,
) -> Result<ExportSummary> {
    for dir in artifact_dirs() {
        files.ensure_directory(dir).await?;
    }

    let mut names = store.list_collection_names().await?;
    names.sort();
    tracing::info!(
        "Exporting database '{}': {} collections",
        database_name,
        names.len()
    );

    let mut summary = ExportSummary::default();
    let mut database_schema = DatabaseSchema::new(database_name);
    let mut complete_migration = format!("-- Migration for database '{database_name}'\n\n");
    let mut index_script = format!("// Index recreation for database '{database_name}'\n");

    for name in &names {
        let expected = store.count_documents(name).await.unwrap_or(0);
        tracing::debug!("Exporting '{}' ({} documents expected)", name, expected);

        let documents = match store.read_all_documents(name).await {
            Ok(documents) => documents,
            Err(error) => {
                tracing::warn!("Skipping collection '{}': {:#}", name, error);
                summary.errors += 1;
                summary.collections_skipped += 1;
                continue;
            }
        };
        if documents.is_empty() {
            tracing::info!("Skipping empty collection '{}'", name);
            summary.collections_skipped += 1;
            continue;
        }

        let sample = match store.sample_documents(name, SCHEMA_SAMPLE_LIMIT).await {
            Ok(sample) if !sample.is_empty() => sample,
            Ok(_) | Err(_) => documents
                .iter()
                .take(SCHEMA_SAMPLE_LIMIT as usize)
                .cloned()
                .collect(),
        };
        let fields = infer_fields(&sample);

        let stats = match store.collection_stats(name).await {
            Ok(stats) => stats,
            Err(error) => {
                tracing::warn!("Stats unavailable for '{}': {:#}", name, error);
                Default::default()
            }
        };
        let indexes = match store.list_indexes(name).await {
            Ok(indexes) => indexes,
            Err(error) => {
                tracing::warn!("Indexes unavailable for '{}': {:#}", name, error);
                Vec::new()
            }
        };

        let schema = CollectionSchema {
            name: name.clone(),
            fields,
            indexes,
            stats,
        };

        let data_json = serde_json::Value::Array(documents.iter().map(Value::to_json).collect());
        files
            .write_text(
                &layout::data_file(name),
                &serde_json::to_string_pretty(&data_json)?,
            )
            .await?;
        files
            .write_text(
                &layout::schema_file(name),
                &serde_json::to_string_pretty(&schema)?,
            )
            .await?;

        match project(name, &schema, &documents) {
            Ok(projection) => {
                let sql = projection.to_sql();
                files.write_text(&layout::migration_file(name), &sql).await?;
                complete_migration.push_str(&sql);
                complete_migration.push('\n');
            }
            Err(error) => {
                tracing::error!("Migration generation failed for '{}': {}", name, error);
                summary.errors += 1;
            }
        }

        for spec in schema.indexes.iter().filter(|s| !s.is_primary()) {
            index_script.push_str(&index_script_line(name, spec));
        }

        tracing::info!("Exported '{}': {} documents", name, documents.len());
        summary.documents_exported += documents.len();
        summary.collections_exported += 1;
        database_schema.add_collection(schema);
    }

    files
        .write_text(layout::DATABASE_SCHEMA, &database_schema.to_pretty_json()?)
        .await?;
    files
        .write_text(layout::COMPLETE_MIGRATION, &complete_migration)
        .await?;
    files.write_text(layout::INDEX_SCRIPT, &index_script).await?;

    summary.log();
    Ok(summary)
}

/// Render one `createIndex` call in the store's native query language,
/// preserving key order.
fn index_script_line(collection: &str, spec: &IndexSpec) -> String {
    let keys = spec
        .key
        .iter()
        .map(|(field, direction)| format!("{}: {}", json_text(field), direction))
        .collect::<Vec<_>>()
        .join(", ");

    let mut options = vec![format!("name: {}", json_text(&spec.name))];
    if spec.unique {
        options.push("unique: true".to_string());
    }
    if spec.sparse {
        options.push("sparse: true".to_string());
    }
    if let Some(expr) = &spec.partial_filter_expression {
        options.push(format!("partialFilterExpression: {expr}"));
    }

    format!(
        "db.{}.createIndex({{{}}}, {{{}}});\n",
        collection,
        keys,
        options.join(", ")
    )
}

fn json_text(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
