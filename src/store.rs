//! Document store abstraction and its MongoDB implementation.
//!
//! The orchestrators only see the narrow [`DocumentStore`] contract; the
//! MongoDB driver stays behind [`MongoStore`]. Tests substitute the
//! in-memory store from [`crate::testing`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::{doc, Bson};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use std::time::Duration;
use vault_core::{CollectionStats, IndexSpec, Value};

/// Narrow contract over a document database, per run.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List all collection names in the database.
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Count documents in a collection (best-effort).
    async fn count_documents(&self, collection: &str) -> Result<u64>;

    /// Read up to `limit` documents for schema inference.
    async fn sample_documents(&self, collection: &str, limit: u64) -> Result<Vec<Value>>;

    /// Read every document in a collection, in cursor order.
    async fn read_all_documents(&self, collection: &str) -> Result<Vec<Value>>;

    /// List the collection's indexes, in listing order.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>>;

    /// Create one index from its spec.
    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()>;

    /// Delete every document in a collection.
    async fn delete_all_documents(&self, collection: &str) -> Result<()>;

    /// Bulk-insert documents as one unordered operation.
    async fn insert_many(&self, collection: &str, documents: &[Value]) -> Result<()>;

    /// Insert a single document.
    async fn insert_one(&self, collection: &str, document: &Value) -> Result<()>;

    /// Best-effort collection statistics; callers default on failure.
    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats>;

    /// Drop the whole database.
    async fn drop_database(&self) -> Result<()>;
}

/// MongoDB-backed document store.
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect to MongoDB and select the target database.
    ///
    /// Connection and server-selection timeouts are capped so an unreachable
    /// store fails the run quickly instead of hanging.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;
        options.connect_timeout = Some(Duration::from_secs(10));
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client =
            Client::with_options(options).context("Failed to create MongoDB client")?;
        tracing::debug!("Connected to MongoDB, using database '{}'", database);
        Ok(Self {
            database: client.database(database),
        })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<bson::Document> {
        self.database.collection::<bson::Document>(name)
    }
}

fn index_spec_from_model(model: &IndexModel) -> IndexSpec {
    let options = model.options.as_ref();
    let name = options
        .and_then(|o| o.name.clone())
        .unwrap_or_else(|| "unnamed".to_string());
    let key = model
        .keys
        .iter()
        .map(|(field, direction)| (field.clone(), direction.clone().into_relaxed_extjson()))
        .collect();
    IndexSpec {
        name,
        key,
        unique: options.and_then(|o| o.unique).unwrap_or(false),
        sparse: options.and_then(|o| o.sparse).unwrap_or(false),
        partial_filter_expression: options
            .and_then(|o| o.partial_filter_expression.clone())
            .map(|d| Bson::Document(d).into_relaxed_extjson()),
    }
}

fn index_model_from_spec(spec: &IndexSpec) -> Result<IndexModel> {
    let mut keys = bson::Document::new();
    for (field, direction) in &spec.key {
        let value = Bson::try_from(direction.clone())
            .with_context(|| format!("Invalid key direction for index '{}'", spec.name))?;
        keys.insert(field.clone(), value);
    }

    let partial = spec
        .partial_filter_expression
        .clone()
        .map(|expr| -> Result<bson::Document> {
            match Bson::try_from(expr)? {
                Bson::Document(doc) => Ok(doc),
                other => Ok(doc! { "$expr": other }),
            }
        })
        .transpose()?;

    let options = IndexOptions::builder()
        .name(spec.name.clone())
        .unique(spec.unique)
        .sparse(spec.sparse)
        .partial_filter_expression(partial)
        .build();
    Ok(IndexModel::builder().keys(keys).options(options).build())
}

fn stats_number(doc: &bson::Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Int32(i)) => *i as f64,
        Some(Bson::Int64(i)) => *i as f64,
        Some(Bson::Double(f)) => *f,
        _ => 0.0,
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_collection_names(&self) -> Result<Vec<String>> {
        self.database
            .list_collection_names()
            .await
            .context("Failed to list collections")
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        self.collection(collection)
            .count_documents(doc! {})
            .await
            .with_context(|| format!("Failed to count documents in '{collection}'"))
    }

    async fn sample_documents(&self, collection: &str, limit: u64) -> Result<Vec<Value>> {
        let mut cursor = self
            .collection(collection)
            .find(doc! {})
            .limit(limit as i64)
            .await
            .with_context(|| format!("Failed to sample documents from '{collection}'"))?;
        let mut documents = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            documents.push(Value::Object(vault_bson::from_bson_document(&doc)));
        }
        Ok(documents)
    }

    async fn read_all_documents(&self, collection: &str) -> Result<Vec<Value>> {
        let mut cursor = self
            .collection(collection)
            .find(doc! {})
            .await
            .with_context(|| format!("Failed to read documents from '{collection}'"))?;
        let mut documents = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            documents.push(Value::Object(vault_bson::from_bson_document(&doc)));
        }
        Ok(documents)
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>> {
        let models: Vec<IndexModel> = self
            .collection(collection)
            .list_indexes()
            .await
            .with_context(|| format!("Failed to list indexes of '{collection}'"))?
            .try_collect()
            .await?;
        Ok(models.iter().map(index_spec_from_model).collect())
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        let model = index_model_from_spec(spec)?;
        self.collection(collection)
            .create_index(model)
            .await
            .with_context(|| {
                format!("Failed to create index '{}' on '{collection}'", spec.name)
            })?;
        Ok(())
    }

    async fn delete_all_documents(&self, collection: &str) -> Result<()> {
        self.collection(collection)
            .delete_many(doc! {})
            .await
            .with_context(|| format!("Failed to clear collection '{collection}'"))?;
        Ok(())
    }

    async fn insert_many(&self, collection: &str, documents: &[Value]) -> Result<()> {
        let docs: Vec<bson::Document> = documents
            .iter()
            .filter_map(|v| v.as_object().map(vault_bson::to_bson_document))
            .collect();
        self.collection(collection)
            .insert_many(docs)
            .ordered(false)
            .await
            .with_context(|| format!("Bulk insert into '{collection}' failed"))?;
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: &Value) -> Result<()> {
        let doc = document
            .as_object()
            .map(vault_bson::to_bson_document)
            .context("Document is not an object")?;
        self.collection(collection)
            .insert_one(doc)
            .await
            .with_context(|| format!("Insert into '{collection}' failed"))?;
        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        let reply = self
            .database
            .run_command(doc! { "collStats": collection })
            .await
            .with_context(|| format!("collStats unavailable for '{collection}'"))?;
        Ok(CollectionStats {
            document_count: stats_number(&reply, "count") as u64,
            avg_doc_size: stats_number(&reply, "avgObjSize"),
            total_size: stats_number(&reply, "size") as u64,
        })
    }

    async fn drop_database(&self) -> Result<()> {
        self.database
            .drop()
            .await
            .context("Failed to drop database")
    }
}
