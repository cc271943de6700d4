//! Schema artifacts persisted by export and consumed by import.
//!
//! The schema is written once at the end of a successful export and read once
//! at the start of an import; it is never mutated in place.

use crate::types::TypeTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error type for schema artifact handling.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error parsing a schema artifact
    #[error("Failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Collection not present in the database schema
    #[error("Collection not found in schema: {0}")]
    CollectionNotFound(String),
}

/// Per-field-path schema produced by inference.
///
/// Paths are dot-joined field names, with a `[]` suffix segment marking the
/// descent into array elements (e.g. `addresses[].city`). The paths built
/// here are reused verbatim by validation and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// The most frequently observed type tag for this path
    #[serde(rename = "type")]
    pub declared_type: TypeTag,

    /// True iff at least one sampled document had null at this path
    #[serde(default)]
    pub nullable: bool,

    /// Highest per-tag frequency observed (diagnostic only)
    pub sample_count: u64,

    /// True iff the field was present in every visit of its parent
    #[serde(default)]
    pub required: bool,

    /// Nested field schemas, keyed by full path. Present for object-typed
    /// fields and for arrays whose elements are objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_fields: Option<BTreeMap<String, FieldSchema>>,

    /// Declared type of array elements (arrays only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_element_type: Option<TypeTag>,
}

impl FieldSchema {
    /// Create a minimal schema for a scalar field.
    pub fn scalar(declared_type: TypeTag) -> Self {
        Self {
            declared_type,
            nullable: false,
            sample_count: 0,
            required: false,
            nested_fields: None,
            array_element_type: None,
        }
    }
}

/// Index definition captured from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name
    pub name: String,

    /// Ordered key specification: field name paired with its direction or
    /// index kind (1, -1, "text", ...), preserved as raw JSON.
    pub key: Vec<(String, serde_json::Value)>,

    /// Whether the index enforces uniqueness
    #[serde(default)]
    pub unique: bool,

    /// Whether the index skips documents missing the keyed fields
    #[serde(default)]
    pub sparse: bool,

    /// Partial index predicate, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_filter_expression: Option<serde_json::Value>,
}

impl IndexSpec {
    /// The implicit primary-identifier index, always excluded from recreation.
    pub fn is_primary(&self) -> bool {
        self.name == "_id_"
    }
}

/// Best-effort collection statistics. Defaults to zeros when the store cannot
/// provide them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Number of documents
    pub document_count: u64,

    /// Average document size in bytes
    pub avg_doc_size: f64,

    /// Total collection size in bytes
    pub total_size: u64,
}

/// Schema for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name
    pub name: String,

    /// Field schemas keyed by field path
    pub fields: BTreeMap<String, FieldSchema>,

    /// Indexes captured from the store, in listing order
    pub indexes: Vec<IndexSpec>,

    /// Best-effort statistics
    #[serde(default)]
    pub stats: CollectionStats,
}

/// The canonical import manifest: one per export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    /// Source database name
    pub database_name: String,

    /// Collection schemas keyed by collection name
    pub collections: BTreeMap<String, CollectionSchema>,

    /// When the export run started
    pub exported_at: DateTime<Utc>,

    /// Number of exported collections
    pub total_collections: usize,
}

impl DatabaseSchema {
    /// Create an empty schema for a fresh export run.
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            collections: BTreeMap::new(),
            exported_at: Utc::now(),
            total_collections: 0,
        }
    }

    /// Add a collection schema and keep the collection count in sync.
    pub fn add_collection(&mut self, schema: CollectionSchema) {
        self.collections.insert(schema.name.clone(), schema);
        self.total_collections = self.collections.len();
    }

    /// Look up a collection schema by name.
    pub fn collection(&self, name: &str) -> Result<&CollectionSchema, SchemaError> {
        self.collections
            .get(name)
            .ok_or_else(|| SchemaError::CollectionNotFound(name.to_string()))
    }

    /// Serialize to the pretty-printed JSON artifact form.
    pub fn to_pretty_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the JSON artifact form.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> DatabaseSchema {
        let mut db = DatabaseSchema::new("shop");
        db.add_collection(CollectionSchema {
            name: "users".to_string(),
            fields: BTreeMap::from([(
                "age".to_string(),
                FieldSchema {
                    sample_count: 3,
                    required: true,
                    ..FieldSchema::scalar(TypeTag::Number)
                },
            )]),
            indexes: vec![
                IndexSpec {
                    name: "_id_".to_string(),
                    key: vec![("_id".to_string(), serde_json::json!(1))],
                    unique: false,
                    sparse: false,
                    partial_filter_expression: None,
                },
                IndexSpec {
                    name: "email_1".to_string(),
                    key: vec![("email".to_string(), serde_json::json!(1))],
                    unique: true,
                    sparse: false,
                    partial_filter_expression: None,
                },
            ],
            stats: CollectionStats::default(),
        });
        db
    }

    #[test]
    fn test_json_round_trip() {
        let db = sample_schema();
        let text = db.to_pretty_json().unwrap();
        let parsed = DatabaseSchema::from_json(&text).unwrap();
        assert_eq!(parsed, db);
        assert_eq!(parsed.total_collections, 1);
    }

    #[test]
    fn test_primary_index_detection() {
        let db = sample_schema();
        let users = db.collection("users").unwrap();
        assert!(users.indexes[0].is_primary());
        assert!(!users.indexes[1].is_primary());
        assert!(db.collection("missing").is_err());
    }
}
