//! Core types for mongovault.
//!
//! This crate provides the foundational pieces shared by every other
//! mongovault crate:
//!
//! - [`Value`] - Tagged-union representation of decoded document values
//! - [`TypeTag`] / [`classify`] - Semantic type tags and total classification
//! - [`FieldSchema`] / [`CollectionSchema`] / [`DatabaseSchema`] - Persisted
//!   schema artifacts
//! - [`infer_fields`] - Per-field-path schema inference over document samples
//!
//! # Architecture
//!
//! ```text
//! vault-core (this crate)
//!    │
//!    ├─── vault-bson    (BSON ⇄ Value conversions at the store boundary)
//!    ├─── vault-coerce  (type coercion and document validation)
//!    └─── vault-sql     (relational projection of schemas and documents)
//! ```

pub mod infer;
pub mod schema;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use infer::infer_fields;
pub use schema::{
    CollectionSchema, CollectionStats, DatabaseSchema, FieldSchema, IndexSpec, SchemaError,
};
pub use types::{classify, TypeTag};
pub use value::{canonical_number_text, iso8601_text, Document, ObjectId, Value};
