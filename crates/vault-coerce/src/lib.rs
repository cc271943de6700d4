//! Type coercion and document validation for mongovault.
//!
//! Import re-reads documents that were flattened to plain JSON, so observed
//! types routinely disagree with the inferred schema (dates and identifiers
//! come back as strings, numbers as quoted text, and so on). This crate
//! brings such documents back in line with the schema:
//!
//! - [`coerce`] - Convert one value to a target type tag, or fail with a
//!   typed [`CoercionError`]
//! - [`validate`] - Walk a document against its field schemas, coercing
//!   mismatches and reporting errors, warnings and cast counts
//!
//! Coercion failures are never fatal to a run: the validator converts them
//! into warnings and keeps the original value.

pub mod coerce;
pub mod validate;

pub use coerce::{coerce, CoercionError};
pub use validate::{validate, ValidationReport};
