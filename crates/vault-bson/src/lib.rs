//! BSON conversions for mongovault values.
//!
//! The store boundary is the only place where identifier and temporal tags
//! are resolved: a `Bson::ObjectId` becomes `Value::ObjectId` here, once,
//! and is never re-derived from string shape later.
//!
//! - [`reverse`] - BSON value → [`vault_core::Value`] (reading from the store)
//! - [`forward`] - [`vault_core::Value`] → BSON value (writing to the store)

pub mod forward;
pub mod reverse;

pub use forward::{to_bson, to_bson_document};
pub use reverse::{from_bson, from_bson_document};
