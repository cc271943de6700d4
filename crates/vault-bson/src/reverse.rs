//! Reverse conversion: BSON value → `Value`.

use base64::Engine;
use bson::Bson;
use vault_core::{Document, ObjectId, Value};

/// Convert a BSON value into the tagged-union value model.
///
/// Total: exotic BSON types without a counterpart degrade to strings or null
/// rather than failing, since export must cope with whatever the store holds.
pub fn from_bson(bson: &Bson) -> Value {
    match bson {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Number(*i as f64),
        Bson::Int64(i) => Value::Number(*i as f64),
        Bson::Double(f) => Value::Number(*f),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::ObjectId(ObjectId::from_bytes(oid.bytes())),
        Bson::DateTime(dt) => Value::DateTime(dt.to_chrono()),
        Bson::Array(items) => Value::Array(items.iter().map(from_bson).collect()),
        Bson::Document(doc) => Value::Object(from_bson_document(doc)),

        // Types without a slot in the value model degrade to their most
        // useful textual form.
        Bson::Decimal128(d) => Value::String(d.to_string()),
        Bson::Timestamp(ts) => Value::Number(ts.time as f64),
        Bson::Binary(bin) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(&bin.bytes))
        }
        Bson::RegularExpression(re) => Value::String(re.pattern.clone()),
        Bson::JavaScriptCode(code) => Value::String(code.clone()),
        Bson::JavaScriptCodeWithScope(code) => Value::String(code.code.clone()),
        Bson::Symbol(s) => Value::String(s.clone()),
        Bson::Undefined | Bson::MinKey | Bson::MaxKey | Bson::DbPointer(_) => Value::Null,
    }
}

/// Convert a BSON document into a `Document`. Duplicate keys collapse,
/// last write wins, as in the driver itself.
pub fn from_bson_document(doc: &bson::Document) -> Document {
    doc.iter()
        .map(|(key, value)| (key.clone(), from_bson(value)))
        .collect()
}
