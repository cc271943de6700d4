//! Forward conversion: `Value` → BSON value.

use bson::Bson;
use vault_core::{Document, Value};

/// Convert a value into BSON for insertion.
///
/// Integral numbers go back as `Int32`/`Int64` where they fit, matching what
/// the store's own drivers produce; everything else stays `Double`.
pub fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                if *n >= i32::MIN as f64 && *n <= i32::MAX as f64 {
                    Bson::Int32(*n as i32)
                } else if n.abs() < 9.0e15 {
                    Bson::Int64(*n as i64)
                } else {
                    Bson::Double(*n)
                }
            } else {
                Bson::Double(*n)
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::DateTime(dt) => Bson::DateTime(bson::DateTime::from_chrono(*dt)),
        Value::ObjectId(oid) => Bson::ObjectId(bson::oid::ObjectId::from_bytes(oid.bytes())),
        Value::Array(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Value::Object(fields) => Bson::Document(to_bson_document(fields)),
    }
}

/// Convert a document into a BSON document, preserving field order.
pub fn to_bson_document(fields: &Document) -> bson::Document {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), to_bson(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reverse::from_bson;
    use chrono::{TimeZone, Utc};
    use vault_core::ObjectId;

    #[test]
    fn test_round_trip_preserves_tags() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let value = Value::Object(
            [
                (
                    "_id".to_string(),
                    Value::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap()),
                ),
                ("when".to_string(), Value::DateTime(dt)),
                ("count".to_string(), Value::Number(7.0)),
                ("ratio".to_string(), Value::Number(0.5)),
                (
                    "items".to_string(),
                    Value::Array(vec![Value::String("x".to_string())]),
                ),
            ]
            .into(),
        );
        assert_eq!(from_bson(&to_bson(&value)), value);
    }

    #[test]
    fn test_integral_numbers_narrow() {
        assert_eq!(to_bson(&Value::Number(7.0)), Bson::Int32(7));
        assert_eq!(
            to_bson(&Value::Number(5_000_000_000.0)),
            Bson::Int64(5_000_000_000)
        );
        assert_eq!(to_bson(&Value::Number(0.25)), Bson::Double(0.25));
    }
}
