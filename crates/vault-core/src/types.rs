//! Semantic type tags and total value classification.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of semantic type tags observed in documents.
///
/// Every decoded value classifies to exactly one tag. `Undefined` marks
/// field absence and is never produced by [`classify`] for a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeTag {
    /// Explicit null
    Null,

    /// Absent field
    Undefined,

    /// UTF-8 string
    String,

    /// 64-bit floating point number
    Number,

    /// Boolean
    Boolean,

    /// Date/time with timezone
    Date,

    /// 12-byte document identifier (24 hex characters in text form)
    ObjectId,

    /// Array of values
    Array,

    /// Nested document
    Object,
}

impl TypeTag {
    /// Stable textual name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Undefined => "undefined",
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Date => "date",
            TypeTag::ObjectId => "object-id",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a value into its semantic type tag.
///
/// Total and pure. The specialized composites (array, date, identifier) have
/// their own variants in [`Value`], so they can never fall through to the
/// generic `object` tag.
pub fn classify(value: &Value) -> TypeTag {
    match value {
        Value::Null => TypeTag::Null,
        Value::Array(_) => TypeTag::Array,
        Value::DateTime(_) => TypeTag::Date,
        Value::ObjectId(_) => TypeTag::ObjectId,
        Value::Bool(_) => TypeTag::Boolean,
        Value::Number(_) => TypeTag::Number,
        Value::String(_) => TypeTag::String,
        Value::Object(_) => TypeTag::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectId;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn all_sample_values() -> Vec<(Value, TypeTag)> {
        vec![
            (Value::Null, TypeTag::Null),
            (Value::Bool(true), TypeTag::Boolean),
            (Value::Number(1.5), TypeTag::Number),
            (Value::String("x".to_string()), TypeTag::String),
            (Value::DateTime(Utc::now()), TypeTag::Date),
            (
                Value::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap()),
                TypeTag::ObjectId,
            ),
            (Value::Array(vec![Value::Null]), TypeTag::Array),
            (Value::Object(BTreeMap::new()), TypeTag::Object),
        ]
    }

    #[test]
    fn test_classification_is_total() {
        for (value, expected) in all_sample_values() {
            assert_eq!(classify(&value), expected);
        }
    }

    #[test]
    fn test_array_never_classifies_as_object() {
        let arr = Value::Array(vec![Value::Object(BTreeMap::new())]);
        assert_eq!(classify(&arr), TypeTag::Array);
    }

    #[test]
    fn test_date_and_object_id_round_trip_to_string_through_json() {
        // The documented boundary: plain JSON loses the date and object-id
        // tags. All other tags survive a JSON round trip.
        for (value, tag) in all_sample_values() {
            let round_tripped = Value::from_json(&value.to_json());
            let expected = match tag {
                TypeTag::Date | TypeTag::ObjectId => TypeTag::String,
                other => other,
            };
            assert_eq!(classify(&round_tripped), expected);
        }
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(TypeTag::ObjectId.as_str(), "object-id");
        assert_eq!(
            serde_json::to_string(&TypeTag::ObjectId).unwrap(),
            "\"object-id\""
        );
        assert_eq!(TypeTag::Date.to_string(), "date");
    }
}
