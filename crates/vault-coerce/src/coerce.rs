//! Best-effort conversion of a value to a target type tag.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use vault_core::{
    canonical_number_text, classify, iso8601_text, ObjectId, TypeTag, Value,
};

/// Typed failure reason for a coercion attempt.
///
/// Never propagated as a hard error: the validator turns these into warnings
/// and keeps the original value.
#[derive(Debug, thiserror::Error)]
pub enum CoercionError {
    /// String did not parse as a number
    #[error("cannot parse '{0}' as a number")]
    InvalidNumber(String),

    /// String is not one of the recognized boolean tokens
    #[error("'{0}' is not a recognized boolean token")]
    InvalidBoolean(String),

    /// String did not parse as a date
    #[error("cannot parse '{0}' as a date")]
    InvalidDate(String),

    /// Numeric timestamp outside the representable range
    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(f64),

    /// String is not a valid 24-hex-character identifier
    #[error("'{0}' is not a 24-hex-character object id")]
    InvalidObjectId(String),

    /// No conversion rule exists for this pair
    #[error("cannot coerce {from} to {to}")]
    Unsupported {
        /// Observed type of the value
        from: TypeTag,
        /// Requested target type
        to: TypeTag,
    },
}

/// Parse a datetime string in the formats export is known to produce, plus
/// the common date-only form.
fn parse_datetime_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Numeric timestamps at or above this magnitude are taken as milliseconds
/// since the epoch; smaller values as seconds. Kept verbatim as documented
/// behavior of the export format.
const EPOCH_MILLIS_THRESHOLD: f64 = 10_000_000_000.0;

fn number_to_datetime(n: f64) -> Result<DateTime<Utc>, CoercionError> {
    let millis = if n >= EPOCH_MILLIS_THRESHOLD {
        n as i64
    } else {
        (n * 1000.0) as i64
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(CoercionError::TimestampOutOfRange(n))
}

fn unsupported(value: &Value, to: TypeTag) -> CoercionError {
    CoercionError::Unsupported {
        from: classify(value),
        to,
    }
}

/// Attempt to convert `value` to `target`.
///
/// Identity when the value already matches the target. Returns the converted
/// value or a typed failure; the input is never mutated and a failure leaves
/// nothing half-converted.
pub fn coerce(value: &Value, target: TypeTag) -> Result<Value, CoercionError> {
    if classify(value) == target {
        return Ok(value.clone());
    }

    match target {
        TypeTag::String => Ok(Value::String(to_string_form(value))),
        TypeTag::Number => to_number(value),
        TypeTag::Boolean => to_boolean(value),
        TypeTag::Date => to_date(value),
        TypeTag::ObjectId => to_object_id(value),
        TypeTag::Array => Ok(to_array(value)),
        TypeTag::Object => Ok(to_object(value)),
        // A field whose declared type is null (or absent) constrains nothing.
        TypeTag::Null | TypeTag::Undefined => Ok(value.clone()),
    }
}

fn to_string_form(value: &Value) -> String {
    match value {
        Value::Number(n) => canonical_number_text(*n),
        Value::Bool(b) => b.to_string(),
        Value::DateTime(dt) => iso8601_text(dt),
        Value::ObjectId(oid) => oid.to_hex(),
        // Composites and anything else serialize to their canonical JSON text.
        other => other.to_json().to_string(),
    }
}

fn to_number(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(s) => {
            let parsed: f64 = s
                .trim()
                .parse()
                .map_err(|_| CoercionError::InvalidNumber(s.clone()))?;
            if parsed.is_nan() {
                return Err(CoercionError::InvalidNumber(s.clone()));
            }
            Ok(Value::Number(parsed))
        }
        Value::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::DateTime(dt) => Ok(Value::Number(dt.timestamp_millis() as f64)),
        other => Err(unsupported(other, TypeTag::Number)),
    }
}

fn to_boolean(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(CoercionError::InvalidBoolean(s.clone())),
        },
        Value::Number(n) => Ok(Value::Bool(*n != 0.0)),
        other => Err(unsupported(other, TypeTag::Boolean)),
    }
}

fn to_date(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(s) => parse_datetime_string(s)
            .map(Value::DateTime)
            .ok_or_else(|| CoercionError::InvalidDate(s.clone())),
        Value::Number(n) => number_to_datetime(*n).map(Value::DateTime),
        other => Err(unsupported(other, TypeTag::Date)),
    }
}

fn to_object_id(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(s) => ObjectId::parse_str(s)
            .map(Value::ObjectId)
            .ok_or_else(|| CoercionError::InvalidObjectId(s.clone())),
        other => Err(unsupported(other, TypeTag::ObjectId)),
    }
}

fn to_array(value: &Value) -> Value {
    if let Value::String(s) = value {
        // A string might hold serialized JSON; anything that does not parse
        // to an array wraps as a single element instead.
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(s) {
            if json.is_array() {
                return Value::from_json(&json);
            }
        }
    }
    Value::Array(vec![value.clone()])
}

fn to_object(value: &Value) -> Value {
    if let Value::String(s) = value {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(s) {
            if json.is_object() {
                return Value::from_json(&json);
            }
        }
    }
    Value::Object([("value".to_string(), value.clone())].into())
}
