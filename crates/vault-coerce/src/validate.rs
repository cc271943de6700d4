//! Document validation against inferred field schemas.

use crate::coerce::coerce;
use std::collections::BTreeMap;
use vault_core::{classify, Document, FieldSchema, TypeTag, Value};

/// Outcome of validating one document.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// False iff at least one required field was missing
    pub is_valid: bool,

    /// The validated (possibly coerced) document
    pub document: Value,

    /// Missing required fields
    pub errors: Vec<String>,

    /// Unresolved type mismatches and failed coercions
    pub warnings: Vec<String>,

    /// Number of successful casts applied
    pub casts_performed: usize,
}

/// Validate a document against the field schemas of its collection.
///
/// The input document is deep-copied before any mutation; the caller's value
/// is never modified. Field lookups use the same path-construction rules as
/// inference (dot join, `[]` before array elements), so the schema's path
/// strings resolve verbatim.
pub fn validate(document: &Value, fields: &BTreeMap<String, FieldSchema>) -> ValidationReport {
    let mut working = document.clone();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut casts = 0usize;

    if let Value::Object(obj) = &mut working {
        validate_object(obj, fields, &mut errors, &mut warnings, &mut casts);
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        document: working,
        errors,
        warnings,
        casts_performed: casts,
    }
}

/// Last segment of a field path, which is the plain field name at its level.
fn field_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn validate_object(
    obj: &mut Document,
    fields: &BTreeMap<String, FieldSchema>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
    casts: &mut usize,
) {
    for (path, schema) in fields {
        match obj.get_mut(field_name(path)) {
            None => {
                // Required with zero observed nulls means every sampled
                // document carried the field; absence here is an error.
                if schema.required && !schema.nullable {
                    errors.push(format!("Missing required field: {path}"));
                }
            }
            Some(slot) => validate_field(path, slot, schema, errors, warnings, casts),
        }
    }
}

fn validate_field(
    path: &str,
    slot: &mut Value,
    schema: &FieldSchema,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
    casts: &mut usize,
) {
    let observed = classify(slot);
    let declared = schema.declared_type;

    let constrains = !matches!(declared, TypeTag::Null | TypeTag::Undefined);
    let accepted_null = observed == TypeTag::Null && schema.nullable;

    if constrains && !accepted_null && observed != declared {
        apply_coercion(path, slot, observed, declared, warnings, casts);
    }

    // Recurse into composites with the nested schemas built by inference.
    match (declared, &mut *slot) {
        (TypeTag::Object, Value::Object(nested_obj)) => {
            if let Some(nested) = &schema.nested_fields {
                validate_object(nested_obj, nested, errors, warnings, casts);
            }
        }
        (TypeTag::Array, Value::Array(items)) => {
            let Some(element_type) = schema.array_element_type else {
                return;
            };
            for (index, item) in items.iter_mut().enumerate() {
                let item_observed = classify(item);
                if item_observed != element_type && item_observed != TypeTag::Null {
                    apply_coercion(
                        &format!("{path}[{index}]"),
                        item,
                        item_observed,
                        element_type,
                        warnings,
                        casts,
                    );
                }
                if element_type == TypeTag::Object {
                    if let (Some(nested), Value::Object(nested_obj)) =
                        (&schema.nested_fields, &mut *item)
                    {
                        validate_object(nested_obj, nested, errors, warnings, casts);
                    }
                }
            }
        }
        _ => {}
    }
}

fn apply_coercion(
    path: &str,
    slot: &mut Value,
    observed: TypeTag,
    target: TypeTag,
    warnings: &mut Vec<String>,
    casts: &mut usize,
) {
    match coerce(slot, target) {
        Ok(converted) => {
            tracing::debug!("cast field '{}' from {} to {}", path, observed, target);
            *slot = converted;
            *casts += 1;
        }
        Err(reason) => {
            // Failure keeps the original value; the run continues.
            warnings.push(format!(
                "Field '{path}': expected {target}, found {observed}: {reason}"
            ));
        }
    }
}
