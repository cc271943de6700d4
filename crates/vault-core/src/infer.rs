//! Schema inference over a sample of heterogeneous documents.
//!
//! Walks every field of every document, accumulating a per-path per-tag
//! frequency table, then reduces each path to a single [`FieldSchema`] by
//! arg-max over the table.

use crate::schema::FieldSchema;
use crate::types::{classify, TypeTag};
use crate::value::{Document, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct PathStats {
    counts: BTreeMap<TypeTag, u64>,
    present: u64,
}

/// Infer per-field-path schemas from a document sample.
///
/// An empty sample yields an empty schema; callers treat that as "skip this
/// collection". Non-object entries in the sample are ignored.
pub fn infer_fields(documents: &[Value]) -> BTreeMap<String, FieldSchema> {
    let mut table: BTreeMap<String, PathStats> = BTreeMap::new();
    let mut visits: BTreeMap<String, u64> = BTreeMap::new();

    for document in documents {
        if let Value::Object(fields) = document {
            walk_object("", fields, &mut table, &mut visits);
        }
    }

    build_level("", &table, &visits)
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn walk_object(
    prefix: &str,
    fields: &Document,
    table: &mut BTreeMap<String, PathStats>,
    visits: &mut BTreeMap<String, u64>,
) {
    *visits.entry(prefix.to_string()).or_default() += 1;

    for (name, value) in fields {
        let path = join_path(prefix, name);
        let stats = table.entry(path.clone()).or_default();
        *stats.counts.entry(classify(value)).or_default() += 1;
        stats.present += 1;

        match value {
            Value::Object(nested) => walk_object(&path, nested, table, visits),
            Value::Array(items) if !items.is_empty() => {
                // The `[]` marker extends the path before descending into
                // elements, so element fields key as `path[].name`.
                let element_path = format!("{path}[]");
                for item in items {
                    let stats = table.entry(element_path.clone()).or_default();
                    *stats.counts.entry(classify(item)).or_default() += 1;
                    stats.present += 1;
                    if let Value::Object(nested) = item {
                        walk_object(&element_path, nested, table, visits);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Tie-break priority when two tags share the highest frequency: the more
/// structured tag wins. Fixed and documented rather than iteration-order
/// dependent.
fn tie_break_priority(tag: TypeTag) -> u8 {
    match tag {
        TypeTag::Object => 8,
        TypeTag::Array => 7,
        TypeTag::Date => 6,
        TypeTag::ObjectId => 5,
        TypeTag::Boolean => 4,
        TypeTag::Number => 3,
        TypeTag::String => 2,
        TypeTag::Undefined => 1,
        TypeTag::Null => 0,
    }
}

fn declared_type(counts: &BTreeMap<TypeTag, u64>) -> TypeTag {
    counts
        .iter()
        .max_by_key(|(tag, count)| (**count, tie_break_priority(**tag)))
        .map(|(tag, _)| *tag)
        .unwrap_or(TypeTag::Undefined)
}

fn strip_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        Some(path)
    } else {
        path.strip_prefix(prefix)?.strip_prefix('.')
    }
}

fn build_level(
    prefix: &str,
    table: &BTreeMap<String, PathStats>,
    visits: &BTreeMap<String, u64>,
) -> BTreeMap<String, FieldSchema> {
    let parent_visits = visits.get(prefix).copied().unwrap_or(0);
    let mut out = BTreeMap::new();

    for (path, stats) in table {
        let rest = match strip_prefix(prefix, path) {
            Some(rest) => rest,
            None => continue,
        };
        // Only direct children of this level; `[]` pseudo-paths are folded
        // into their array field below.
        if rest.contains('.') || rest.contains("[]") {
            continue;
        }

        let declared = declared_type(&stats.counts);
        let mut schema = FieldSchema {
            declared_type: declared,
            nullable: stats.counts.get(&TypeTag::Null).copied().unwrap_or(0) > 0,
            sample_count: stats.counts.values().copied().max().unwrap_or(0),
            required: parent_visits > 0 && stats.present == parent_visits,
            nested_fields: None,
            array_element_type: None,
        };

        match declared {
            TypeTag::Object => {
                let nested = build_level(path, table, visits);
                if !nested.is_empty() {
                    schema.nested_fields = Some(nested);
                }
            }
            TypeTag::Array => {
                let element_path = format!("{path}[]");
                if let Some(element_stats) = table.get(&element_path) {
                    let element_type = declared_type(&element_stats.counts);
                    schema.array_element_type = Some(element_type);
                    if element_type == TypeTag::Object {
                        let nested = build_level(&element_path, table, visits);
                        if !nested.is_empty() {
                            schema.nested_fields = Some(nested);
                        }
                    }
                }
            }
            _ => {}
        }

        out.insert(path.clone(), schema);
    }

    out
}
