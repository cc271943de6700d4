//! Relational projection of collection schemas and documents.
//!
//! Field paths flatten into column names by replacing the `[]` array marker
//! with `_array` and the dot separator with an underscore, e.g.
//! `tags[].name` → `tags_array_name`. Two distinct paths can in principle
//! flatten to the same column; the projector fails loudly on such a
//! collision instead of silently overwriting a column definition.
//!
//! Row emission flattens each document with the same path rules. A column
//! present in the schema but absent from a document's flattening is simply
//! omitted from that row's statement, not padded with NULL; arrays flatten
//! as JSON text under their own path. The emitted SQL targets a generic
//! ANSI-ish subset and is a derived artifact, not a verified migration.

use std::collections::BTreeMap;
use vault_core::{
    canonical_number_text, CollectionSchema, FieldSchema, TypeTag, Value,
};

/// Error type for projection.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Two field paths flattened to the same column name
    #[error("column name collision in '{collection}': '{first_path}' and '{second_path}' both flatten to '{column}'")]
    ColumnCollision {
        /// Collection being projected
        collection: String,
        /// Colliding column name
        column: String,
        /// Path that claimed the column first
        first_path: String,
        /// Path that collided with it
        second_path: String,
    },
}

/// Result of projecting one collection.
#[derive(Debug, Clone)]
pub struct Projection {
    /// CREATE TABLE statement
    pub ddl: String,
    /// One INSERT statement per document with at least one mapped column
    pub inserts: Vec<String>,
}

impl Projection {
    /// The full migration text for this collection: DDL followed by DML.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.ddl);
        out.push('\n');
        for insert in &self.inserts {
            out.push_str(insert);
            out.push('\n');
        }
        out
    }
}

/// Flatten a field path into a column name.
pub fn column_name(path: &str) -> String {
    path.replace("[]", "_array").replace('.', "_")
}

/// Fixed mapping from type tags to relational column types.
pub fn column_type(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::String => "TEXT",
        TypeTag::Number => "DECIMAL(18,6)",
        TypeTag::Boolean => "BOOLEAN",
        TypeTag::Date => "DATETIME",
        TypeTag::ObjectId => "VARCHAR(24)",
        // Composites and untyped columns carry text-encoded JSON.
        TypeTag::Array | TypeTag::Object => "TEXT",
        TypeTag::Null | TypeTag::Undefined => "TEXT",
    }
}

/// Render a value as a SQL literal. Embedded quotes double; null renders as
/// the unquoted NULL literal.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Number(n) => canonical_number_text(*n),
        Value::String(s) => quote(s),
        Value::DateTime(dt) => quote(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::ObjectId(oid) => quote(&oid.to_hex()),
        Value::Array(_) | Value::Object(_) => quote(&value.to_json().to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

struct ColumnDef {
    path: String,
    name: String,
    tag: TypeTag,
}

/// Project a collection schema and its documents into DDL and row inserts.
pub fn project(
    collection: &str,
    schema: &CollectionSchema,
    documents: &[Value],
) -> Result<Projection, ProjectionError> {
    let columns = collect_columns(collection, &schema.fields)?;
    let ddl = render_ddl(collection, &columns);
    let inserts = documents
        .iter()
        .filter_map(|doc| render_insert(collection, &columns, doc))
        .collect();
    Ok(Projection { ddl, inserts })
}

fn collect_columns(
    collection: &str,
    fields: &BTreeMap<String, FieldSchema>,
) -> Result<Vec<ColumnDef>, ProjectionError> {
    let mut columns = Vec::new();
    gather(fields, &mut columns);

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for column in &columns {
        if let Some(first_path) = seen.insert(column.name.clone(), column.path.clone()) {
            return Err(ProjectionError::ColumnCollision {
                collection: collection.to_string(),
                column: column.name.clone(),
                first_path,
                second_path: column.path.clone(),
            });
        }
    }
    Ok(columns)
}

fn gather(fields: &BTreeMap<String, FieldSchema>, out: &mut Vec<ColumnDef>) {
    for (path, schema) in fields {
        match (&schema.nested_fields, schema.declared_type) {
            // Object fields and arrays of objects contribute their leaves.
            (Some(nested), TypeTag::Object | TypeTag::Array) => gather(nested, out),
            _ => out.push(ColumnDef {
                path: path.clone(),
                name: column_name(path),
                tag: schema.declared_type,
            }),
        }
    }
}

fn render_ddl(collection: &str, columns: &[ColumnDef]) -> String {
    let mut lines = Vec::new();
    let has_id = columns.iter().any(|c| c.path == "_id");
    if !has_id {
        // Synthetic identifier primary key, prepended.
        lines.push("  _id VARCHAR(24) PRIMARY KEY".to_string());
    }
    for column in columns {
        let mut line = format!("  {} {}", column.name, column_type(column.tag));
        if column.path == "_id" {
            line.push_str(" PRIMARY KEY");
        }
        lines.push(line);
    }
    format!(
        "CREATE TABLE {} (\n{}\n);",
        collection,
        lines.join(",\n")
    )
}

/// Flatten a document into path → value leaves, using the same path rules as
/// schema inference. Arrays stay whole and serialize as JSON text.
fn flatten_value(prefix: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            for (name, nested) in fields {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten_value(&path, nested, out);
            }
        }
        other => out.push((prefix.to_string(), other.clone())),
    }
}

fn render_insert(collection: &str, columns: &[ColumnDef], document: &Value) -> Option<String> {
    let mut leaves = Vec::new();
    flatten_value("", document, &mut leaves);

    let by_column: BTreeMap<String, Value> = leaves
        .into_iter()
        .map(|(path, value)| (column_name(&path), value))
        .collect();

    let mut names = Vec::new();
    let mut values = Vec::new();
    for column in columns {
        if let Some(value) = by_column.get(&column.name) {
            names.push(column.name.as_str());
            values.push(sql_literal(value));
        }
    }
    if names.is_empty() {
        return None;
    }
    Some(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        collection,
        names.join(", "),
        values.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vault_core::{infer_fields, CollectionStats, ObjectId};

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn schema_for(name: &str, docs: &[Value]) -> CollectionSchema {
        CollectionSchema {
            name: name.to_string(),
            fields: infer_fields(docs),
            indexes: vec![],
            stats: CollectionStats::default(),
        }
    }

    #[test]
    fn test_column_naming_rule() {
        assert_eq!(column_name("tags[].name"), "tags_array_name");
        assert_eq!(column_name("address.city"), "address_city");
        assert_eq!(column_name("age"), "age");
    }

    #[test]
    fn test_literal_formatting() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(sql_literal(&Value::Null), "NULL");
        assert_eq!(sql_literal(&Value::Bool(true)), "1");
        assert_eq!(sql_literal(&Value::Bool(false)), "0");
        assert_eq!(sql_literal(&Value::Number(34.0)), "34");
        assert_eq!(
            sql_literal(&Value::String("it's".to_string())),
            "'it''s'"
        );
        assert_eq!(sql_literal(&Value::DateTime(dt)), "'2024-01-02 03:04:05'");
        assert_eq!(
            sql_literal(&Value::ObjectId(
                ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap()
            )),
            "'507f1f77bcf86cd799439011'"
        );
        assert_eq!(
            sql_literal(&Value::Array(vec![Value::Number(1.0)])),
            "'[1]'"
        );
    }

    #[test]
    fn test_synthetic_primary_key_prepended() {
        let docs = vec![obj(vec![("age", Value::Number(1.0))])];
        let schema = schema_for("users", &docs);
        let projection = project("users", &schema, &docs).unwrap();
        assert!(projection.ddl.starts_with(
            "CREATE TABLE users (\n  _id VARCHAR(24) PRIMARY KEY,\n  age DECIMAL(18,6)"
        ));
    }

    #[test]
    fn test_declared_id_becomes_primary_key() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let docs = vec![obj(vec![
            ("_id", Value::ObjectId(oid)),
            ("name", Value::String("a".to_string())),
        ])];
        let schema = schema_for("users", &docs);
        let projection = project("users", &schema, &docs).unwrap();
        assert!(projection.ddl.contains("_id VARCHAR(24) PRIMARY KEY"));
        // Exactly one primary key column.
        assert_eq!(projection.ddl.matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_array_of_objects_flattens_and_rows_omit_absent_columns() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let docs = vec![obj(vec![
            ("_id", Value::ObjectId(oid)),
            (
                "tags",
                Value::Array(vec![
                    obj(vec![("name", Value::String("a".to_string()))]),
                    obj(vec![("name", Value::String("b".to_string()))]),
                ]),
            ),
        ])];
        let schema = schema_for("posts", &docs);
        let projection = project("posts", &schema, &docs).unwrap();

        assert!(projection.ddl.contains("tags_array_name TEXT"));
        // The document's own flattening has no tags_array_name leaf, so the
        // row statement carries only the identifier column.
        assert_eq!(projection.inserts.len(), 1);
        assert_eq!(
            projection.inserts[0],
            "INSERT INTO posts (_id) VALUES ('507f1f77bcf86cd799439011');"
        );
    }

    #[test]
    fn test_scalar_array_serializes_as_json_text() {
        let docs = vec![obj(vec![(
            "scores",
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
        )])];
        let schema = schema_for("games", &docs);
        let projection = project("games", &schema, &docs).unwrap();
        assert!(projection.ddl.contains("scores TEXT"));
        assert_eq!(
            projection.inserts[0],
            "INSERT INTO games (scores) VALUES ('[1,2]');"
        );
    }

    #[test]
    fn test_nested_object_columns() {
        let docs = vec![obj(vec![(
            "address",
            obj(vec![
                ("city", Value::String("Kyoto".to_string())),
                ("zip", Value::Number(600.0)),
            ]),
        )])];
        let schema = schema_for("users", &docs);
        let projection = project("users", &schema, &docs).unwrap();
        assert!(projection.ddl.contains("address_city TEXT"));
        assert!(projection.ddl.contains("address_zip DECIMAL(18,6)"));
        assert_eq!(
            projection.inserts[0],
            "INSERT INTO users (address_city, address_zip) VALUES ('Kyoto', 600);"
        );
    }

    #[test]
    fn test_column_collision_fails_loudly() {
        // `a.b` and `a_b` flatten to the same column name.
        let docs = vec![obj(vec![
            ("a", obj(vec![("b", Value::Number(1.0))])),
            ("a_b", Value::Number(2.0)),
        ])];
        let schema = schema_for("t", &docs);
        let err = project("t", &schema, &docs).unwrap_err();
        match err {
            ProjectionError::ColumnCollision { column, .. } => assert_eq!(column, "a_b"),
        }
    }
}
