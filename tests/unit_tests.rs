//! End-to-end orchestrator tests against the in-memory stores.

use mongovault::config::ImportOpts;
use mongovault::files::{layout, FileStore};
use mongovault::testing::{MemoryFileStore, MemoryStore};
use mongovault::{run_export, run_import};
use vault_core::{
    classify, infer_fields, CollectionSchema, CollectionStats, DatabaseSchema, IndexSpec,
    ObjectId, TypeTag, Value,
};

fn obj(pairs: Vec<(&str, Value)>) -> Value {
    Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn sample_user(id: &str, age: f64) -> Value {
    obj(vec![
        (
            "_id",
            Value::ObjectId(ObjectId::parse_str(id).unwrap()),
        ),
        ("age", Value::Number(age)),
        ("created", Value::DateTime(chrono::Utc::now())),
        ("name", Value::String(format!("user-{age}"))),
    ])
}

fn manifest_for(name: &str, sample: &[Value], indexes: Vec<IndexSpec>) -> DatabaseSchema {
    let mut manifest = DatabaseSchema::new("shop");
    manifest.add_collection(CollectionSchema {
        name: name.to_string(),
        fields: infer_fields(sample),
        indexes,
        stats: CollectionStats::default(),
    });
    manifest
}

async fn write_artifacts(files: &MemoryFileStore, manifest: &DatabaseSchema, documents: &[Value]) {
    let (name, _) = manifest.collections.iter().next().unwrap();
    let data = serde_json::Value::Array(documents.iter().map(Value::to_json).collect());
    files
        .write_text(
            &layout::data_file(name),
            &serde_json::to_string_pretty(&data).unwrap(),
        )
        .await
        .unwrap();
    files
        .write_text(layout::DATABASE_SCHEMA, &manifest.to_pretty_json().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_export_writes_all_artifacts() {
    let store = MemoryStore::new();
    store.seed(
        "users",
        vec![
            sample_user("507f1f77bcf86cd799439011", 30.0),
            sample_user("507f1f77bcf86cd799439012", 40.0),
        ],
    );
    store.seed_indexes(
        "users",
        vec![
            IndexSpec {
                name: "_id_".to_string(),
                key: vec![("_id".to_string(), serde_json::json!(1))],
                unique: false,
                sparse: false,
                partial_filter_expression: None,
            },
            IndexSpec {
                name: "name_1".to_string(),
                key: vec![("name".to_string(), serde_json::json!(1))],
                unique: true,
                sparse: false,
                partial_filter_expression: None,
            },
        ],
    );
    store.seed("empty", vec![]);
    let files = MemoryFileStore::new();

    let summary = run_export(&store, &files, "shop").await.unwrap();
    assert_eq!(summary.collections_exported, 1);
    assert_eq!(summary.collections_skipped, 1);
    assert_eq!(summary.documents_exported, 2);
    assert_eq!(summary.errors, 0);

    let paths = files.paths();
    for expected in [
        "data/users.json",
        "schema/users_schema.json",
        "schema/database_schema.json",
        "migration/users.sql",
        "migration/complete_migration.sql",
        "migration/recreate_indexes.js",
    ] {
        assert!(paths.contains(&expected.to_string()), "missing {expected}");
    }

    let manifest =
        DatabaseSchema::from_json(&files.read_text(layout::DATABASE_SCHEMA).await.unwrap())
            .unwrap();
    assert_eq!(manifest.total_collections, 1);
    let users = manifest.collection("users").unwrap();
    assert_eq!(users.fields["_id"].declared_type, TypeTag::ObjectId);
    assert_eq!(users.fields["created"].declared_type, TypeTag::Date);
    assert_eq!(users.fields["age"].declared_type, TypeTag::Number);

    // The native index script recreates only the secondary index.
    let script = files.read_text(layout::INDEX_SCRIPT).await.unwrap();
    assert!(script.contains("db.users.createIndex({\"name\": 1}, {name: \"name_1\", unique: true});"));
    assert!(!script.contains("_id_"));

    let sql = files.read_text(layout::COMPLETE_MIGRATION).await.unwrap();
    assert!(sql.contains("CREATE TABLE users"));
    assert!(sql.contains("INSERT INTO users"));
}

#[tokio::test]
async fn test_export_import_round_trip_restores_tags() {
    let source = MemoryStore::new();
    source.seed(
        "users",
        vec![
            sample_user("507f1f77bcf86cd799439011", 30.0),
            sample_user("507f1f77bcf86cd799439012", 40.0),
        ],
    );
    let files = MemoryFileStore::new();
    run_export(&source, &files, "shop").await.unwrap();

    // The persisted JSON flattened dates and ids to strings; import coerces
    // them back using the schema manifest.
    let target = MemoryStore::new();
    let summary = run_import(&target, &files, &ImportOpts::default())
        .await
        .unwrap();
    assert!(target.was_dropped());
    assert_eq!(summary.documents_imported, 2);
    assert_eq!(summary.documents_skipped, 0);
    // Two string-typed fields recovered per document.
    assert_eq!(summary.casts_performed, 4);
    assert_eq!(summary.validation_warnings, 0);

    let imported = target.documents("users");
    assert_eq!(imported.len(), 2);
    for document in &imported {
        let fields = document.as_object().unwrap();
        assert_eq!(classify(&fields["_id"]), TypeTag::ObjectId);
        assert_eq!(classify(&fields["created"]), TypeTag::Date);
        assert_eq!(classify(&fields["age"]), TypeTag::Number);
        assert_eq!(classify(&fields["name"]), TypeTag::String);
    }
}

#[tokio::test]
async fn test_import_batching_with_mid_batch_failure() {
    let documents: Vec<Value> = (0..2500)
        .map(|i| obj(vec![("n", Value::Number(i as f64))]))
        .collect();
    let manifest = manifest_for("events", &documents[..100], vec![]);
    let files = MemoryFileStore::new();
    write_artifacts(&files, &manifest, &documents).await;

    let store = MemoryStore::new();
    // Second of the three bulk inserts fails; its documents fall back to
    // per-document inserts, the other batches stay bulk.
    store.fail_batch(1);

    let opts = ImportOpts {
        batch_size: 1000,
        ..Default::default()
    };
    let summary = run_import(&store, &files, &opts).await.unwrap();

    assert_eq!(store.recorded_batch_sizes(), vec![1000, 1000, 500]);
    assert_eq!(summary.documents_imported, 2500);
    assert_eq!(summary.documents_skipped, 0);
    assert_eq!(store.documents("events").len(), 2500);
}

#[tokio::test]
async fn test_import_requires_manifest() {
    let store = MemoryStore::new();
    let files = MemoryFileStore::new();
    let error = run_import(&store, &files, &ImportOpts::default())
        .await
        .unwrap_err();
    assert!(error.to_string().contains("No export manifest"));
    // The store was never touched.
    assert!(!store.was_dropped());
}

#[tokio::test]
async fn test_skip_invalid_documents() {
    let sample = vec![
        obj(vec![
            ("name", Value::String("a".to_string())),
            ("age", Value::Number(1.0)),
        ]),
        obj(vec![
            ("name", Value::String("b".to_string())),
            ("age", Value::Number(2.0)),
        ]),
    ];
    let manifest = manifest_for("users", &sample, vec![]);
    let documents = vec![
        obj(vec![
            ("name", Value::String("ok".to_string())),
            ("age", Value::String("34".to_string())),
        ]),
        // Missing required age.
        obj(vec![("name", Value::String("broken".to_string()))]),
    ];
    let files = MemoryFileStore::new();
    write_artifacts(&files, &manifest, &documents).await;

    let store = MemoryStore::new();
    let opts = ImportOpts {
        skip_invalid: true,
        ..Default::default()
    };
    let summary = run_import(&store, &files, &opts).await.unwrap();

    assert_eq!(summary.documents_imported, 1);
    assert_eq!(summary.documents_skipped, 1);
    assert_eq!(summary.validation_errors, 1);
    assert_eq!(summary.casts_performed, 1);
    let imported = store.documents("users");
    assert_eq!(imported.len(), 1);
    assert_eq!(
        imported[0].as_object().unwrap()["age"],
        Value::Number(34.0)
    );
}

#[tokio::test]
async fn test_collection_filter_and_index_recreation() {
    let sample = vec![obj(vec![("x", Value::Number(1.0))])];
    let secondary = IndexSpec {
        name: "x_1".to_string(),
        key: vec![("x".to_string(), serde_json::json!(-1))],
        unique: false,
        sparse: true,
        partial_filter_expression: None,
    };
    let primary = IndexSpec {
        name: "_id_".to_string(),
        key: vec![("_id".to_string(), serde_json::json!(1))],
        unique: false,
        sparse: false,
        partial_filter_expression: None,
    };

    let mut manifest = DatabaseSchema::new("shop");
    manifest.add_collection(CollectionSchema {
        name: "kept".to_string(),
        fields: infer_fields(&sample),
        indexes: vec![primary, secondary],
        stats: CollectionStats::default(),
    });
    manifest.add_collection(CollectionSchema {
        name: "filtered".to_string(),
        fields: infer_fields(&sample),
        indexes: vec![],
        stats: CollectionStats::default(),
    });

    let files = MemoryFileStore::new();
    let data =
        serde_json::to_string(&serde_json::Value::Array(vec![sample[0].to_json()])).unwrap();
    files
        .write_text(&layout::data_file("kept"), &data)
        .await
        .unwrap();
    files
        .write_text(&layout::data_file("filtered"), &data)
        .await
        .unwrap();
    files
        .write_text(layout::DATABASE_SCHEMA, &manifest.to_pretty_json().unwrap())
        .await
        .unwrap();

    let store = MemoryStore::new();
    let opts = ImportOpts {
        collections: vec!["kept".to_string()],
        no_drop: true,
        ..Default::default()
    };
    let summary = run_import(&store, &files, &opts).await.unwrap();

    assert_eq!(summary.collections_imported, 1);
    assert_eq!(summary.indexes_created, 1);
    assert_eq!(summary.index_failures, 0);
    assert_eq!(store.documents("kept").len(), 1);
    assert!(store.documents("filtered").is_empty());
    // Only the secondary index was recreated.
    let indexes = store.collection_indexes("kept");
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].name, "x_1");
}
