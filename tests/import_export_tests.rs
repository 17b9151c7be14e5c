//! Integration tests for export, import and merge.
//!
//! These tests run the full parse, classify, resolve and persist path against
//! both store implementations.

use testdoc::db::export::{encode_transfer, export_projects};
use testdoc::db::import::{ImportMode, import_bytes, prepare_import};
use testdoc::db::{Database, MemoryStore, ProjectStore};
use testdoc::error::{Error, ErrorCode};
use testdoc::export::TransferFile;
use testdoc::export::classify::detect_conflicts;
use testdoc::export::diff::{FieldValue, ProjectField};
use testdoc::export::merge::merge_projects;
use testdoc::types::{Project, TestRecord};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn test_record(id: &str, name: &str) -> TestRecord {
    TestRecord {
        id: id.to_string(),
        name: name.to_string(),
        environment: "QA".to_string(),
        created_at: "2024-01-02T00:00:00Z".to_string(),
        ..Default::default()
    }
}

fn project(id: &str, name: &str, tests: Vec<TestRecord>) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        environments: vec!["QA".to_string()],
        tests,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        ..Default::default()
    }
}

fn json_bytes(projects: Vec<Project>) -> Vec<u8> {
    TransferFile::new(projects)
        .to_json_pretty()
        .expect("encode")
        .into_bytes()
}

mod scenario_tests {
    use super::*;

    #[test]
    fn import_into_empty_store_has_no_conflicts() {
        let db = setup_db();
        let bytes = br#"{"projects":[{"id":"p1","name":"Web","environments":["QA"],"data":{"QA":{"url":"x"}},"tests":[],"createdAt":"2024-01-01T00:00:00Z"}]}"#;

        let pending = prepare_import(&db, bytes).unwrap();
        assert_eq!(pending.classification.new_projects.len(), 1);
        assert!(!pending.has_conflicts());
        assert!(pending.classification.identical_projects.is_empty());

        pending.apply(&db, ImportMode::Overwrite).unwrap();
        let stored = db.get_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data["QA"]["url"], "x");
    }

    #[test]
    fn conflicting_project_merges_keep_local() {
        let db = setup_db();
        db.bulk_insert(&[project("p1", "Web", vec![test_record("t1", "Login")])])
            .unwrap();

        let incoming = vec![project(
            "p1",
            "Web",
            vec![test_record("t1", "Login v2"), test_record("t2", "Logout")],
        )];
        let pending = prepare_import(&db, &json_bytes(incoming)).unwrap();

        assert_eq!(pending.classification.conflicting_projects.len(), 1);
        let diff = pending.classification.diffs().remove(0);
        assert!(diff.fields.is_empty());
        assert_eq!(diff.tests.added.len(), 1);
        assert_eq!(diff.tests.added[0].id, "t2");
        assert_eq!(diff.tests.modified.len(), 1);
        assert_eq!(diff.tests.modified[0].current.name, "Login");
        assert!(diff.tests.removed.is_empty());

        let report = pending.apply(&db, ImportMode::Merge).unwrap();
        assert_eq!(report.tests_added, 1);

        let stored = db.require("p1").unwrap();
        let names: Vec<&str> = stored.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Login", "Logout"]);
    }

    #[test]
    fn renamed_project_reports_single_name_change() {
        let current = vec![project("p1", "Old", vec![])];
        let incoming = vec![project("p1", "New", vec![])];

        let result = detect_conflicts(&current, &incoming);
        let diff = result.diffs().remove(0);
        assert_eq!(diff.fields.len(), 1);

        let change = diff.field(ProjectField::Name).unwrap();
        assert_eq!(change.current, FieldValue::Text("Old".to_string()));
        assert_eq!(change.incoming, FieldValue::Text("New".to_string()));
    }

    #[test]
    fn overwrite_discards_local_only_projects() {
        let store = MemoryStore::with_projects(vec![
            project("keep", "Keep", vec![]),
            project("gone", "Gone", vec![]),
        ]);
        let bytes = json_bytes(vec![project("keep", "Keep", vec![]), project("new", "New", vec![])]);

        let report = import_bytes(&store, &bytes, ImportMode::Overwrite).unwrap();
        assert_eq!(report.discarded, vec!["gone".to_string()]);
        assert_eq!(report.identical_projects, 1);

        let ids: Vec<String> = store.get_all().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["keep", "new"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let collection = vec![
            project("a", "A", vec![test_record("t1", "One")]),
            project("b", "B", vec![]),
        ];
        assert_eq!(merge_projects(&collection, &collection), collection);

        let db = setup_db();
        db.bulk_insert(&collection).unwrap();
        import_bytes(&db, &json_bytes(collection.clone()), ImportMode::Merge).unwrap();
        assert_eq!(db.get_all().unwrap(), collection);
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn invalid_json_is_parse_error() {
        let db = setup_db();
        let err = prepare_import(&db, b"{ projects: ").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn wrong_shape_is_schema_error() {
        let db = setup_db();
        db.bulk_insert(&[project("a", "A", vec![])]).unwrap();

        let bodies: [&[u8]; 3] = [
            br#"[]"#,
            br#"{"projects": {}}"#,
            br#"{"projects": [{"name": "no id"}]}"#,
        ];
        for body in bodies {
            let err = import_bytes(&db, body, ImportMode::Overwrite).unwrap_err();
            assert_eq!(err.code(), ErrorCode::SchemaError, "body: {:?}", body);
        }
        assert_eq!(db.get_all().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_ids_fail_overwrite_atomically() {
        let db = setup_db();
        let original = vec![project("a", "A", vec![])];
        db.bulk_insert(&original).unwrap();

        let bytes = json_bytes(vec![project("d", "D", vec![]), project("d", "D2", vec![])]);
        let err = import_bytes(&db, &bytes, ImportMode::Overwrite).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(db.get_all().unwrap(), original);

        let store = MemoryStore::with_projects(original.clone());
        let err = import_bytes(&store, &bytes, ImportMode::Overwrite).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PersistenceError);
        assert_eq!(store.get_all().unwrap(), original);
    }
}

mod roundtrip_tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Project> {
        let mut p = project("p1", "Checkout", vec![test_record("t1", "Pay by card")]);
        p.environments.push("Prod".to_string());
        p.data.insert(
            "QA".to_string(),
            [("host".to_string(), "qa.example".to_string())]
                .into_iter()
                .collect(),
        );
        p.data.insert("Prod".to_string(), Default::default());
        vec![p, project("p2", "Search", vec![])]
    }

    #[test]
    fn export_then_import_into_fresh_store() {
        let source = setup_db();
        source.bulk_insert(&sample()).unwrap();

        let file = export_projects(&source).unwrap();
        let json = encode_transfer(&file, false).unwrap();

        let target = setup_db();
        let pending = prepare_import(&target, &json).unwrap();
        assert_eq!(pending.classification.new_projects.len(), 2);
        pending.apply(&target, ImportMode::Overwrite).unwrap();

        assert_eq!(target.get_all().unwrap(), source.get_all().unwrap());
    }

    #[test]
    fn gzip_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_export_2024-01-01.json.gz");

        let store = MemoryStore::with_projects(sample());
        let file = export_projects(&store).unwrap();
        std::fs::write(&path, encode_transfer(&file, true).unwrap()).unwrap();

        let loaded = TransferFile::from_file(&path).unwrap();
        assert_eq!(loaded, file);

        // Re-importing an identical export changes nothing
        let result = detect_conflicts(&store.get_all().unwrap(), &loaded.projects);
        assert_eq!(result.identical_projects.len(), 2);
        assert!(!result.has_conflicts());
    }

    #[test]
    fn template_is_importable() {
        let template = TransferFile::template();
        let bytes = template.to_json_pretty().unwrap().into_bytes();

        let db = setup_db();
        let report = import_bytes(&db, &bytes, ImportMode::Merge).unwrap();
        assert_eq!(report.new_projects, 1);

        let stored = db.require("template-project-id").unwrap();
        assert_eq!(stored.environments.len(), 2);
        assert!(stored.tests.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = TransferFile::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IoError);
    }
}
