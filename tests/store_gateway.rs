use classroomd::model::{Classroom, Student};
use classroomd::store::{DataStore, STORAGE_KEY};
use serde_json::json;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn missing_document_reads_as_empty_object() {
    let workspace = temp_dir("classroom-store-missing");
    let store = DataStore::in_workspace(&workspace).expect("store");
    assert_eq!(store.load_document().expect("load"), json!({}));
    assert_eq!(store.load_classroom().expect("classroom"), Classroom::default());
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn saving_classroom_keeps_other_top_level_keys() {
    let workspace = temp_dir("classroom-store-keys");
    let store = DataStore::in_workspace(&workspace).expect("store");
    store
        .save_document(&json!({ "ui-prefs": { "sidebar": "collapsed" } }))
        .expect("seed document");

    let mut classroom = Classroom::default();
    classroom.add_student(Student::new("Ann", "1"));
    store.save_classroom(&classroom).expect("save classroom");

    let doc = store.load_document().expect("load");
    assert_eq!(doc["ui-prefs"]["sidebar"], json!("collapsed"));
    assert_eq!(doc[STORAGE_KEY]["students"][0]["name"], json!("Ann"));
    assert_eq!(store.load_classroom().expect("reload"), classroom);
    assert!(!workspace.join("database.json.saving").exists());
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn corrupt_document_is_a_read_error() {
    let workspace = temp_dir("classroom-store-corrupt");
    std::fs::write(workspace.join("database.json"), "{ nope").expect("write");
    let store = DataStore::in_workspace(&workspace).expect("store");
    let e = store.load_document().expect_err("should fail");
    assert!(format!("{e:#}").contains("not valid JSON"));
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn invalid_classroom_state_is_rejected() {
    let workspace = temp_dir("classroom-store-invalid");
    let store = DataStore::in_workspace(&workspace).expect("store");
    store
        .save_document(&json!({ STORAGE_KEY: { "students": "not a list" } }))
        .expect("seed");
    assert!(store.load_classroom().is_err());
    let _ = std::fs::remove_dir_all(workspace);
}
