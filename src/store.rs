//! The persistence gateway: one JSON document on disk, read and written whole.
//!
//! There is no locking. `update` is a read-modify-write, so two writers that
//! interleave (two browser tabs, two processes) can silently drop each
//! other's changes; the last save wins.

use crate::model::Classroom;
use anyhow::{anyhow, Context};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DATA_FILE_NAME: &str = "database.json";
/// Document key the classroom state is stored under.
pub const STORAGE_KEY: &str = "teacher-assistant-storage";

#[derive(Debug, Clone)]
pub struct DataStore {
    path: PathBuf,
}

impl DataStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
        Ok(Self { path })
    }

    pub fn in_workspace(workspace: &Path) -> anyhow::Result<Self> {
        Self::open(workspace.join(DATA_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as `{}`.
    pub fn load_document(&self) -> anyhow::Result<Value> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Value::Object(Map::new())),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read {}", self.path.to_string_lossy())
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", self.path.to_string_lossy()))
    }

    /// Overwrites the whole document (temp file + rename).
    pub fn save_document(&self, doc: &Value) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(doc).context("failed to serialize document")?;
        let tmp = self.path.with_extension("json.saving");
        std::fs::write(&tmp, text)
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        std::fs::rename(&tmp, &self.path).with_context(|| {
            format!("failed to move saved document to {}", self.path.to_string_lossy())
        })?;
        Ok(())
    }

    /// Read-modify-write of the top-level object. A stored document that is
    /// not an object is replaced by an empty one before `f` runs.
    pub fn update<F>(&self, f: F) -> anyhow::Result<Value>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut map = match self.load_document()? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        f(&mut map);
        let doc = Value::Object(map);
        self.save_document(&doc)?;
        Ok(doc)
    }

    pub fn load_classroom(&self) -> anyhow::Result<Classroom> {
        classroom_from_document(&self.load_document()?)
    }

    pub fn save_classroom(&self, classroom: &Classroom) -> anyhow::Result<()> {
        let doc = self.document_with(classroom)?;
        self.save_document(&doc)
    }

    /// The stored document with `classroom` in place of its saved state.
    /// Other top-level keys are kept; nothing is written.
    pub fn document_with(&self, classroom: &Classroom) -> anyhow::Result<Value> {
        let state = serde_json::to_value(classroom).context("failed to serialize classroom")?;
        let mut map = match self.load_document()? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        map.insert(STORAGE_KEY.to_string(), state);
        Ok(Value::Object(map))
    }
}

/// Pulls the classroom out of a document. Absent state is an empty classroom.
pub fn classroom_from_document(doc: &Value) -> anyhow::Result<Classroom> {
    let Some(map) = doc.as_object() else {
        return Err(anyhow!("document must be a JSON object"));
    };
    match map.get(STORAGE_KEY) {
        None | Some(Value::Null) => Ok(Classroom::default()),
        Some(state) => serde_json::from_value(state.clone())
            .with_context(|| format!("{STORAGE_KEY} does not hold a valid classroom")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_without_state_is_empty_classroom() {
        let c = classroom_from_document(&json!({ "other": 1 })).expect("classroom");
        assert_eq!(c, Classroom::default());
        assert!(classroom_from_document(&json!([1, 2])).is_err());
    }

    #[test]
    fn partial_state_fills_defaults() {
        let c = classroom_from_document(&json!({
            STORAGE_KEY: { "students": [{ "id": "a", "name": "Ann", "rollNumber": "4" }] }
        }))
        .expect("classroom");
        assert_eq!(c.students.len(), 1);
        assert!(!c.students[0].is_flagged);
        assert!(c.seating_layout.is_empty());
    }
}
