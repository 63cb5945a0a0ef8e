use crate::attendance;
pub use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::store::DataStore;
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Like `get_required_str` but also rejects blank strings; the result is trimmed.
pub fn get_non_empty_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let v = get_required_str(params, key)?;
    let t = v.trim();
    if t.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(t.to_string())
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// A `YYYY-MM-DD` parameter, normalised.
pub fn get_date(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let raw = get_required_str(params, key)?;
    attendance::parse_date(&raw)
        .map(attendance::format_date)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))
}

/// `params.today` when given (for reproducible calls), else the local date.
pub fn today(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match params.get("today").and_then(|v| v.as_str()) {
        Some(raw) => attendance::parse_date(raw).map_err(|e| HandlerErr::bad_params(e.to_string())),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, HandlerErr> {
    serde_json::from_value(params.clone()).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

pub fn require_confirm(params: &serde_json::Value) -> Result<(), HandlerErr> {
    if params.get("confirm").and_then(|v| v.as_bool()) == Some(true) {
        Ok(())
    } else {
        Err(HandlerErr::new(
            "confirm_required",
            "pass confirm: true to proceed",
        ))
    }
}

pub fn require_store(state: &AppState) -> Result<&DataStore, HandlerErr> {
    state
        .store
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

/// Saves the in-memory classroom. On failure the in-memory state is kept as
/// is; the caller reports `save_failed` and the change may be lost on reload.
pub fn persist(state: &AppState) -> Result<(), HandlerErr> {
    let store = require_store(state)?;
    store.save_classroom(&state.classroom).map_err(|e| {
        tracing::warn!(path = %store.path().display(), error = %e, "failed to save document");
        HandlerErr::new("save_failed", format!("{e:#}"))
            .with_details(json!({ "path": store.path().to_string_lossy() }))
    })
}

/// `outPath`, or `outDir` joined with `default_name`.
pub fn out_path(params: &serde_json::Value, default_name: &str) -> Result<PathBuf, HandlerErr> {
    if let Some(p) = get_optional_str(params, "outPath").filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(p.trim()));
    }
    if let Some(d) = get_optional_str(params, "outDir").filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(d.trim()).join(default_name));
    }
    Err(HandlerErr::bad_params("missing outPath"))
}

pub fn write_output(path: &Path, contents: &str) -> Result<(), HandlerErr> {
    let io_err = |e: std::io::Error| {
        HandlerErr::new("io_failed", e.to_string())
            .with_details(json!({ "path": path.to_string_lossy() }))
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
