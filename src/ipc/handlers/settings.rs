use crate::backup;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_non_empty_str, out_path, persist, require_confirm, require_store, today, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn settings_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "theme": state.classroom.theme }))
}

fn settings_toggle_theme(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let theme = state.classroom.toggle_theme();
    persist(state)?;
    Ok(json!({ "theme": theme }))
}

/// Wipes roster, attendance, notes, events and seating. Timetable and theme stay.
fn settings_clear_data(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    require_confirm(params)?;
    state.classroom.clear_data();
    persist(state)?;
    tracing::info!("classroom data cleared");
    Ok(json!({ "cleared": true }))
}

fn backup_export(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(state)?;
    let path = out_path(params, &backup::backup_file_name(today(params)?))?;
    let summary = backup::export_bundle(store, &state.classroom, &path).map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}"))
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    Ok(json!({
        "path": path.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "sha256": summary.sha256,
    }))
}

/// Replaces the stored document with the backup, then reloads the classroom.
fn backup_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let in_path = PathBuf::from(get_non_empty_str(params, "inPath")?);
    let store = require_store(state)?;
    let summary = backup::import_bundle(&in_path, store).map_err(|e| {
        HandlerErr::new("import_failed", format!("{e:#}"))
            .with_details(json!({ "path": in_path.to_string_lossy() }))
    })?;
    let classroom = store
        .load_classroom()
        .map_err(|e| HandlerErr::new("store_open_failed", format!("{e:#}")))?;
    state.classroom = classroom;
    tracing::info!(
        path = %in_path.display(),
        format = %summary.bundle_format_detected,
        "backup restored"
    );
    Ok(json!({
        "bundleFormatDetected": summary.bundle_format_detected,
        "students": state.classroom.students.len(),
    }))
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match settings_get(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_settings_toggle_theme(state: &mut AppState, req: &Request) -> serde_json::Value {
    match settings_toggle_theme(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_settings_clear_data(state: &mut AppState, req: &Request) -> serde_json::Value {
    match settings_clear_data(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    match backup_export(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    match backup_import(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.toggleTheme" => Some(handle_settings_toggle_theme(state, req)),
        "settings.clearData" => Some(handle_settings_clear_data(state, req)),
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
