use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_non_empty_str, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "dataFile": state.store.as_ref().map(|s| s.path().to_string_lossy().to_string()),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match state.open_workspace(&path) {
        Ok(()) => {
            tracing::info!(
                workspace = %path.display(),
                students = state.classroom.students.len(),
                "workspace selected"
            );
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "students": state.classroom.students.len(),
                }),
            )
        }
        Err(e) => err(
            &req.id,
            "store_open_failed",
            format!("{e:#}"),
            Some(json!({ "path": path.to_string_lossy() })),
        ),
    }
}

fn data_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(state)?;
    store
        .load_document()
        .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))
}

/// Overwrites the whole document, then reloads the classroom from it.
fn data_put(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let Some(document) = params.get("document").filter(|d| d.is_object()) else {
        return Err(HandlerErr::bad_params("document must be a JSON object"));
    };
    let classroom = store::classroom_from_document(document)
        .map_err(|e| HandlerErr::bad_params(format!("{e:#}")))?;
    let store = require_store(state)?;
    store
        .save_document(document)
        .map_err(|e| HandlerErr::new("save_failed", format!("{e:#}")))?;
    state.classroom = classroom;
    Ok(json!({ "success": true }))
}

fn handle_data_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match data_get(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_data_put(state: &mut AppState, req: &Request) -> serde_json::Value {
    match data_put(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_data_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_non_empty_str(&req.params, "path") {
        Ok(p) => PathBuf::from(p),
        Err(error) => return error.response(&req.id),
    };
    match state.open_data_file(&path) {
        Ok(()) => ok(&req.id, json!({ "dataFile": path.to_string_lossy() })),
        Err(e) => err(&req.id, "store_open_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "data.open" => Some(handle_data_open(state, req)),
        "data.get" => Some(handle_data_get(state, req)),
        "data.put" => Some(handle_data_put(state, req)),
        _ => None,
    }
}
