use crate::dashboard;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use chrono::{Local, NaiveDateTime};
use serde_json::json;

const NOW_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

fn parse_now(raw: &str) -> Result<NaiveDateTime, HandlerErr> {
    NOW_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw.trim(), f).ok())
        .ok_or_else(|| HandlerErr::bad_params(format!("now must be YYYY-MM-DDTHH:MM, got {:?}", raw)))
}

fn dashboard_open(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let now = match get_optional_str(params, "now") {
        Some(raw) => parse_now(&raw)?,
        None => Local::now().naive_local(),
    };
    let view = dashboard::dashboard(&state.classroom, now);
    let mut result = serde_json::to_value(&view)
        .map_err(|e| HandlerErr::new("io_failed", e.to_string()))?;
    result["theme"] = json!(state.classroom.theme);
    Ok(result)
}

fn handle_dashboard_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    match dashboard_open(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.open" => Some(handle_dashboard_open(state, req)),
        _ => None,
    }
}
