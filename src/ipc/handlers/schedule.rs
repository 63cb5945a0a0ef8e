use crate::attendance::{self, format_date};
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_date, get_non_empty_str, get_optional_str, get_required_str, out_path, parse_params,
    persist, require_store, today, write_output, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{CalendarEvent, EventPatch, EventType};
use crate::sheets::{self, Sheet};
use serde_json::json;
use std::path::PathBuf;

/// By `date`, by `month`, or everything; always in date order.
fn events_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let events: Vec<&CalendarEvent> = if params.get("date").is_some() {
        let date = get_date(params, "date")?;
        state.classroom.events_on(&date)
    } else if let Some(raw) = get_optional_str(params, "month") {
        let first = attendance::parse_month(&raw).map_err(|e| HandlerErr::bad_params(e.to_string()))?;
        state.classroom.events_in_month(&attendance::month_key(first))
    } else {
        let mut all: Vec<&CalendarEvent> = state.classroom.events.iter().collect();
        all.sort_by(|a, b| a.date.cmp(&b.date));
        all
    };
    Ok(json!({ "events": events }))
}

fn events_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let date = get_date(params, "date")?;
    let title = get_non_empty_str(params, "title")?;
    let event_type = get_optional_str(params, "type")
        .map(|t| EventType::coerce(&t))
        .unwrap_or_default();

    let mut event = CalendarEvent::new(date, title, event_type);
    event.description = get_optional_str(params, "description").filter(|d| !d.trim().is_empty());
    state.classroom.add_event(event.clone());
    persist(state)?;
    Ok(json!({ "event": event }))
}

fn events_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let event_id = get_required_str(params, "eventId")?;
    let mut patch: EventPatch = parse_params(params)?;
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(HandlerErr::bad_params("title must not be empty"));
    }
    if patch.date.is_some() {
        patch.date = Some(get_date(params, "date")?);
    }
    if !state.classroom.update_event(&event_id, patch) {
        return Err(HandlerErr::not_found("event not found"));
    }
    persist(state)?;
    let event = state.classroom.events.iter().find(|e| e.id == event_id);
    Ok(json!({ "event": event }))
}

fn events_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let event_id = get_required_str(params, "eventId")?;
    if !state.classroom.remove_event(&event_id) {
        return Err(HandlerErr::not_found("event not found"));
    }
    persist(state)?;
    Ok(json!({ "deleted": true }))
}

/// Appends events from a CSV file. Nothing is added when the file cannot be read.
fn schedule_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let in_path = PathBuf::from(get_non_empty_str(params, "inPath")?);
    let today = today(params)?;
    let sheet = Sheet::read(&in_path).map_err(|e| {
        HandlerErr::new("import_failed", format!("{e:#}"))
            .with_details(json!({ "path": in_path.to_string_lossy() }))
    })?;
    let events = sheets::schedule_import(&sheet, today);
    let count = events.len();
    let skipped = sheet.rows.len() - count;
    for event in events {
        state.classroom.add_event(event);
    }
    persist(state)?;
    tracing::info!(path = %in_path.display(), events = count, skipped, "schedule imported");
    Ok(json!({ "imported": count, "skipped": skipped }))
}

fn schedule_export(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let today = today(params)?;
    let path = out_path(params, &sheets::schedule_file_name(today))?;
    write_output(&path, &sheets::schedule_export(&state.classroom.events))?;
    Ok(json!({
        "path": path.to_string_lossy(),
        "eventCount": state.classroom.events.len(),
        "exportedOn": format_date(today),
    }))
}

fn handle_events_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match events_list(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_events_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    match events_create(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_events_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    match events_update(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_events_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    match events_delete(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_schedule_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    match schedule_import(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_schedule_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    match schedule_export(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "events.list" => Some(handle_events_list(state, req)),
        "events.create" => Some(handle_events_create(state, req)),
        "events.update" => Some(handle_events_update(state, req)),
        "events.delete" => Some(handle_events_delete(state, req)),
        "schedule.import" => Some(handle_schedule_import(state, req)),
        "schedule.export" => Some(handle_schedule_export(state, req)),
        _ => None,
    }
}
