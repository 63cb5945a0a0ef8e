use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_non_empty_str, get_optional_str, get_required_str, out_path, persist, require_store,
    write_output, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{SlotPatch, TimetableSlot};
use crate::sheets::{self, PlanSpan};
use chrono::NaiveTime;
use serde_json::json;
use uuid::Uuid;

fn parse_day(v: Option<&serde_json::Value>) -> Result<u8, HandlerErr> {
    let Some(n) = v.and_then(|v| v.as_u64()) else {
        return Err(HandlerErr::bad_params("missing dayOfWeek"));
    };
    if n > 6 {
        return Err(HandlerErr::bad_params("dayOfWeek must be 0 (Sunday) to 6 (Saturday)"));
    }
    Ok(n as u8)
}

/// `H:MM` or `HH:MM`, returned zero-padded so lexical order is time order.
fn parse_clock(key: &str, raw: &str) -> Result<String, HandlerErr> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| HandlerErr::bad_params(format!("{} must be HH:MM, got {:?}", key, raw)))
}

fn check_order(start: &str, end: &str) -> Result<(), HandlerErr> {
    if end <= start {
        return Err(HandlerErr::bad_params("endTime must be after startTime"));
    }
    Ok(())
}

fn timetable_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let slots: Vec<&TimetableSlot> = match params.get("dayOfWeek") {
        Some(v) if !v.is_null() => state.classroom.slots_for_day(parse_day(Some(v))?),
        _ => {
            let mut all: Vec<&TimetableSlot> = state.classroom.timetable.iter().collect();
            all.sort_by(|a, b| {
                a.day_of_week
                    .cmp(&b.day_of_week)
                    .then_with(|| a.start_time.cmp(&b.start_time))
            });
            all
        }
    };
    Ok(json!({ "slots": slots }))
}

fn timetable_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let day_of_week = parse_day(params.get("dayOfWeek"))?;
    let start_time = parse_clock("startTime", &get_required_str(params, "startTime")?)?;
    let end_time = parse_clock("endTime", &get_required_str(params, "endTime")?)?;
    check_order(&start_time, &end_time)?;

    let slot = TimetableSlot {
        id: format!("tt_{}", Uuid::new_v4().simple()),
        day_of_week,
        start_time,
        end_time,
        subject: get_non_empty_str(params, "subject")?,
        lesson: get_optional_str(params, "lesson").unwrap_or_default(),
    };
    state.classroom.add_slot(slot.clone());
    persist(state)?;
    Ok(json!({ "slot": slot }))
}

fn timetable_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let slot_id = get_required_str(params, "slotId")?;
    let Some(current) = state.classroom.timetable.iter().find(|s| s.id == slot_id) else {
        return Err(HandlerErr::not_found("timetable slot not found"));
    };

    let patch = SlotPatch {
        start_time: get_optional_str(params, "startTime")
            .map(|v| parse_clock("startTime", &v))
            .transpose()?,
        end_time: get_optional_str(params, "endTime")
            .map(|v| parse_clock("endTime", &v))
            .transpose()?,
        subject: get_optional_str(params, "subject"),
        lesson: get_optional_str(params, "lesson"),
    };
    if patch.subject.as_deref().is_some_and(|v| v.trim().is_empty()) {
        return Err(HandlerErr::bad_params("subject must not be empty"));
    }
    check_order(
        patch.start_time.as_deref().unwrap_or(&current.start_time),
        patch.end_time.as_deref().unwrap_or(&current.end_time),
    )?;

    state.classroom.update_slot(&slot_id, patch);
    persist(state)?;
    let slot = state.classroom.timetable.iter().find(|s| s.id == slot_id);
    Ok(json!({ "slot": slot }))
}

fn timetable_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let slot_id = get_required_str(params, "slotId")?;
    if !state.classroom.remove_slot(&slot_id) {
        return Err(HandlerErr::not_found("timetable slot not found"));
    }
    persist(state)?;
    Ok(json!({ "deleted": true }))
}

fn timetable_export(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let start_month = get_required_str(params, "startMonth")?;
    let span: PlanSpan = match params.get("span") {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .map_err(|_| HandlerErr::bad_params("span must be month or semester"))?,
        _ => PlanSpan::Month,
    };
    let csv = sheets::timetable_plan(&state.classroom.timetable, &start_month, span)
        .map_err(|e| HandlerErr::bad_params(format!("{e:#}")))?;
    let path = out_path(params, &sheets::timetable_file_name(&start_month, span))?;
    write_output(&path, &csv)?;
    Ok(json!({ "path": path.to_string_lossy() }))
}

fn handle_timetable_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match timetable_list(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_timetable_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    match timetable_create(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_timetable_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    match timetable_update(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_timetable_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    match timetable_delete(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_timetable_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    match timetable_export(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.list" => Some(handle_timetable_list(state, req)),
        "timetable.create" => Some(handle_timetable_create(state, req)),
        "timetable.update" => Some(handle_timetable_update(state, req)),
        "timetable.delete" => Some(handle_timetable_delete(state, req)),
        "timetable.export" => Some(handle_timetable_export(state, req)),
        _ => None,
    }
}
