use crate::attendance::StatusCounts;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_date, get_required_str, persist, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use serde_json::json;

fn attendance_day(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date(params, "date")?;
    let classroom = &state.classroom;

    let mut counts = StatusCounts::default();
    let rows: Vec<serde_json::Value> = classroom
        .students
        .iter()
        .map(|s| {
            let record = classroom.record(&s.id, &date);
            if let Some(r) = record {
                counts.add(r.status);
            }
            json!({
                "studentId": s.id,
                "name": s.name,
                "rollNumber": s.roll_number,
                "isFlagged": s.is_flagged,
                "status": record.map(|r| r.status),
                "reason": record.and_then(|r| r.reason.as_deref()),
            })
        })
        .collect();

    Ok(json!({
        "date": date,
        "rows": rows,
        "counts": counts,
        "note": classroom.daily_note(&date),
    }))
}

fn attendance_set(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let date = get_date(params, "date")?;
    let raw = get_required_str(params, "status")?;
    let Some(status) = AttendanceStatus::parse(&raw) else {
        return Err(HandlerErr::bad_params(format!(
            "status must be Present, Absent, Sick or Late, got {:?}",
            raw
        )));
    };
    if state.classroom.student(&student_id).is_none() {
        return Err(HandlerErr::not_found("student not found"));
    }

    state.classroom.set_status(&student_id, &date, status);
    persist(state)?;
    Ok(json!({ "record": state.classroom.record(&student_id, &date) }))
}

fn attendance_reason(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let date = get_date(params, "date")?;
    let reason = get_required_str(params, "reason")?;
    if !state.classroom.set_reason(&student_id, &date, &reason) {
        return Err(HandlerErr::not_found("no attendance record for that student and date"));
    }
    persist(state)?;
    Ok(json!({ "record": state.classroom.record(&student_id, &date) }))
}

fn attendance_mark_all_present(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let date = get_date(params, "date")?;
    let marked = state.classroom.mark_all_present(&date);
    if marked > 0 {
        persist(state)?;
    }
    Ok(json!({ "date": date, "marked": marked }))
}

fn notes_get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date(params, "date")?;
    Ok(json!({ "date": date, "note": state.classroom.daily_note(&date).unwrap_or("") }))
}

fn notes_set(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let date = get_date(params, "date")?;
    let note = get_required_str(params, "note")?;
    state.classroom.set_daily_note(&date, &note);
    persist(state)?;
    Ok(json!({ "date": date, "note": note }))
}

fn handle_attendance_day(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_day(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_set(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_reason(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_reason(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_mark_all_present(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_mark_all_present(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_notes_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match notes_get(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_notes_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    match notes_set(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.day" => Some(handle_attendance_day(state, req)),
        "attendance.set" => Some(handle_attendance_set(state, req)),
        "attendance.reason" => Some(handle_attendance_reason(state, req)),
        "attendance.markAllPresent" => Some(handle_attendance_mark_all_present(state, req)),
        "notes.get" => Some(handle_notes_get(state, req)),
        "notes.set" => Some(handle_notes_set(state, req)),
        _ => None,
    }
}
