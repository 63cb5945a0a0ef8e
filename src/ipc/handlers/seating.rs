use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, persist, require_confirm, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::seating::{self, SeatGrid};
use serde_json::json;

/// The grid is recomputed from the roster size on every read.
fn seating_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let classroom = &state.classroom;
    let grid = SeatGrid::for_roster(classroom.students.len());
    let seats: Vec<serde_json::Value> = (0..grid.seats)
        .map(|i| {
            let seat_id = SeatGrid::seat_id(i);
            let (row, col) = grid.position(i);
            json!({
                "seatId": seat_id,
                "row": row,
                "col": col,
                "studentId": classroom.seating_layout.get(&seat_id),
            })
        })
        .collect();
    let unseated: Vec<&str> = seating::unseated(&classroom.students, &classroom.seating_layout)
        .into_iter()
        .map(|s| s.id.as_str())
        .collect();

    Ok(json!({
        "grid": grid,
        "seats": seats,
        "unseated": unseated,
        "layout": classroom.seating_layout,
    }))
}

fn seating_place(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let seat_id = get_required_str(params, "seatId")?;
    let grid = SeatGrid::for_roster(state.classroom.students.len());
    if !SeatGrid::parse_seat_id(&seat_id).is_some_and(|i| grid.contains(i)) {
        return Err(HandlerErr::bad_params(format!("no such seat: {}", seat_id))
            .with_details(json!({ "seats": grid.seats })));
    }

    let student_id = match params.get("studentId") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => {
            let Some(id) = v.as_str() else {
                return Err(HandlerErr::bad_params("studentId must be a string or null"));
            };
            if state.classroom.student(id).is_none() {
                return Err(HandlerErr::not_found("student not found"));
            }
            Some(id.to_string())
        }
    };

    let displaced = state
        .classroom
        .seating_layout
        .get(&seat_id)
        .filter(|prev| Some(prev.as_str()) != student_id.as_deref())
        .cloned();
    state.classroom.update_seat(&seat_id, student_id.as_deref());
    persist(state)?;
    Ok(json!({
        "seatId": seat_id,
        "studentId": student_id,
        "displaced": displaced,
    }))
}

fn seating_unseat(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let freed = state.classroom.unseat(&student_id);
    if freed.is_some() {
        persist(state)?;
    }
    Ok(json!({ "studentId": student_id, "seatId": freed }))
}

fn seating_auto_fill(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let fill = seating::auto_fill(
        &state.classroom.students,
        &state.classroom.seating_layout,
        &mut state.rng,
    );
    tracing::info!(placed = fill.placed, fallbacks = fill.fallbacks, "seats auto-filled");
    let placed = fill.placed;
    let fallbacks = fill.fallbacks;
    state.classroom.set_seating_layout(fill.layout);
    persist(state)?;

    let remaining = seating::unseated(&state.classroom.students, &state.classroom.seating_layout).len();
    Ok(json!({
        "placed": placed,
        "fallbacks": fallbacks,
        "unseated": remaining,
        "layout": state.classroom.seating_layout,
    }))
}

fn seating_clear(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    require_confirm(params)?;
    let cleared = state.classroom.seating_layout.len();
    state.classroom.clear_seating_layout();
    persist(state)?;
    Ok(json!({ "cleared": cleared }))
}

fn handle_seating_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match seating_get(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_seating_place(state: &mut AppState, req: &Request) -> serde_json::Value {
    match seating_place(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_seating_unseat(state: &mut AppState, req: &Request) -> serde_json::Value {
    match seating_unseat(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_seating_auto_fill(state: &mut AppState, req: &Request) -> serde_json::Value {
    match seating_auto_fill(state) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_seating_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    match seating_clear(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "seating.get" => Some(handle_seating_get(state, req)),
        "seating.place" => Some(handle_seating_place(state, req)),
        "seating.unseat" => Some(handle_seating_unseat(state, req)),
        "seating.autoFill" => Some(handle_seating_auto_fill(state, req)),
        "seating.clear" => Some(handle_seating_clear(state, req)),
        _ => None,
    }
}
