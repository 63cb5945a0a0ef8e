use crate::groups;
use crate::ipc::error::ok;
use crate::ipc::helpers::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::picker::{self, DEFAULT_SPINS, MAX_SPINS};
use serde_json::json;

const MAX_GROUPS: i64 = 10_000;

/// Groups are handed back to the caller and never stored. `groupCount` is
/// clamped into `1..=MAX_GROUPS`.
fn groups_generate(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let Some(count) = params.get("groupCount").and_then(|v| v.as_i64()) else {
        return Err(HandlerErr::bad_params("missing groupCount"));
    };
    let count = count.clamp(1, MAX_GROUPS) as usize;
    let groups = groups::generate_groups(&state.classroom.students, count, &mut state.rng);
    Ok(json!({ "groupCount": count, "groups": groups }))
}

fn picker_pick(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let spins = match params.get("spins") {
        None | Some(serde_json::Value::Null) => DEFAULT_SPINS,
        Some(v) => v
            .as_u64()
            .map(|n| n.min(MAX_SPINS as u64) as usize)
            .ok_or_else(|| HandlerErr::bad_params("spins must be a non-negative integer"))?,
    };
    let pick = picker::pick_random(&state.classroom.students, spins, &mut state.rng);
    Ok(json!({ "pick": pick }))
}

fn handle_groups_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    match groups_generate(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_picker_pick(state: &mut AppState, req: &Request) -> serde_json::Value {
    match picker_pick(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "groups.generate" => Some(handle_groups_generate(state, req)),
        "picker.pick" => Some(handle_picker_pick(state, req)),
        _ => None,
    }
}
