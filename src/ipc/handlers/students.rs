use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_non_empty_str, get_optional_str, get_required_str, out_path, parse_params, persist,
    require_store, write_output, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentPatch};
use crate::sheets::{self, Sheet};
use serde_json::json;
use std::path::PathBuf;

const TEMPLATE_FILE_NAME: &str = "Student_Import_Template.csv";

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let students: Vec<&Student> = match get_optional_str(params, "query") {
        Some(q) if !q.trim().is_empty() => state.classroom.search_students(&q),
        _ => state.classroom.students.iter().collect(),
    };
    Ok(json!({ "students": students }))
}

fn students_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let name = get_non_empty_str(params, "name")?;
    let roll = get_non_empty_str(params, "rollNumber")?;

    let mut student = Student::new(name, roll);
    student.parent_name = get_optional_str(params, "parentName").filter(|v| !v.trim().is_empty());
    student.parent_phone = get_optional_str(params, "parentPhone").filter(|v| !v.trim().is_empty());
    student.is_flagged = params
        .get("isFlagged")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if !state.classroom.add_student(student.clone()) {
        // Exact duplicates are ignored rather than rejected.
        return Ok(json!({ "created": false, "student": null }));
    }
    persist(state)?;
    Ok(json!({ "created": true, "student": student }))
}

fn students_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let patch: StudentPatch = parse_params(params)?;
    if patch.name.as_deref().is_some_and(|v| v.trim().is_empty()) {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    if patch.roll_number.as_deref().is_some_and(|v| v.trim().is_empty()) {
        return Err(HandlerErr::bad_params("rollNumber must not be empty"));
    }
    if !state.classroom.update_student(&student_id, patch) {
        return Err(HandlerErr::not_found("student not found"));
    }
    persist(state)?;
    Ok(json!({ "student": state.classroom.student(&student_id) }))
}

fn students_toggle_flag(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let flagged = state
        .classroom
        .toggle_flag(&student_id)
        .ok_or_else(|| HandlerErr::not_found("student not found"))?;
    persist(state)?;
    Ok(json!({ "studentId": student_id, "isFlagged": flagged }))
}

fn students_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let student_id = get_required_str(params, "studentId")?;
    if !state.classroom.remove_student(&student_id) {
        return Err(HandlerErr::not_found("student not found"));
    }
    persist(state)?;
    Ok(json!({ "deleted": true }))
}

/// Replaces the roster from a CSV file. A file that cannot be read or has no
/// header row leaves the current roster untouched.
fn students_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_store(state)?;
    let in_path = PathBuf::from(get_non_empty_str(params, "inPath")?);
    let sheet = Sheet::read(&in_path).map_err(|e| {
        HandlerErr::new("import_failed", format!("{e:#}"))
            .with_details(json!({ "path": in_path.to_string_lossy() }))
    })?;
    let students = sheets::import_students(&sheet);
    let count = students.len();
    state.classroom.set_students(students);
    persist(state)?;
    tracing::info!(path = %in_path.display(), students = count, "roster imported");
    Ok(json!({ "imported": count }))
}

fn students_template(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let path = out_path(params, TEMPLATE_FILE_NAME)?;
    write_output(&path, &sheets::roster_template())?;
    Ok(json!({ "path": path.to_string_lossy() }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_list(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_create(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_update(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_toggle_flag(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_toggle_flag(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_delete(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_import(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_template(_state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_template(&req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.toggleFlag" => Some(handle_students_toggle_flag(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.import" => Some(handle_students_import(state, req)),
        "students.template" => Some(handle_students_template(state, req)),
        _ => None,
    }
}
