use crate::attendance::{self, month_key};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, out_path, write_output, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::sheets::{self, ReportOptions};
use serde_json::json;

fn get_month(params: &serde_json::Value) -> Result<(String, chrono::NaiveDate), HandlerErr> {
    let raw = get_required_str(params, "month")?;
    let first = attendance::parse_month(&raw).map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    Ok((month_key(first), first))
}

fn reports_month_summary(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (month, first) = get_month(params)?;
    let rows = attendance::month_summary(&state.classroom.students, &state.classroom.records, first);
    Ok(json!({ "month": month, "rows": rows }))
}

fn reports_export_month(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (month, _) = get_month(params)?;
    let opts: ReportOptions = match params.get("options") {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid options: {}", e)))?,
        _ => ReportOptions::default(),
    };
    let csv = sheets::monthly_report(&month, &state.classroom.students, &state.classroom.records, &opts)
        .map_err(|e| HandlerErr::bad_params(format!("{e:#}")))?;

    let path = out_path(params, &sheets::report_file_name(&month))?;
    write_output(&path, &csv)?;
    Ok(json!({
        "path": path.to_string_lossy(),
        "month": month,
        "rowCount": state.classroom.students.len(),
    }))
}

fn handle_reports_month_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    match reports_month_summary(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_reports_export_month(state: &mut AppState, req: &Request) -> serde_json::Value {
    match reports_export_month(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.monthSummary" => Some(handle_reports_month_summary(state, req)),
        "reports.exportMonth" => Some(handle_reports_export_month(state, req)),
        _ => None,
    }
}
