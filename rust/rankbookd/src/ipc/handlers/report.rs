use crate::awards;
use crate::batch::{self, Batch, SheetInput, SheetSource};
use crate::calc::{self, ReportError};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::settings::ReportSettings;
use serde_json::json;
use std::path::PathBuf;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn bad_params(message: impl Into<String>) -> HandlerErr {
    HandlerErr {
        code: "bad_params",
        message: message.into(),
        details: None,
    }
}

fn report_err(id: &str, e: ReportError) -> serde_json::Value {
    err(id, &e.code, e.message, e.details)
}

fn parse_sheet(i: usize, v: &serde_json::Value) -> Result<SheetInput, HandlerErr> {
    let obj = v
        .as_object()
        .ok_or_else(|| bad_params(format!("files[{}] must be an object", i)))?;
    let name = match obj.get("name") {
        None | Some(serde_json::Value::Null) => format!("file {}", i + 1),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(_) => return Err(bad_params(format!("files[{}].name must be a string", i))),
    };

    let source = if let Some(p) = obj.get("path").and_then(|v| v.as_str()) {
        SheetSource::Path(PathBuf::from(p))
    } else if let Some(text) = obj.get("csv").and_then(|v| v.as_str()) {
        SheetSource::Csv(text.to_string())
    } else if let Some(t) = obj.get("table") {
        SheetSource::Table(t.clone())
    } else {
        SheetSource::Missing
    };
    Ok(SheetInput { name, source })
}

fn parse_files(req: &Request) -> Result<Vec<SheetInput>, HandlerErr> {
    let files = req
        .params
        .get("files")
        .and_then(|v| v.as_array())
        .ok_or_else(|| bad_params("missing params.files"))?;
    files
        .iter()
        .enumerate()
        .map(|(i, v)| parse_sheet(i, v))
        .collect()
}

/// Session settings with the request's `settings` object applied on top.
fn effective_settings(state: &AppState, req: &Request) -> Result<ReportSettings, HandlerErr> {
    match req.params.get("settings") {
        None | Some(serde_json::Value::Null) => Ok(state.settings.clone()),
        Some(patch) => state.settings.apply_patch(patch).map_err(|message| HandlerErr {
            code: "bad_settings",
            message,
            details: Some(json!({ "settings": patch })),
        }),
    }
}

fn load_batch(state: &AppState, req: &Request) -> Result<(ReportSettings, Batch), HandlerErr> {
    let settings = effective_settings(state, req)?;
    let inputs = parse_files(req)?;
    let batch = batch::extract_all(&inputs, settings.default_test_max);
    Ok((settings, batch))
}

fn handle_tests_extract(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, batch) = match load_batch(state, req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let records: Vec<serde_json::Value> = batch
        .records
        .iter()
        .map(|r| {
            json!({
                "file": r.file,
                "maxScore": r.record.max_score,
                "studentCount": r.record.present_keys.len(),
                "scores": r.record.scores_by_key,
            })
        })
        .collect();
    ok(&req.id, json!({ "records": records, "errors": batch.errors }))
}

fn handle_report_consolidate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, batch) = match load_batch(state, req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match batch::consolidate(&batch) {
        Ok(c) => ok(
            &req.id,
            json!({
                "totalTests": c.total_tests,
                "totalMarks": c.total_marks,
                "rows": c.rows,
                "errors": batch.errors,
            }),
        ),
        Err(e) => report_err(&req.id, e),
    }
}

fn handle_report_awards(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (settings, batch) = match load_batch(state, req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match batch::consolidate(&batch) {
        Ok(c) => ok(
            &req.id,
            json!({
                "rosters": awards::rosters(&c.rows, &settings),
                "errors": batch.errors,
            }),
        ),
        Err(e) => report_err(&req.id, e),
    }
}

fn optional_str(req: &Request, key: &str) -> Result<Option<String>, HandlerErr> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
            Ok(Some(s.trim().to_string()))
        }
        Some(_) => Err(bad_params(format!("{} must be a non-empty string", key))),
    }
}

fn default_title(today: chrono::NaiveDate) -> String {
    format!("MONTHLY RESULT REPORT - {}", today.format("%B %Y"))
}

fn pdf_file_name(stem: Option<String>, today: chrono::NaiveDate) -> String {
    let name = stem.unwrap_or_else(|| format!("Monthly_Report_{}", today.format("%b_%Y")));
    if name.ends_with(".pdf") {
        name
    } else {
        format!("{}.pdf", name)
    }
}

fn handle_report_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (settings, batch) = match load_batch(state, req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let (title, file_name) = match (optional_str(req, "title"), optional_str(req, "fileName")) {
        (Ok(t), Ok(f)) => (t, f),
        (Err(e), _) | (_, Err(e)) => return e.response(&req.id),
    };
    let c = match batch::consolidate(&batch) {
        Ok(v) => v,
        Err(e) => return report_err(&req.id, e),
    };

    let today = chrono::Local::now().date_naive();
    let rows: Vec<serde_json::Value> = c
        .rows
        .iter()
        .map(|r| {
            let mut v = json!(r);
            v["band"] = json!(calc::band(r.percentage, &settings));
            v
        })
        .collect();

    ok(
        &req.id,
        json!({
            "title": title.unwrap_or_else(|| default_title(today)),
            "fileName": pdf_file_name(file_name, today),
            "totalTests": c.total_tests,
            "totalMarks": c.total_marks,
            "rows": rows,
            "summary": calc::summarize(&c, &settings),
            "rosters": awards::rosters(&c.rows, &settings),
            "settings": settings,
            "errors": batch.errors,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tests.extract" => Some(handle_tests_extract(state, req)),
        "report.consolidate" => Some(handle_report_consolidate(state, req)),
        "report.awards" => Some(handle_report_awards(state, req)),
        "report.model" => Some(handle_report_model(state, req)),
        _ => None,
    }
}
