use crate::calc::{self, Consolidated, ReportError};
use crate::extract::{extract, PerTestRecord};
use crate::table::{self, RawTable};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Where one uploaded score sheet comes from.
#[derive(Debug, Clone)]
pub enum SheetSource {
    Path(PathBuf),
    Csv(String),
    Table(serde_json::Value),
    Missing,
}

#[derive(Debug, Clone)]
pub struct SheetInput {
    pub name: String,
    pub source: SheetSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NamedRecord {
    pub file: String,
    pub record: PerTestRecord,
}

#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub records: Vec<NamedRecord>,
    pub errors: Vec<FileError>,
}

fn decode(source: &SheetSource) -> anyhow::Result<RawTable> {
    match source {
        SheetSource::Path(p) => table::read_csv_file(p),
        SheetSource::Csv(text) => table::parse_csv_bytes(text.as_bytes()),
        SheetSource::Table(v) => table::table_from_json(v),
        SheetSource::Missing => anyhow::bail!("file has no path, csv or table"),
    }
}

/// Decodes and extracts every sheet. A sheet that cannot be decoded is
/// reported in `errors` and skipped; the others still go through.
pub fn extract_all(inputs: &[SheetInput], default_test_max: f64) -> Batch {
    let mut batch = Batch::default();
    for input in inputs {
        match decode(&input.source) {
            Ok(t) => batch.records.push(NamedRecord {
                file: input.name.clone(),
                record: extract(&t, default_test_max),
            }),
            Err(e) => {
                let message = format!("{e:#}");
                warn!(file = %input.name, error = %message, "skipping unreadable score sheet");
                batch.errors.push(FileError {
                    file: input.name.clone(),
                    message,
                });
            }
        }
    }
    batch
}

pub fn consolidate(batch: &Batch) -> Result<Consolidated, ReportError> {
    if batch.records.is_empty() {
        return Err(
            ReportError::new("nothing_to_process", "no readable score sheets").with_details(
                serde_json::json!({ "errors": batch.errors }),
            ),
        );
    }
    let records: Vec<PerTestRecord> = batch.records.iter().map(|r| r.record.clone()).collect();
    Ok(calc::aggregate(&records))
}
