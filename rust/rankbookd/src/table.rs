use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Lenient numeric read: blanks, words and non-finite values are `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(v) => v.is_finite().then_some(*v),
            Cell::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    return None;
                }
                t.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format_float(*v),
        }
    }
}

// Spreadsheet-style float rendering: whole numbers keep one decimal ("18.0").
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

static EMPTY: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<Column>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    pub fn cell(&self, col: usize, row: usize) -> &Cell {
        self.columns
            .get(col)
            .and_then(|c| c.cells.get(row))
            .unwrap_or(&EMPTY)
    }

    /// Numeric reads of one column, one entry per table row.
    pub fn numeric_column(&self, col: usize) -> Vec<Option<f64>> {
        (0..self.row_count())
            .map(|row| self.cell(col, row).as_number())
            .collect()
    }

    pub fn text_column(&self, col: usize) -> Vec<String> {
        (0..self.row_count())
            .map(|row| self.cell(col, row).as_text())
            .collect()
    }
}

/// Header cleanup applied to every decoded table: blank names become
/// `Unnamed: {i}`, repeats get `.1`, `.2`, ... suffixes.
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };
        let mut candidate = base.clone();
        while let Some(n) = seen.get_mut(&candidate) {
            *n += 1;
            candidate = format!("{}.{}", base, n);
        }
        seen.insert(candidate.clone(), 0);
        out.push(candidate);
    }
    out
}

pub fn parse_csv_bytes(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers().context("parse csv header")?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        anyhow::bail!("no columns to parse from file");
    }
    let names = dedupe_headers(headers.iter().map(|h| h.to_string()).collect());
    let mut columns: Vec<Column> = names
        .into_iter()
        .map(|name| Column {
            name,
            cells: Vec::new(),
        })
        .collect();

    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("parse csv record {}", idx + 1))?;
        if record.len() > columns.len() {
            anyhow::bail!(
                "record {} has {} fields, header has {}",
                idx + 1,
                record.len(),
                columns.len()
            );
        }
        for (ci, col) in columns.iter_mut().enumerate() {
            let cell = match record.get(ci) {
                Some(v) if !v.trim().is_empty() => Cell::Text(v.to_string()),
                _ => Cell::Empty,
            };
            col.cells.push(cell);
        }
    }

    Ok(RawTable { columns })
}

pub fn read_csv_file(path: &Path) -> anyhow::Result<RawTable> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    parse_csv_bytes(&bytes)
}

pub fn table_from_json(v: &serde_json::Value) -> anyhow::Result<RawTable> {
    let cols = v
        .get("columns")
        .and_then(|c| c.as_array())
        .context("table.columns must be an array")?;
    if cols.is_empty() {
        anyhow::bail!("no columns to parse from file");
    }

    let mut names = Vec::with_capacity(cols.len());
    let mut cells_by_col = Vec::with_capacity(cols.len());
    for (i, c) in cols.iter().enumerate() {
        let name = c
            .get("name")
            .and_then(|n| n.as_str())
            .with_context(|| format!("table.columns[{}].name must be a string", i))?;
        let cells = match c.get("cells") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.iter().map(cell_from_json).collect(),
            Some(_) => anyhow::bail!("table.columns[{}].cells must be an array", i),
        };
        names.push(name.to_string());
        cells_by_col.push(cells);
    }

    let columns = dedupe_headers(names)
        .into_iter()
        .zip(cells_by_col)
        .map(|(name, cells)| Column { name, cells })
        .collect();
    Ok(RawTable { columns })
}

fn cell_from_json(v: &serde_json::Value) -> Cell {
    match v {
        serde_json::Value::Null => Cell::Empty,
        serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        serde_json::Value::String(s) if s.trim().is_empty() => Cell::Empty,
        serde_json::Value::String(s) => Cell::Text(s.clone()),
        serde_json::Value::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_reads_are_lenient() {
        assert_eq!(Cell::Text(" 18 ".into()).as_number(), Some(18.0));
        assert_eq!(Cell::Text("2.5".into()).as_number(), Some(2.5));
        assert_eq!(Cell::Text("absent".into()).as_number(), None);
        assert_eq!(Cell::Text("inf".into()).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Number(7.0).as_number(), Some(7.0));
    }

    #[test]
    fn number_cells_render_like_spreadsheet_floats() {
        assert_eq!(Cell::Number(18.0).as_text(), "18.0");
        assert_eq!(Cell::Number(2.5).as_text(), "2.5");
    }

    #[test]
    fn csv_pads_short_records_and_renames_headers() {
        let t = parse_csv_bytes(b"Name,,Name\nAsha,1\nRavi,2,3\n").expect("parse");
        let names: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Unnamed: 1", "Name.1"]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.cell(2, 0), &Cell::Empty);
        assert_eq!(t.cell(2, 1), &Cell::Text("3".into()));
    }

    #[test]
    fn csv_rejects_overlong_records() {
        let e = parse_csv_bytes(b"Name,Score\nAsha,1,2\n").unwrap_err();
        assert!(e.to_string().contains("record 1"), "{e}");
    }

    #[test]
    fn csv_rejects_empty_input() {
        assert!(parse_csv_bytes(b"").is_err());
    }

    #[test]
    fn json_table_accepts_mixed_cells() {
        let t = table_from_json(&json!({
            "columns": [
                { "name": "Name", "cells": ["Asha", null] },
                { "name": "Score", "cells": [18, "7"] }
            ]
        }))
        .expect("table");
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.cell(0, 1), &Cell::Empty);
        assert_eq!(t.numeric_column(1), vec![Some(18.0), Some(7.0)]);
    }
}
