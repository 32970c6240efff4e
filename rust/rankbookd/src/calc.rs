use crate::extract::PerTestRecord;
use crate::names::display_name;
use crate::settings::ReportSettings;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::info;

/// Rounds to `decimals` places; exact halves go to the even digit.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round_ties_even() / f
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ReportError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedRow {
    #[serde(rename = "name")]
    pub display_name: String,
    pub key: String,
    pub total_tests: usize,
    pub present: usize,
    pub absent: usize,
    pub total_marks: i64,
    pub obtained: f64,
    pub percentage: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consolidated {
    pub total_tests: usize,
    pub total_marks: i64,
    pub rows: Vec<ConsolidatedRow>,
}

#[derive(Debug, Default)]
struct StudentTally {
    obtained: f64,
    present: usize,
}

/// Folds every sheet into one row per student, dense-ranked on `obtained`
/// and ordered by (rank, name). Zero records give an empty table.
pub fn aggregate(records: &[PerTestRecord]) -> Consolidated {
    let total_tests = records.len();
    let total_marks = records.iter().map(|r| r.max_score).sum::<f64>().floor() as i64;

    let tallies = records.iter().fold(
        BTreeMap::<&str, StudentTally>::new(),
        |mut acc, record| {
            for key in &record.present_keys {
                let t = acc.entry(key.as_str()).or_default();
                t.present += 1;
                t.obtained += record.scores_by_key.get(key).copied().unwrap_or(0.0);
            }
            acc
        },
    );

    let mut rows: Vec<ConsolidatedRow> = tallies
        .into_iter()
        .map(|(key, t)| {
            let percentage = if total_marks > 0 {
                round_to(t.obtained / total_marks as f64 * 100.0, 1)
            } else {
                0.0
            };
            ConsolidatedRow {
                display_name: display_name(key),
                key: key.to_string(),
                total_tests,
                present: t.present,
                absent: total_tests - t.present,
                total_marks,
                obtained: round_to(t.obtained, 2),
                percentage,
                rank: 0,
            }
        })
        .collect();

    assign_dense_ranks(&mut rows);
    rows.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    info!(
        files = total_tests,
        students = rows.len(),
        total_marks,
        "consolidated score sheets"
    );

    Consolidated {
        total_tests,
        total_marks,
        rows,
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn assign_dense_ranks(rows: &mut [ConsolidatedRow]) {
    let mut distinct: Vec<f64> = rows.iter().map(|r| r.obtained).collect();
    distinct.sort_by(|a, b| desc(*a, *b));
    distinct.dedup();
    for row in rows.iter_mut() {
        let pos = distinct
            .iter()
            .position(|v| *v == row.obtained)
            .unwrap_or(distinct.len());
        row.rank = pos + 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Band {
    Green,
    Yellow,
    Red,
}

pub fn band(percentage: f64, settings: &ReportSettings) -> Band {
    if percentage >= settings.green_pct {
        Band::Green
    } else if percentage >= settings.yellow_pct {
        Band::Yellow
    } else {
        Band::Red
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary<'a> {
    pub candidates: usize,
    pub total_tests: usize,
    pub total_marks: i64,
    pub average_obtained: f64,
    pub highest_obtained: f64,
    pub lowest_obtained: f64,
    pub pass_count: usize,
    pub top_rankers: Vec<&'a ConsolidatedRow>,
    pub needs_improvement: Vec<&'a ConsolidatedRow>,
}

pub fn summarize<'a>(c: &'a Consolidated, settings: &ReportSettings) -> BatchSummary<'a> {
    let rows = &c.rows;
    let n = rows.len();
    let average_obtained = if n > 0 {
        round_to(rows.iter().map(|r| r.obtained).sum::<f64>() / n as f64, 2)
    } else {
        0.0
    };
    let highest_obtained = rows.iter().map(|r| r.obtained).fold(None, |m: Option<f64>, v| {
        Some(m.map_or(v, |m| m.max(v)))
    });
    let lowest_obtained = rows.iter().map(|r| r.obtained).fold(None, |m: Option<f64>, v| {
        Some(m.map_or(v, |m| m.min(v)))
    });

    let mut needs_improvement: Vec<&ConsolidatedRow> = rows
        .iter()
        .skip(n.saturating_sub(settings.summary_bottom_count))
        .collect();
    needs_improvement.sort_by(|a, b| {
        a.obtained
            .partial_cmp(&b.obtained)
            .unwrap_or(Ordering::Equal)
    });

    BatchSummary {
        candidates: n,
        total_tests: c.total_tests,
        total_marks: c.total_marks,
        average_obtained,
        highest_obtained: highest_obtained.unwrap_or(0.0),
        lowest_obtained: lowest_obtained.unwrap_or(0.0),
        pass_count: rows
            .iter()
            .filter(|r| r.percentage >= settings.yellow_pct)
            .count(),
        top_rankers: rows.iter().take(settings.summary_top_count).collect(),
        needs_improvement,
    }
}
