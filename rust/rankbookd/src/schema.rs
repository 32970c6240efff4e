//! Column sniffing for score sheets with unknown headers.
//!
//! Each resolver is an ordered list of named rules; the first rule that
//! produces a value wins. Rule order is part of the contract: reordering
//! changes which column a sheet resolves to.

use crate::table::RawTable;
use tracing::debug;

type IdentityRule = fn(&RawTable) -> Option<Vec<String>>;
type MaxScoreRule = fn(&RawTable) -> Option<f64>;
type ObtainedRule = fn(&RawTable) -> Option<Vec<f64>>;

const IDENTITY_RULES: &[(&str, IdentityRule)] = &[
    ("first_last", identity_first_last),
    ("exact_name", identity_exact_name),
    ("name_like", identity_name_like),
];

const MAX_SCORE_RULES: &[(&str, MaxScoreRule)] = &[
    ("possible_points", max_from_possible_points),
    ("max_like", max_from_max_like),
];

const OBTAINED_RULES: &[(&str, ObtainedRule)] = &[
    ("earned_column", obtained_from_earned_column),
    ("highest_mean", obtained_from_highest_mean),
];

const EXACT_NAME_HEADERS: &[&str] = &[
    "name",
    "student name",
    "student",
    "full name",
    "studentname",
    "candidate",
];

const POSSIBLE_POINTS_HEADERS: &[&str] = &[
    "possiblepts",
    "possible_pts",
    "possible points",
    "possible",
    "max marks",
];

const MAX_LIKE_FRAGMENTS: &[&str] = &["possible", "max", "maximum", "totalmarks"];

const NON_SCORE_FRAGMENTS: &[&str] = &["phone", "id", "roll"];

fn header_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn trimmed_column(table: &RawTable, col: usize) -> Vec<String> {
    table
        .text_column(col)
        .into_iter()
        .map(|s| s.trim().to_string())
        .collect()
}

fn identity_first_last(table: &RawTable) -> Option<Vec<String>> {
    let find = |wanted: &str| {
        table
            .columns
            .iter()
            .position(|c| c.name.to_lowercase() == wanted)
    };
    let first = find("firstname")?;
    let last = find("lastname")?;
    let out = trimmed_column(table, first)
        .into_iter()
        .zip(trimmed_column(table, last))
        .map(|(f, l)| format!("{} {}", f, l))
        .collect();
    Some(out)
}

fn identity_exact_name(table: &RawTable) -> Option<Vec<String>> {
    // Header preference beats column order.
    EXACT_NAME_HEADERS.iter().find_map(|wanted| {
        table
            .columns
            .iter()
            .position(|c| header_key(&c.name) == *wanted)
            .map(|col| trimmed_column(table, col))
    })
}

fn identity_name_like(table: &RawTable) -> Option<Vec<String>> {
    table
        .columns
        .iter()
        .position(|c| {
            let lc = c.name.to_lowercase();
            lc.contains("name") || lc.contains("student")
        })
        .map(|col| trimmed_column(table, col))
}

/// One identity string per row. Falls back to `Student {n}` (1-based) when no
/// column looks like a name. Strings may be empty after trimming.
pub fn find_identity_column(table: &RawTable) -> Vec<String> {
    for (label, rule) in IDENTITY_RULES {
        if let Some(names) = rule(table) {
            debug!(rule = *label, rows = names.len(), "identity column resolved");
            return names;
        }
    }
    debug!(rows = table.row_count(), "no identity column; synthesizing names");
    (1..=table.row_count())
        .map(|n| format!("Student {}", n))
        .collect()
}

fn max_from_possible_points(table: &RawTable) -> Option<f64> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| POSSIBLE_POINTS_HEADERS.contains(&header_key(&c.name).as_str()))
        .find_map(|(col, _)| table.numeric_column(col).into_iter().flatten().next())
}

fn max_from_max_like(table: &RawTable) -> Option<f64> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            let lc = c.name.to_lowercase();
            MAX_LIKE_FRAGMENTS.iter().any(|k| lc.contains(k))
        })
        .flat_map(|(col, _)| table.numeric_column(col).into_iter().flatten())
        .fold(None, |best: Option<f64>, v| match best {
            Some(b) if b >= v => Some(b),
            _ => Some(v),
        })
}

/// The test's maximum attainable score, when the sheet declares one.
pub fn find_max_score(table: &RawTable) -> Option<f64> {
    for (label, rule) in MAX_SCORE_RULES {
        if let Some(v) = rule(table) {
            debug!(rule = *label, max = v, "max score resolved");
            return Some(v);
        }
    }
    None
}

fn zero_filled(table: &RawTable, col: usize) -> Vec<f64> {
    table
        .numeric_column(col)
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect()
}

fn obtained_from_earned_column(table: &RawTable) -> Option<Vec<f64>> {
    table
        .columns
        .iter()
        .position(|c| {
            let clean = c.name.to_lowercase().replace(' ', "");
            clean.contains("earnedpts") || clean.contains("obtainedmarks") || clean == "score"
        })
        .map(|col| zero_filled(table, col))
}

// Known fragility: picks whichever numeric column averages highest, so a
// max-marks column that escapes the name filters can win over the scores.
fn obtained_from_highest_mean(table: &RawTable) -> Option<Vec<f64>> {
    let mut best: Option<(usize, f64)> = None;
    for (col, c) in table.columns.iter().enumerate() {
        let lc = c.name.to_lowercase();
        if NON_SCORE_FRAGMENTS.iter().any(|k| lc.contains(k)) {
            continue;
        }
        let values: Vec<f64> = table.numeric_column(col).into_iter().flatten().collect();
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if best.map(|(_, m)| mean > m).unwrap_or(true) {
            best = Some((col, mean));
        }
    }
    best.map(|(col, _)| zero_filled(table, col))
}

/// Obtained score per row; unparseable cells read as 0, and a sheet with no
/// numeric column scores every row 0.
pub fn find_obtained_scores(table: &RawTable) -> Vec<f64> {
    for (label, rule) in OBTAINED_RULES {
        if let Some(scores) = rule(table) {
            debug!(rule = *label, rows = scores.len(), "obtained column resolved");
            return scores;
        }
    }
    debug!("no numeric column; scoring every row 0");
    vec![0.0; table.row_count()]
}
