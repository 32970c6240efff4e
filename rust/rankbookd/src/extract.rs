use crate::names::normalize;
use crate::schema;
use crate::table::RawTable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Compact summary of one uploaded score sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerTestRecord {
    pub max_score: f64,
    pub scores_by_key: BTreeMap<String, f64>,
    pub present_keys: BTreeSet<String>,
}

pub fn extract(table: &RawTable, default_test_max: f64) -> PerTestRecord {
    let names = schema::find_identity_column(table);
    let obtained = schema::find_obtained_scores(table);

    let max_score = match schema::find_max_score(table) {
        Some(v) => v,
        None => {
            let top = obtained.iter().copied().fold(None, |best: Option<f64>, v| {
                Some(best.map_or(v, |b| b.max(v)))
            });
            match top {
                Some(v) if v > 0.0 => v,
                // Zero or negative best scores would give a non-positive max.
                _ => default_test_max,
            }
        }
    };

    let mut scores_by_key = BTreeMap::new();
    let mut present_keys = BTreeSet::new();
    for (raw, score) in names.iter().zip(obtained.iter()) {
        let key = normalize(raw);
        if key.is_empty() {
            continue;
        }
        // Later rows for the same student overwrite earlier ones.
        scores_by_key.insert(key.clone(), *score);
        present_keys.insert(key);
    }

    debug!(
        max_score,
        students = present_keys.len(),
        rows = table.row_count(),
        "score sheet extracted"
    );

    PerTestRecord {
        max_score,
        scores_by_key,
        present_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_TEST_MAX;
    use crate::table::parse_csv_bytes;

    fn sheet(csv: &str) -> PerTestRecord {
        let t = parse_csv_bytes(csv.as_bytes()).expect("parse csv");
        extract(&t, DEFAULT_TEST_MAX)
    }

    #[test]
    fn declared_possible_points_win() {
        let r = sheet("Name,EarnedPts,PossiblePts\nAsha Rao,18,20\nRavi,12,20\n");
        assert_eq!(r.max_score, 20.0);
        assert_eq!(r.scores_by_key.get("asha rao"), Some(&18.0));
        assert_eq!(r.present_keys.len(), 2);
    }

    #[test]
    fn max_falls_back_to_best_obtained() {
        let r = sheet("Student Name,Score\nasha   rao,22\nRavi,9\n");
        assert_eq!(r.max_score, 22.0);
    }

    #[test]
    fn max_falls_back_to_default_when_all_zero() {
        let r = sheet("Name,Score\nAsha,0\nRavi,absent\n");
        assert_eq!(r.max_score, DEFAULT_TEST_MAX);
        assert!(r.present_keys.contains("ravi"));
        assert_eq!(r.scores_by_key.get("ravi"), Some(&0.0));
    }

    #[test]
    fn negative_best_score_falls_back_to_default() {
        let r = sheet("Name,Score\nAsha,-3\nRavi,-1\n");
        assert_eq!(r.max_score, DEFAULT_TEST_MAX);
        assert_eq!(r.scores_by_key.get("ravi"), Some(&-1.0));
    }

    #[test]
    fn max_falls_back_to_default_for_header_only_sheet() {
        let r = sheet("Name,Score\n");
        assert_eq!(r.max_score, DEFAULT_TEST_MAX);
        assert!(r.present_keys.is_empty());
    }

    #[test]
    fn duplicate_rows_keep_last_score() {
        let r = sheet("Name,Score\nAsha,5\n ASHA ,9\n");
        assert_eq!(r.scores_by_key.len(), 1);
        assert_eq!(r.scores_by_key.get("asha"), Some(&9.0));
    }

    #[test]
    fn blank_names_are_dropped() {
        let r = sheet("Name,Score\n,5\nRavi,6\n");
        assert_eq!(r.present_keys.iter().collect::<Vec<_>>(), vec!["ravi"]);
    }
}
