use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TEST_MAX: f64 = 50.0;

/// Thresholds and caps consumed by extraction, awards and the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSettings {
    pub green_pct: f64,
    pub yellow_pct: f64,
    pub default_test_max: f64,
    pub consistency_cap: usize,
    pub improvement_min_attendance: f64,
    pub summary_top_count: usize,
    pub summary_bottom_count: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            green_pct: 80.0,
            yellow_pct: 50.0,
            default_test_max: DEFAULT_TEST_MAX,
            consistency_cap: 3,
            improvement_min_attendance: 0.8,
            summary_top_count: 5,
            summary_bottom_count: 3,
        }
    }
}

fn parse_finite(v: &Value, key: &str) -> Result<f64, String> {
    v.as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("{} must be a finite number", key))
}

fn parse_usize_range(v: &Value, key: &str, max: u64) -> Result<usize, String> {
    let n = v
        .as_u64()
        .ok_or_else(|| format!("{} must be a non-negative integer", key))?;
    if n > max {
        return Err(format!("{} must be in 0..={}", key, max));
    }
    Ok(n as usize)
}

impl ReportSettings {
    /// Applies a partial camelCase patch. Either every key applies or none do.
    pub fn apply_patch(&self, patch: &Value) -> Result<ReportSettings, String> {
        let obj = patch
            .as_object()
            .ok_or_else(|| "patch must be an object".to_string())?;
        let mut next = self.clone();
        for (key, v) in obj {
            match key.as_str() {
                "greenPct" => next.green_pct = parse_finite(v, key)?,
                "yellowPct" => next.yellow_pct = parse_finite(v, key)?,
                "defaultTestMax" => {
                    let n = parse_finite(v, key)?;
                    if n <= 0.0 {
                        return Err(format!("{} must be > 0", key));
                    }
                    next.default_test_max = n;
                }
                "consistencyCap" => next.consistency_cap = parse_usize_range(v, key, 1000)?,
                "improvementMinAttendance" => {
                    let n = parse_finite(v, key)?;
                    if !(0.0..=1.0).contains(&n) {
                        return Err(format!("{} must be in 0..=1", key));
                    }
                    next.improvement_min_attendance = n;
                }
                "summaryTopCount" => next.summary_top_count = parse_usize_range(v, key, 1000)?,
                "summaryBottomCount" => {
                    next.summary_bottom_count = parse_usize_range(v, key, 1000)?
                }
                other => return Err(format!("unknown setting: {}", other)),
            }
        }
        Ok(next)
    }
}
