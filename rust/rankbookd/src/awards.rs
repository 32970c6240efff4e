//! Award rosters derived from the consolidated ranking.
//!
//! Rosters borrow rows from the consolidated table; nothing here copies or
//! re-ranks students.

use crate::calc::ConsolidatedRow;
use crate::settings::ReportSettings;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AwardKind {
    Top,
    Second,
    Third,
    Rising,
    Effort,
    Consistency,
    Improvement,
}

impl AwardKind {
    pub const ALL: [AwardKind; 7] = [
        AwardKind::Top,
        AwardKind::Second,
        AwardKind::Third,
        AwardKind::Rising,
        AwardKind::Effort,
        AwardKind::Consistency,
        AwardKind::Improvement,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AwardKind::Top => "Vikramaditya Excellence Award",
            AwardKind::Second => "Chanakya Niti Award",
            AwardKind::Third => "Arjuna Focus Award",
            AwardKind::Rising => "Dhruva Tara Award",
            AwardKind::Effort => "Karmayogi Effort Award",
            AwardKind::Consistency => "Eklavya Dedication Award",
            AwardKind::Improvement => "Abhimanyu Progress Award",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AwardKind::Top => "For Highest Score (Rank 1)",
            AwardKind::Second => "For Outstanding Intelligence (Rank 2)",
            AwardKind::Third => "For Unwavering Focus (Rank 3)",
            AwardKind::Rising => "Consistent Performer (Rising Star)",
            AwardKind::Effort => "For Sustained Effort (Rank 6-10)",
            AwardKind::Consistency => "For 100% Attendance & Dedication",
            AwardKind::Improvement => "For Steady Improvement",
        }
    }

    fn admits(self, row: &ConsolidatedRow, s: &ReportSettings) -> bool {
        match self {
            AwardKind::Top => row.rank == 1,
            AwardKind::Second => row.rank == 2,
            AwardKind::Third => row.rank == 3,
            AwardKind::Rising => (4..=5).contains(&row.rank),
            AwardKind::Effort => (6..=10).contains(&row.rank),
            AwardKind::Consistency => {
                row.absent == 0 && row.percentage >= s.yellow_pct && row.rank > 10
            }
            AwardKind::Improvement => {
                row.percentage >= s.yellow_pct
                    && row.percentage < s.green_pct
                    && attendance_ratio(row) >= s.improvement_min_attendance
                    && row.rank > 10
                    && row.absent > 0
            }
        }
    }
}

fn attendance_ratio(row: &ConsolidatedRow) -> f64 {
    if row.total_tests == 0 {
        return 0.0;
    }
    row.present as f64 / row.total_tests as f64
}

#[derive(Debug, Clone, Serialize)]
pub struct Roster<'a> {
    pub key: AwardKind,
    pub title: &'static str,
    pub description: &'static str,
    pub members: Vec<&'a ConsolidatedRow>,
}

/// Evaluates every award against `rows` (already in presentation order).
/// Always returns one roster per award, in catalogue order; empty rosters
/// mean "no winners".
pub fn rosters<'a>(rows: &'a [ConsolidatedRow], settings: &ReportSettings) -> Vec<Roster<'a>> {
    AwardKind::ALL
        .iter()
        .map(|&kind| {
            let mut members: Vec<&ConsolidatedRow> =
                rows.iter().filter(|r| kind.admits(r, settings)).collect();
            if kind == AwardKind::Consistency && members.len() > settings.consistency_cap {
                members.sort_by(|a, b| {
                    b.obtained
                        .partial_cmp(&a.obtained)
                        .unwrap_or(Ordering::Equal)
                });
                members.truncate(settings.consistency_cap);
            }
            Roster {
                key: kind,
                title: kind.title(),
                description: kind.description(),
                members,
            }
        })
        .collect()
}
