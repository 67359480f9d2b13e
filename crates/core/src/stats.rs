//! Attendance report snapshots.
//!
//! The same arithmetic serves the live tally of an editing session and the
//! snapshot decoded from the backend: both go through [`derive_stats`] /
//! [`percentage`].

use serde::{Deserialize, Serialize};

use crate::presence::RosterEntry;
use crate::types::{de_count, de_ratio};

/// Shown in place of any figure that could not be fetched.
pub const PLACEHOLDER: &str = "—";

/// Aggregate `{total, presentes, ausentes, percentagem}` for one culto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    #[serde(default, deserialize_with = "de_count")]
    pub total: i64,
    #[serde(default, deserialize_with = "de_count")]
    pub presentes: i64,
    #[serde(default, deserialize_with = "de_count")]
    pub ausentes: i64,
    #[serde(default, deserialize_with = "de_ratio")]
    pub percentagem: f64,
}

impl ReportSnapshot {
    /// Build a snapshot from raw counts. `ausentes` and `percentagem` are
    /// always derived, never supplied.
    pub fn from_counts(total: i64, presentes: i64) -> Self {
        Self {
            total,
            presentes,
            ausentes: total - presentes,
            percentagem: percentage(presentes, total),
        }
    }

    /// Attendance rate formatted for display, e.g. `"33.3%"`.
    pub fn rate_display(&self) -> String {
        format!("{:.1}%", self.percentagem)
    }
}

/// Tally a roster. Every entry counts toward `total`; absence is the default.
pub fn derive_stats(entries: &[RosterEntry]) -> ReportSnapshot {
    let total = entries.len() as i64;
    let presentes = entries.iter().filter(|e| e.presente).count() as i64;
    ReportSnapshot::from_counts(total, presentes)
}

/// `present / total * 100`, rounded to one decimal. A zero total yields `0`.
pub fn percentage(present: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = present as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Render an optional count, degrading to [`PLACEHOLDER`].
pub fn display_count(value: Option<i64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

/// Render an optional snapshot's rate, degrading to [`PLACEHOLDER`].
pub fn display_rate(snapshot: Option<&ReportSnapshot>) -> String {
    snapshot.map_or_else(|| PLACEHOLDER.to_string(), ReportSnapshot::rate_display)
}
