//! Statistics over the incident collection.
//!
//! Everything here is a pure recompute over the full list; callers run
//! it again on every data change rather than maintaining counters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Frequency, Incident, Severity, Status};

pub const TOP_AREA_LIMIT: usize = 5;

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub done: usize,
    pub critical: usize,
    /// Rounded percentage of done incidents; 0 when the list is empty.
    pub completion_rate: u32,
    pub by_project: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
    pub by_frequency: BTreeMap<String, usize>,
}

pub fn summarize(incidents: &[Incident]) -> Summary {
    let mut by_project = BTreeMap::new();
    let mut by_type = BTreeMap::new();

    // Enum-keyed maps carry every key even at zero so the view never
    // has to invent missing rows.
    let mut by_severity: BTreeMap<String, usize> = Severity::ALL
        .iter()
        .map(|s| (s.key().to_string(), 0))
        .collect();
    let mut by_frequency: BTreeMap<String, usize> = Frequency::ALL
        .iter()
        .map(|f| (f.key().to_string(), 0))
        .collect();

    let mut done = 0;
    let mut critical = 0;

    for incident in incidents {
        if incident.status == Status::Done {
            done += 1;
        }
        if incident.severity == Severity::Critical {
            critical += 1;
        }
        *by_project.entry(incident.project.clone()).or_insert(0) += 1;
        *by_type.entry(incident.incident_type.clone()).or_insert(0) += 1;
        *by_severity
            .entry(incident.severity.key().to_string())
            .or_insert(0) += 1;
        *by_frequency
            .entry(incident.frequency.key().to_string())
            .or_insert(0) += 1;
    }

    let total = incidents.len();
    let completion_rate = if total == 0 {
        0
    } else {
        ((done as f64 / total as f64) * 100.0).round() as u32
    };

    Summary {
        total,
        done,
        critical,
        completion_rate,
        by_project,
        by_type,
        by_severity,
        by_frequency,
    }
}

/// Top-N "project - area" pairs by incident count, descending.
/// Ties keep first-seen order (stable sort).
pub fn top_areas(incidents: &[Incident], limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for incident in incidents {
        if incident.project.is_empty() || incident.area.is_empty() {
            continue;
        }
        let key = format!("{} - {}", incident.project, incident.area);
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}
