use serde::{Deserialize, Serialize};

pub const SEVERITIES: &[&str] = &["CRITICAL", "MAJOR", "MINOR"];
pub const PRIORITIES: &[&str] = &["IMMEDIATE", "URGENT_1H", "HIGH_2H"];
pub const FREQUENCIES: &[&str] = &["NONE", "DAILY", "WEEKLY", "MONTHLY"];
pub const STATUSES: &[&str] = &["NEW", "IN_PROGRESS", "DONE", "MONITOR", "INCOMPLETE"];

/// Incident payload as submitted at the create/update boundary.
/// Fields arrive as strings; the domain crate owns the typed enums.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDraftV1 {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub incomplete_reason: Option<String>,
}

/// Update payload: every field optional. An absent field leaves the
/// stored value alone, so only the fields that are present get checked.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPatchV1 {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub incomplete_reason: Option<String>,
}

/// Validates a draft before any write happens. Missing required fields
/// are collected and reported together, not one at a time.
pub fn validate_draft(draft: &IncidentDraftV1) -> Result<(), Vec<String>> {
    let mut missing = Vec::new();
    if draft.title.trim().is_empty() {
        missing.push("title".to_string());
    }
    if draft.project.trim().is_empty() {
        missing.push("project".to_string());
    }
    if draft.area.trim().is_empty() {
        missing.push("area".to_string());
    }

    check_vocabulary(
        &mut missing,
        draft.severity.as_deref(),
        draft.priority.as_deref(),
        draft.frequency.as_deref(),
        draft.status.as_deref(),
    );
    check_incomplete_reason(
        &mut missing,
        draft.status.as_deref(),
        draft.incomplete_reason.as_deref(),
    );

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// Validates an update patch. Required fields may be absent (the
/// stored document already has them) but must not be blanked out;
/// enum vocabulary and the INCOMPLETE reason are checked whenever the
/// patch carries them.
pub fn validate_patch(patch: &IncidentPatchV1) -> Result<(), Vec<String>> {
    let mut missing = Vec::new();
    if patch.title.as_deref().map_or(false, |t| t.trim().is_empty()) {
        missing.push("title".to_string());
    }
    if patch.project.as_deref().map_or(false, |p| p.trim().is_empty()) {
        missing.push("project".to_string());
    }
    if patch.area.as_deref().map_or(false, |a| a.trim().is_empty()) {
        missing.push("area".to_string());
    }

    check_vocabulary(
        &mut missing,
        patch.severity.as_deref(),
        patch.priority.as_deref(),
        patch.frequency.as_deref(),
        patch.status.as_deref(),
    );
    check_incomplete_reason(
        &mut missing,
        patch.status.as_deref(),
        patch.incomplete_reason.as_deref(),
    );

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

fn check_vocabulary(
    missing: &mut Vec<String>,
    severity: Option<&str>,
    priority: Option<&str>,
    frequency: Option<&str>,
    status: Option<&str>,
) {
    if let Some(severity) = severity {
        if !SEVERITIES.contains(&severity) {
            missing.push(format!("severity '{severity}' is not recognized"));
        }
    }
    if let Some(priority) = priority {
        if !PRIORITIES.contains(&priority) {
            missing.push(format!("priority '{priority}' is not recognized"));
        }
    }
    if let Some(frequency) = frequency {
        if !FREQUENCIES.contains(&frequency) {
            missing.push(format!("frequency '{frequency}' is not recognized"));
        }
    }
    if let Some(status) = status {
        if !STATUSES.contains(&status) {
            missing.push(format!("status '{status}' is not recognized"));
        }
    }
}

fn check_incomplete_reason(
    missing: &mut Vec<String>,
    status: Option<&str>,
    incomplete_reason: Option<&str>,
) {
    if status == Some("INCOMPLETE")
        && incomplete_reason.map_or(true, |r| r.trim().is_empty())
    {
        missing.push("incompleteReason".to_string());
    }
}
