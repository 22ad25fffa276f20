//! Typed incident draft accumulated by the form layer.
//!
//! A draft is deliberately loose (Option-valued fields) while the user
//! is editing; it is only validated when submitted through the
//! repository. Image intake is bounds-checked here so a slot can never
//! silently grow past the cap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::model::{Frequency, Incident, Priority, Severity, Status};

pub const MAX_IMAGES_PER_SLOT: usize = 3;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preliminary_assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images_before: Vec<String>,
    #[serde(default)]
    pub images_after: Vec<String>,
}

impl IncidentDraft {
    /// Appends a "before" image, rejecting once the slot is full.
    pub fn push_image_before(&mut self, encoded: String) -> Result<(), TrackerError> {
        push_capped(&mut self.images_before, encoded)
    }

    /// Appends an "after" image, rejecting once the slot is full.
    pub fn push_image_after(&mut self, encoded: String) -> Result<(), TrackerError> {
        push_capped(&mut self.images_after, encoded)
    }

    pub fn to_registry_draft(&self) -> incident_registry::IncidentDraftV1 {
        incident_registry::IncidentDraftV1 {
            title: self.title.clone().unwrap_or_default(),
            project: self.project.clone().unwrap_or_default(),
            area: self.area.clone().unwrap_or_default(),
            severity: self.severity.map(|s| s.key().to_string()),
            priority: self.priority.map(|p| p.key().to_string()),
            frequency: self.frequency.map(|f| f.key().to_string()),
            status: self.status.map(|s| s.key().to_string()),
            incomplete_reason: self.incomplete_reason.clone(),
        }
    }

    /// Update view of the draft: absent fields stay absent so the
    /// patch validator knows they are not being touched.
    pub fn to_registry_patch(&self) -> incident_registry::IncidentPatchV1 {
        incident_registry::IncidentPatchV1 {
            title: self.title.clone(),
            project: self.project.clone(),
            area: self.area.clone(),
            severity: self.severity.map(|s| s.key().to_string()),
            priority: self.priority.map(|p| p.key().to_string()),
            frequency: self.frequency.map(|f| f.key().to_string()),
            status: self.status.map(|s| s.key().to_string()),
            incomplete_reason: self.incomplete_reason.clone(),
        }
    }
}

fn push_capped(slot: &mut Vec<String>, encoded: String) -> Result<(), TrackerError> {
    if slot.len() >= MAX_IMAGES_PER_SLOT {
        return Err(TrackerError::ImageLimit(MAX_IMAGES_PER_SLOT));
    }
    slot.push(encoded);
    Ok(())
}

/// Draft for duplicating an existing incident. Copies what describes
/// the problem, clears everything that describes its handling, and
/// restamps the reporter to the current actor.
pub fn clone_draft(incident: &Incident, actor: &crate::model::SessionUser) -> IncidentDraft {
    IncidentDraft {
        title: Some(format!("{} (copy)", incident.title)),
        project: Some(incident.project.clone()),
        area: Some(incident.area.clone()),
        incident_type: Some(incident.incident_type.clone()),
        severity: Some(incident.severity),
        priority: Some(incident.priority),
        frequency: Some(incident.frequency),
        status: Some(Status::New),
        description: Some(incident.description.clone()),
        reporter: Some(actor.name.clone()),
        reporter_phone: Some(actor.phone.clone()),
        contact_person: incident.contact_person.clone(),
        contact_phone: incident.contact_phone.clone(),
        assignee: None,
        assignee_phone: None,
        receiver: None,
        receiver_phone: None,
        root_cause: None,
        resolution: None,
        preliminary_assessment: None,
        estimated_time: None,
        incomplete_reason: None,
        occurred_at: incident.occurred_at,
        completed_at: None,
        images_before: incident.images_before.clone(),
        images_after: Vec::new(),
    }
}
