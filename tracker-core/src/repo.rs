//! Incident repository: the one write path for incident documents.
//!
//! Every mutation stamps its own timestamps, and status/assignment
//! changes are narrated into the activity feed right after the write.
//! The incident write and its narration append are two independent
//! writes; a failure between them leaves the timeline short one entry
//! and that gap is accepted, not repaired.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::activity::{
    assignment_narration, creation_narration, status_change_narration, ActivityRecorder,
};
use crate::draft::{self, IncidentDraft};
use crate::error::TrackerError;
use crate::model::{Frequency, Incident, Priority, SessionUser, Severity, Status};
use crate::store::Store;

#[derive(Clone)]
pub struct IncidentRepository {
    store: Store,
    recorder: ActivityRecorder,
}

impl IncidentRepository {
    pub fn new(store: Store) -> Self {
        let recorder = ActivityRecorder::new(store.clone());
        Self { store, recorder }
    }

    pub fn recorder(&self) -> &ActivityRecorder {
        &self.recorder
    }

    /// Creates an incident from a submitted draft. Validation runs
    /// before any write; the caller-supplied status is discarded and
    /// the document always starts at `New`.
    pub fn create(
        &self,
        submitted: &IncidentDraft,
        creator: &SessionUser,
    ) -> Result<Incident, TrackerError> {
        incident_registry::validate_draft(&submitted.to_registry_draft())
            .map_err(TrackerError::Validation)?;

        let incident = Incident {
            id: Uuid::new_v4().to_string(),
            title: submitted.title.clone().unwrap_or_default(),
            project: submitted.project.clone().unwrap_or_default(),
            area: submitted.area.clone().unwrap_or_default(),
            incident_type: submitted
                .incident_type
                .clone()
                .unwrap_or_else(|| "Hardware".to_string()),
            severity: submitted.severity.unwrap_or(Severity::Minor),
            priority: submitted.priority.unwrap_or(Priority::High2h),
            frequency: submitted.frequency.unwrap_or(Frequency::None),
            status: Status::New,
            description: submitted.description.clone().unwrap_or_default(),
            reporter: submitted
                .reporter
                .clone()
                .unwrap_or_else(|| creator.name.clone()),
            reporter_phone: submitted
                .reporter_phone
                .clone()
                .unwrap_or_else(|| creator.phone.clone()),
            contact_person: submitted.contact_person.clone(),
            contact_phone: submitted.contact_phone.clone(),
            assignee: submitted.assignee.clone(),
            assignee_phone: submitted.assignee_phone.clone(),
            receiver: submitted.receiver.clone(),
            receiver_phone: submitted.receiver_phone.clone(),
            root_cause: submitted.root_cause.clone(),
            resolution: submitted.resolution.clone(),
            preliminary_assessment: submitted.preliminary_assessment.clone(),
            estimated_time: submitted.estimated_time.clone(),
            incomplete_reason: submitted.incomplete_reason.clone(),
            occurred_at: submitted.occurred_at,
            completed_at: submitted.completed_at,
            images_before: submitted.images_before.clone(),
            images_after: submitted.images_after.clone(),
            created_at: Some(Utc::now()),
            created_by: creator.uid.clone(),
            updated_at: None,
        };

        self.store.insert_incident(&incident)?;
        info!(incident_id = %incident.id, "incident created");
        self.recorder
            .record_system(&incident.id, creation_narration(), creator)?;
        Ok(incident)
    }

    /// Merges `patch` over the stored document, then narrates status
    /// and assignment changes by diffing the patch against the
    /// caller's last-known snapshot. The snapshot is trusted as-is;
    /// the repository does not re-read prior state before diffing.
    pub fn update(
        &self,
        id: &str,
        patch: &IncidentDraft,
        previous: &Incident,
        actor: &SessionUser,
    ) -> Result<(), TrackerError> {
        if self.store.get_incident(id)?.is_none() {
            return Err(TrackerError::NotFound(id.to_string()));
        }

        incident_registry::validate_patch(&patch.to_registry_patch())
            .map_err(TrackerError::Validation)?;

        let mut patch_doc = serde_json::to_value(patch)
            .map_err(|e| crate::error::StoreError::Transport(e.to_string()))?;
        if let Some(fields) = patch_doc.as_object_mut() {
            fields.insert(
                "updatedAt".to_string(),
                serde_json::to_value(Utc::now())
                    .map_err(|e| crate::error::StoreError::Transport(e.to_string()))?,
            );
        }
        self.store.merge_update_incident(id, &patch_doc)?;

        if let Some(new_status) = patch.status {
            if new_status != previous.status {
                self.recorder.record_system(
                    id,
                    status_change_narration(previous.status, new_status),
                    actor,
                )?;
            }
        }

        if let Some(new_assignee) = patch.assignee.as_deref() {
            if !new_assignee.is_empty() && previous.assignee.as_deref() != Some(new_assignee) {
                self.recorder
                    .record_system(id, assignment_narration(new_assignee), actor)?;
            }
        }

        Ok(())
    }

    /// Appends a user comment to the incident timeline.
    pub fn comment(
        &self,
        id: &str,
        text: &str,
        actor: &SessionUser,
    ) -> Result<(), TrackerError> {
        self.recorder.record_comment(id, text, actor)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Incident, TrackerError> {
        self.store
            .get_incident(id)?
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Incident>, TrackerError> {
        Ok(self.store.list_incidents()?)
    }

    /// Unsaved duplicate of an existing incident; persists nothing
    /// until the caller submits it through `create`.
    pub fn clone_draft(&self, incident: &Incident, actor: &SessionUser) -> IncidentDraft {
        draft::clone_draft(incident, actor)
    }
}
