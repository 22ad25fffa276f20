//! Activity recorder: the append-only narration feed per incident.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{StoreError, TrackerError};
use crate::model::{ActivityEntry, ActivityKind, ActorSnapshot, SessionUser, Status};
use crate::store::Store;

pub fn status_change_narration(old: Status, new: Status) -> String {
    format!("changed status from {} to {}", old.label(), new.label())
}

pub fn assignment_narration(assignee: &str) -> String {
    format!("assigned to technician: {assignee}")
}

pub fn creation_narration() -> String {
    "created a new incident report.".to_string()
}

#[derive(Clone)]
pub struct ActivityRecorder {
    store: Store,
}

impl ActivityRecorder {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends one entry. Store failures propagate; nothing retries.
    pub fn record(
        &self,
        incident_id: &str,
        kind: ActivityKind,
        content: String,
        actor: ActorSnapshot,
    ) -> Result<ActivityEntry, StoreError> {
        let entry = ActivityEntry {
            id: Uuid::new_v4().to_string(),
            incident_id: incident_id.to_string(),
            kind,
            content,
            actor,
            created_at: Utc::now(),
        };
        self.store.append_activity(&entry)?;
        Ok(entry)
    }

    pub fn record_system(
        &self,
        incident_id: &str,
        content: String,
        actor: &SessionUser,
    ) -> Result<ActivityEntry, StoreError> {
        self.record(incident_id, ActivityKind::System, content, actor.actor_snapshot())
    }

    /// User comment, stored verbatim after trimming. Empty-after-trim
    /// text is rejected before any write.
    pub fn record_comment(
        &self,
        incident_id: &str,
        text: &str,
        actor: &SessionUser,
    ) -> Result<ActivityEntry, TrackerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::EmptyComment);
        }
        Ok(self.record(
            incident_id,
            ActivityKind::Comment,
            trimmed.to_string(),
            actor.actor_snapshot(),
        )?)
    }

    /// Chronological order; callers reverse for newest-first display.
    pub fn timeline(&self, incident_id: &str) -> Result<Vec<ActivityEntry>, StoreError> {
        self.store.activities_for_incident(incident_id)
    }
}
