use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Major, Severity::Minor];

    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Major => "Major",
            Severity::Minor => "Minor",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Immediate,
    #[serde(rename = "URGENT_1H")]
    Urgent1h,
    #[serde(rename = "HIGH_2H")]
    High2h,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Immediate => "Immediately",
            Priority::Urgent1h => "Within 1 hour",
            Priority::High2h => "Within 2 hours",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Priority::Immediate => "IMMEDIATE",
            Priority::Urgent1h => "URGENT_1H",
            Priority::High2h => "HIGH_2H",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::None,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Frequency::None => "First occurrence",
            Frequency::Daily => "Several times a day",
            Frequency::Weekly => "Every few days",
            Frequency::Monthly => "Every few months",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Frequency::None => "NONE",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    New,
    InProgress,
    Done,
    Monitor,
    Incomplete,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::New => "New",
            Status::InProgress => "In progress",
            Status::Done => "Done",
            Status::Monitor => "Monitoring",
            Status::Incomplete => "Incomplete",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Status::New => "NEW",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
            Status::Monitor => "MONITOR",
            Status::Incomplete => "INCOMPLETE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Manager,
    Tech,
    User,
}

/// Stored incident document. Field names follow the stored-document
/// vocabulary, hence the camelCase rename.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub project: String,
    pub area: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub severity: Severity,
    pub priority: Priority,
    pub frequency: Frequency,
    pub status: Status,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reporter: String,
    #[serde(default)]
    pub reporter_phone: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub assignee_phone: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub receiver_phone: Option<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub preliminary_assessment: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub incomplete_reason: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images_before: Vec<String>,
    #[serde(default)]
    pub images_after: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    System,
    Comment,
}

/// Snapshot of the acting user at the time an entry was recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    pub name: String,
    pub user_id: String,
    pub role: Role,
}

/// One immutable item in an incident timeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub incident_id: String,
    pub kind: ActivityKind,
    pub content: String,
    pub actor: ActorSnapshot,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub title: String,
    pub role: Role,
}

/// The signed-in user as the rest of the app sees it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub title: String,
    pub role: Role,
}

impl SessionUser {
    pub fn actor_snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            name: self.name.clone(),
            user_id: self.uid.clone(),
            role: self.role,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub areas: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_to_document_vocabulary() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).expect("json"),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::to_string(&Priority::Urgent1h).expect("json"),
            "\"URGENT_1H\""
        );
        assert_eq!(
            serde_json::to_string(&Frequency::None).expect("json"),
            "\"NONE\""
        );
    }

    #[test]
    fn incident_round_trips_with_camel_case_fields() {
        let doc = serde_json::json!({
            "id": "inc-1",
            "title": "AC unit down",
            "project": "Project Alpha",
            "area": "Server room",
            "type": "Electrical & HVAC",
            "severity": "CRITICAL",
            "priority": "IMMEDIATE",
            "frequency": "NONE",
            "status": "NEW",
            "imagesBefore": ["data:image/jpeg;base64,AAA"],
            "createdBy": "uid-1"
        });
        let incident: Incident = serde_json::from_value(doc).expect("decode");
        assert_eq!(incident.incident_type, "Electrical & HVAC");
        assert_eq!(incident.images_before.len(), 1);
        assert!(incident.assignee.is_none());

        let back = serde_json::to_value(&incident).expect("encode");
        assert_eq!(back["imagesBefore"][0], "data:image/jpeg;base64,AAA");
        assert_eq!(back["type"], "Electrical & HVAC");
    }
}
