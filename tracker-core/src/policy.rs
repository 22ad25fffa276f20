//! Edit-permission policy.
//!
//! Client-side only: a false result disables mutation controls, it is
//! not a security boundary. Re-evaluate whenever the incident or the
//! viewer changes; never cache the answer past a single view cycle.

use crate::model::{Incident, Role, SessionUser};

/// Whether `viewer` may mutate `incident`.
///
/// `None` means an incident is being created, which is always allowed.
/// For an existing incident the viewer must be a manager, the creator,
/// or the assigned technician. The assignee match is by display name,
/// matching the stored assignment field (see DESIGN.md for the known
/// weakness of that join).
pub fn can_edit(incident: Option<&Incident>, viewer: &SessionUser) -> bool {
    let Some(incident) = incident else {
        return true;
    };

    if viewer.role == Role::Manager {
        return true;
    }
    if incident.created_by == viewer.uid {
        return true;
    }
    incident.assignee.as_deref() == Some(viewer.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frequency, Priority, Severity, Status};

    fn viewer(uid: &str, name: &str, role: Role) -> SessionUser {
        SessionUser {
            uid: uid.into(),
            email: format!("{uid}@demo.com"),
            name: name.into(),
            phone: String::new(),
            title: "Member".into(),
            role,
        }
    }

    fn incident(created_by: &str, assignee: Option<&str>) -> Incident {
        Incident {
            id: "inc-1".into(),
            title: "Network switch rebooting".into(),
            project: "Project Alpha".into(),
            area: "Server room".into(),
            incident_type: "Network infrastructure".into(),
            severity: Severity::Major,
            priority: Priority::High2h,
            frequency: Frequency::None,
            status: Status::New,
            description: String::new(),
            reporter: String::new(),
            reporter_phone: String::new(),
            contact_person: None,
            contact_phone: None,
            assignee: assignee.map(str::to_string),
            assignee_phone: None,
            receiver: None,
            receiver_phone: None,
            root_cause: None,
            resolution: None,
            preliminary_assessment: None,
            estimated_time: None,
            incomplete_reason: None,
            occurred_at: None,
            completed_at: None,
            images_before: Vec::new(),
            images_after: Vec::new(),
            created_at: None,
            created_by: created_by.into(),
            updated_at: None,
        }
    }

    #[test]
    fn creation_is_always_allowed() {
        let stranger = viewer("u2", "Someone Else", Role::User);
        assert!(can_edit(None, &stranger));
    }

    #[test]
    fn creator_may_edit() {
        let inc = incident("u1", None);
        assert!(can_edit(Some(&inc), &viewer("u1", "Lena Pham", Role::User)));
    }

    #[test]
    fn manager_may_edit_anything() {
        let inc = incident("u1", None);
        assert!(can_edit(Some(&inc), &viewer("m1", "Morgan Quan", Role::Manager)));
    }

    #[test]
    fn assignee_match_is_by_display_name() {
        let inc = incident("u1", Some("Taylor Vu"));
        assert!(can_edit(Some(&inc), &viewer("t9", "Taylor Vu", Role::Tech)));
        assert!(!can_edit(Some(&inc), &viewer("t9", "Taylor V.", Role::Tech)));
    }

    #[test]
    fn unrelated_user_is_read_only() {
        let inc = incident("u1", None);
        assert!(!can_edit(Some(&inc), &viewer("u2", "Someone Else", Role::User)));
    }

    #[test]
    fn unassigned_incident_denies_non_creator_tech() {
        let inc = incident("u1", None);
        assert!(!can_edit(Some(&inc), &viewer("t1", "Taylor Vu", Role::Tech)));
    }
}
