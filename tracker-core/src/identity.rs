//! Identity resolution and reference-data seeding.
//!
//! An authenticated principal is just an email; the profile behind it
//! comes from the users collection, falling back to the static seed
//! list so a fresh deployment is usable before anyone has saved a
//! profile.

use tracing::warn;

use crate::error::StoreError;
use crate::model::{Project, Role, SessionUser, UserProfile};
use crate::store::Store;

pub fn seed_profiles() -> Vec<UserProfile> {
    vec![
        UserProfile {
            email: "manager@demo.com".into(),
            name: "Morgan Quan".into(),
            phone: "0909000111".into(),
            title: "Project manager".into(),
            role: Role::Manager,
        },
        UserProfile {
            email: "tech@demo.com".into(),
            name: "Taylor Vu".into(),
            phone: "0912333444".into(),
            title: "Technician".into(),
            role: Role::Tech,
        },
        UserProfile {
            email: "user@demo.com".into(),
            name: "Lena Pham".into(),
            phone: "0988777666".into(),
            title: "Office staff".into(),
            role: Role::User,
        },
    ]
}

pub fn seed_projects() -> Vec<Project> {
    vec![
        Project {
            name: "Project Alpha".into(),
            areas: vec![
                "Main lobby".into(),
                "Server room".into(),
                "Office floor 2".into(),
                "Pantry".into(),
                "Parking garage".into(),
            ],
        },
        Project {
            name: "Project Beta".into(),
            areas: vec![
                "Large meeting room".into(),
                "Small meeting room".into(),
                "Reception".into(),
                "Hallway".into(),
            ],
        },
        Project {
            name: "Center Point Tower".into(),
            areas: vec![
                "Elevator A".into(),
                "Elevator B".into(),
                "Central cooling plant".into(),
                "Rooftop".into(),
            ],
        },
        Project {
            name: "Logistics Warehouse".into(),
            areas: vec![
                "Inbound gate".into(),
                "Cold storage A".into(),
                "Chilled storage B".into(),
                "Packing area".into(),
            ],
        },
    ]
}

pub fn incident_types() -> Vec<String> {
    [
        "Hardware",
        "Software",
        "User",
        "Network infrastructure",
        "Electrical & HVAC",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Stored profile for `email`, else the seed fallback, else `None`.
/// A store failure degrades to the fallback rather than blocking
/// login; the detail goes to the log.
pub fn resolve_profile(store: &Store, email: &str) -> Option<UserProfile> {
    match store.find_user_by_email(email) {
        Ok(Some(profile)) => Some(profile),
        Ok(None) => seed_profiles().into_iter().find(|p| p.email == email),
        Err(err) => {
            warn!(email, error = %err, "profile lookup failed, using seed fallback");
            seed_profiles().into_iter().find(|p| p.email == email)
        }
    }
}

/// Builds the session user from whatever profile was resolved.
/// Missing profile data degrades to email-as-name, "Member", `User`.
pub fn session_user(uid: &str, email: &str, profile: Option<UserProfile>) -> SessionUser {
    match profile {
        Some(p) => SessionUser {
            uid: uid.to_string(),
            email: email.to_string(),
            name: p.name,
            phone: p.phone,
            title: p.title,
            role: p.role,
        },
        None => SessionUser {
            uid: uid.to_string(),
            email: email.to_string(),
            name: email.to_string(),
            phone: String::new(),
            title: "Member".into(),
            role: Role::User,
        },
    }
}

/// Seeds users and projects collections when empty. Ran once after a
/// successful sign-in, mirroring the original boot sequence.
pub fn seed_reference_data(store: &Store) -> Result<(), StoreError> {
    store.seed_users(&seed_profiles())?;
    store.seed_projects(&seed_projects())?;
    Ok(())
}
