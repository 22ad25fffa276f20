use serde::{Deserialize, Serialize};
use tracing::error;

use tracker_core::auth::Authenticator;
use tracker_core::draft::IncidentDraft;
use tracker_core::error::TrackerError;
use tracker_core::model::{ActivityEntry, Incident, Project, SessionUser};
use tracker_core::stats::{self, Summary, TOP_AREA_LIMIT};
use tracker_core::{identity, policy};

use crate::runtime::{self, EventSink, Subscription};
use crate::state::AppState;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentCardDto {
    pub id: String,
    pub title: String,
    pub project: String,
    pub area: String,
    pub status: String,
    pub status_label: String,
    pub severity: String,
    pub severity_label: String,
    pub priority_label: String,
    pub reporter: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub has_images: bool,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntryDto {
    pub id: String,
    pub kind: String,
    pub content: String,
    pub actor_name: String,
    pub actor_role: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopAreaDto {
    pub location: String,
    pub count: usize,
}

pub fn sign_in(state: &AppState, email: String, password: String) -> Result<SessionUser, String> {
    let user = state
        .auth
        .sign_in(&email, &password)
        .map_err(|e| fail(e.into()))?;

    // One-time reference seeding, same place the original did it:
    // right after authentication. A failure here must not block login.
    if let Err(err) = identity::seed_reference_data(&state.store) {
        error!(error = %err, "reference data seeding failed");
    }

    state.begin_session(user.clone());
    Ok(user)
}

pub fn sign_out(state: &AppState) {
    state.auth.sign_out();
    state.end_session();
}

pub fn change_password(state: &AppState, old: String, new: String) -> Result<(), String> {
    let user = require_session(state)?;
    state
        .auth
        .change_password(&user.email, &old, &new)
        .map_err(|e| fail(e.into()))
}

pub fn current_user(state: &AppState) -> Option<SessionUser> {
    state.current_user()
}

pub fn list_incidents(state: &AppState) -> Result<Vec<IncidentCardDto>, String> {
    let incidents = state.repo.list().map_err(fail)?;
    Ok(incidents.iter().map(card_dto).collect())
}

pub fn get_incident(state: &AppState, id: String) -> Result<Incident, String> {
    state.repo.get(&id).map_err(fail)
}

pub fn create_incident(state: &AppState, draft: IncidentDraft) -> Result<Incident, String> {
    let user = require_session(state)?;
    state.repo.create(&draft, &user).map_err(fail)
}

pub fn update_incident(
    state: &AppState,
    id: String,
    patch: IncidentDraft,
    previous: Incident,
) -> Result<(), String> {
    let user = require_session(state)?;
    state.repo.update(&id, &patch, &previous, &user).map_err(fail)
}

/// Duplicates an incident into an unsaved draft. Nothing is persisted
/// until the draft comes back through `create_incident`.
pub fn clone_incident(state: &AppState, id: String) -> Result<IncidentDraft, String> {
    let user = require_session(state)?;
    let incident = state.repo.get(&id).map_err(fail)?;
    Ok(state.repo.clone_draft(&incident, &user))
}

pub fn add_comment(state: &AppState, id: String, text: String) -> Result<(), String> {
    let user = require_session(state)?;
    state.repo.comment(&id, &text, &user).map_err(fail)
}

/// Opens a live channel for one incident's timeline; `activity-updated`
/// events flow through the sink until the handle is cancelled. The
/// handle is also registered with the session so logout closes it.
pub fn watch_activity(state: &AppState, id: &str, sink: impl EventSink) -> Subscription {
    let sub = runtime::subscribe_activity(&state.store, id, sink);
    state.register_subscription(sub.clone());
    sub
}

/// Timeline for one incident, newest entry first.
pub fn get_activity(state: &AppState, id: String) -> Result<Vec<ActivityEntryDto>, String> {
    let mut entries = state.repo.recorder().timeline(&id).map_err(|e| fail(e.into()))?;
    entries.reverse();
    Ok(entries.iter().map(activity_dto).collect())
}

/// Whether the signed-in user may mutate this incident. Purely
/// advisory: the view disables its save controls on `false`.
pub fn can_edit(state: &AppState, id: String) -> Result<bool, String> {
    let Some(user) = state.current_user() else {
        return Ok(false);
    };
    let incident = state.repo.get(&id).map_err(fail)?;
    Ok(policy::can_edit(Some(&incident), &user))
}

pub fn get_stats(state: &AppState) -> Result<Summary, String> {
    let incidents = state.repo.list().map_err(fail)?;
    Ok(stats::summarize(&incidents))
}

pub fn get_top_areas(state: &AppState) -> Result<Vec<TopAreaDto>, String> {
    let incidents = state.repo.list().map_err(fail)?;
    Ok(stats::top_areas(&incidents, TOP_AREA_LIMIT)
        .into_iter()
        .map(|(location, count)| TopAreaDto { location, count })
        .collect())
}

pub fn list_projects(state: &AppState) -> Result<Vec<Project>, String> {
    state.store.list_projects().map_err(|e| fail(e.into()))
}

pub fn incident_types() -> Vec<String> {
    identity::incident_types()
}

fn require_session(state: &AppState) -> Result<SessionUser, String> {
    state
        .current_user()
        .ok_or_else(|| "You are signed out. Please sign in again.".to_string())
}

/// Logs the full failure, hands the user the sanitized message.
fn fail(err: TrackerError) -> String {
    error!(error = %err, "command failed");
    err.user_message()
}

fn card_dto(incident: &Incident) -> IncidentCardDto {
    IncidentCardDto {
        id: incident.id.clone(),
        title: incident.title.clone(),
        project: incident.project.clone(),
        area: incident.area.clone(),
        status: incident.status.key().to_string(),
        status_label: incident.status.label().to_string(),
        severity: incident.severity.key().to_string(),
        severity_label: incident.severity.label().to_string(),
        priority_label: incident.priority.label().to_string(),
        reporter: incident.reporter.clone(),
        description: incident.description.clone(),
        estimated_time: incident.estimated_time.clone(),
        has_images: !incident.images_before.is_empty() || !incident.images_after.is_empty(),
        created_at: incident.created_at.map(|ts| ts.to_rfc3339()),
    }
}

fn activity_dto(entry: &ActivityEntry) -> ActivityEntryDto {
    ActivityEntryDto {
        id: entry.id.clone(),
        kind: match entry.kind {
            tracker_core::model::ActivityKind::System => "SYSTEM".to_string(),
            tracker_core::model::ActivityKind::Comment => "COMMENT".to_string(),
        },
        content: entry.content.clone(),
        actor_name: entry.actor.name.clone(),
        actor_role: format!("{:?}", entry.actor.role).to_uppercase(),
        created_at: entry.created_at.to_rfc3339(),
    }
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn sign_in_cmd(
    state: tauri::State<'_, AppState>,
    email: String,
    password: String,
) -> Result<SessionUser, String> {
    sign_in(&state, email, password)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn sign_out_cmd(state: tauri::State<'_, AppState>) {
    sign_out(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn change_password_cmd(
    state: tauri::State<'_, AppState>,
    old: String,
    new: String,
) -> Result<(), String> {
    change_password(&state, old, new)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn current_user_cmd(state: tauri::State<'_, AppState>) -> Option<SessionUser> {
    current_user(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn list_incidents_cmd(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<IncidentCardDto>, String> {
    list_incidents(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn get_incident_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
) -> Result<Incident, String> {
    get_incident(&state, incident_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn create_incident_cmd(
    state: tauri::State<'_, AppState>,
    draft: IncidentDraft,
) -> Result<Incident, String> {
    create_incident(&state, draft)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn update_incident_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
    patch: IncidentDraft,
    previous: Incident,
) -> Result<(), String> {
    update_incident(&state, incident_id, patch, previous)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn clone_incident_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
) -> Result<IncidentDraft, String> {
    clone_incident(&state, incident_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn add_comment_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
    text: String,
) -> Result<(), String> {
    add_comment(&state, incident_id, text)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn watch_activity_cmd(
    app: tauri::AppHandle,
    state: tauri::State<'_, AppState>,
    incident_id: String,
) {
    watch_activity(&state, &incident_id, runtime::TauriSink::new(app));
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn get_activity_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
) -> Result<Vec<ActivityEntryDto>, String> {
    get_activity(&state, incident_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn can_edit_cmd(
    state: tauri::State<'_, AppState>,
    incident_id: String,
) -> Result<bool, String> {
    can_edit(&state, incident_id)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn get_stats_cmd(state: tauri::State<'_, AppState>) -> Result<Summary, String> {
    get_stats(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn get_top_areas_cmd(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<TopAreaDto>, String> {
    get_top_areas(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn list_projects_cmd(state: tauri::State<'_, AppState>) -> Result<Vec<Project>, String> {
    list_projects(&state)
}

#[cfg(feature = "tauri-app")]
#[tauri::command(rename_all = "camelCase")]
pub fn incident_types_cmd() -> Vec<String> {
    incident_types()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::auth::LocalAuthenticator;
    use tracker_core::model::Status;
    use tracker_core::store::Store;

    fn db_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        format!("/tmp/incident-tracker-tests/{name}-{nanos}.db")
    }

    fn app_state(name: &str) -> AppState {
        let store = Store::open(&db_path(name)).expect("open");
        let auth = LocalAuthenticator::new(store.clone());
        auth.seed_demo_credentials("123456").expect("seed creds");
        AppState::new(store, auth)
    }

    fn draft(title: &str) -> IncidentDraft {
        IncidentDraft {
            title: Some(title.into()),
            project: Some("Project Alpha".into()),
            area: Some("Server room".into()),
            ..IncidentDraft::default()
        }
    }

    #[test]
    fn sign_in_starts_session_and_seeds_reference_data() {
        let state = app_state("sign-in");
        let user = sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        assert_eq!(user.name, "Lena Pham");
        assert!(state.current_user().is_some());
        assert_eq!(list_projects(&state).expect("projects").len(), 4);
    }

    #[test]
    fn sign_out_clears_session() {
        let state = app_state("sign-out");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        sign_out(&state);
        assert!(state.current_user().is_none());

        let err = create_incident(&state, draft("anything")).expect_err("must fail");
        assert!(err.contains("signed out"));
    }

    #[test]
    fn create_update_and_activity_flow() {
        let state = app_state("flow");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        let incident = create_incident(&state, draft("UPS battery alarm")).expect("create");
        assert_eq!(incident.status, Status::New);

        sign_out(&state);
        sign_in(&state, "tech@demo.com".into(), "123456".into()).expect("tech in");
        let previous = get_incident(&state, incident.id.clone()).expect("get");
        let mut patch = draft("UPS battery alarm");
        patch.status = Some(Status::InProgress);
        patch.assignee = Some("Taylor Vu".into());
        update_incident(&state, incident.id.clone(), patch, previous).expect("update");

        add_comment(&state, incident.id.clone(), "battery pack ordered".into()).expect("comment");

        let activity = get_activity(&state, incident.id.clone()).expect("activity");
        assert_eq!(activity.len(), 4);
        // newest first
        assert_eq!(activity[0].kind, "COMMENT");
        assert_eq!(activity[0].content, "battery pack ordered");
        assert_eq!(
            activity[3].content,
            "created a new incident report."
        );
    }

    #[test]
    fn watch_activity_channel_closes_on_sign_out() {
        struct NullSink;
        impl EventSink for NullSink {
            fn emit_json(&self, _event: &str, _payload: serde_json::Value) {}
        }

        let state = app_state("watch");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        let incident = create_incident(&state, draft("Flickering hallway lights")).expect("create");

        let sub = watch_activity(&state, &incident.id, NullSink);
        assert!(!sub.is_cancelled());

        sign_out(&state);
        assert!(sub.is_cancelled());
    }

    #[test]
    fn can_edit_follows_the_policy() {
        let state = app_state("policy");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        let incident = create_incident(&state, draft("Door stuck")).expect("create");
        assert!(can_edit(&state, incident.id.clone()).expect("creator"));

        sign_out(&state);
        sign_in(&state, "tech@demo.com".into(), "123456".into()).expect("tech in");
        assert!(!can_edit(&state, incident.id.clone()).expect("stranger tech"));

        sign_out(&state);
        sign_in(&state, "manager@demo.com".into(), "123456".into()).expect("manager in");
        assert!(can_edit(&state, incident.id.clone()).expect("manager"));
    }

    #[test]
    fn stats_and_top_areas_reflect_the_collection() {
        let state = app_state("stats");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        for i in 0..3 {
            create_incident(&state, draft(&format!("incident {i}"))).expect("create");
        }

        let summary = get_stats(&state).expect("stats");
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completion_rate, 0);

        let top = get_top_areas(&state).expect("top");
        assert_eq!(top[0].location, "Project Alpha - Server room");
        assert_eq!(top[0].count, 3);
    }

    #[test]
    fn change_password_needs_the_old_one() {
        let state = app_state("password");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        let err = change_password(&state, "wrong".into(), "next".into()).expect_err("must fail");
        assert!(err.contains("current password"));
        change_password(&state, "123456".into(), "next".into()).expect("change");
    }

    #[test]
    fn card_dto_labels_match_the_incident() {
        let state = app_state("cards");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        create_incident(&state, draft("Leaking pipe")).expect("create");

        let cards = list_incidents(&state).expect("cards");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].status, "NEW");
        assert_eq!(cards[0].status_label, "New");
        assert_eq!(cards[0].severity_label, "Minor");
        assert!(!cards[0].has_images);
        assert_eq!(cards[0].reporter, "Lena Pham");
    }

    #[test]
    fn clone_command_returns_unsaved_draft() {
        let state = app_state("clone-cmd");
        sign_in(&state, "user@demo.com".into(), "123456".into()).expect("sign in");
        let incident = create_incident(&state, draft("Broken chair")).expect("create");

        let cloned = clone_incident(&state, incident.id.clone()).expect("clone");
        assert_eq!(cloned.title.as_deref(), Some("Broken chair (copy)"));
        assert_eq!(list_incidents(&state).expect("cards").len(), 1);
    }
}
