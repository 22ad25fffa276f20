pub mod commands;
pub mod runtime;
pub mod state;

use tracker_core::auth::LocalAuthenticator;
use tracker_core::draft::IncidentDraft;
use tracker_core::model::{Frequency, Priority, Severity, Status};
use tracker_core::store::Store;

use crate::state::AppState;

const DB_PATH: &str = "tracker.db";
const DEMO_PASSWORD: &str = "123456";

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn build_state() -> Result<AppState, String> {
    let store = Store::open(DB_PATH).map_err(|e| e.to_string())?;
    let auth = LocalAuthenticator::new(store.clone());
    auth.seed_demo_credentials(DEMO_PASSWORD)
        .map_err(|e| e.to_string())?;
    Ok(AppState::new(store, auth))
}

pub fn run() -> Result<(), String> {
    init_tracing();
    let state = build_state()?;
    let _ = commands::list_incidents(&state)?;
    Ok(())
}

#[cfg(feature = "tauri-app")]
pub fn run_tauri() {
    init_tracing();
    tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;

            let state = build_state().map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

            let sink = runtime::TauriSink::new(app.handle());
            let sub = runtime::subscribe_collections(&state.store, sink);
            state.register_subscription(sub);

            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::sign_in_cmd,
            commands::sign_out_cmd,
            commands::change_password_cmd,
            commands::current_user_cmd,
            commands::list_incidents_cmd,
            commands::get_incident_cmd,
            commands::create_incident_cmd,
            commands::update_incident_cmd,
            commands::clone_incident_cmd,
            commands::add_comment_cmd,
            commands::watch_activity_cmd,
            commands::get_activity_cmd,
            commands::can_edit_cmd,
            commands::get_stats_cmd,
            commands::get_top_areas_cmd,
            commands::list_projects_cmd,
            commands::incident_types_cmd
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

pub fn run_demo() -> Result<(), String> {
    init_tracing();
    let state = build_state()?;

    let user = commands::sign_in(&state, "user@demo.com".into(), DEMO_PASSWORD.into())?;
    println!("signed in as {} ({})", user.name, user.title);

    if commands::list_incidents(&state)?.is_empty() {
        seed_demo_data(&state)?;
    }

    let incidents = commands::list_incidents(&state)?;
    println!(
        "incidents:\n{}",
        serde_json::to_string_pretty(&incidents).map_err(|e| e.to_string())?
    );

    if let Some(first) = incidents.first() {
        let activity = commands::get_activity(&state, first.id.clone())?;
        println!(
            "activity:\n{}",
            serde_json::to_string_pretty(&activity).map_err(|e| e.to_string())?
        );
    }

    let summary = commands::get_stats(&state)?;
    println!(
        "stats:\n{}",
        serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?
    );

    let top = commands::get_top_areas(&state)?;
    println!(
        "top areas:\n{}",
        serde_json::to_string_pretty(&top).map_err(|e| e.to_string())?
    );

    Ok(())
}

fn seed_demo_data(state: &AppState) -> Result<(), String> {
    let incident = commands::create_incident(
        state,
        IncidentDraft {
            title: Some("Dell R740 server overheating".into()),
            project: Some("Project Alpha".into()),
            area: Some("Server room".into()),
            incident_type: Some("Hardware".into()),
            severity: Some(Severity::Critical),
            priority: Some(Priority::Immediate),
            frequency: Some(Frequency::None),
            description: Some(
                "Inlet temperature alarm on rack 4; both chassis fans at full speed.".into(),
            ),
            ..IncidentDraft::default()
        },
    )?;

    let previous = commands::get_incident(state, incident.id.clone())?;
    let patch = IncidentDraft {
        title: Some(previous.title.clone()),
        project: Some(previous.project.clone()),
        area: Some(previous.area.clone()),
        incident_type: Some(previous.incident_type.clone()),
        severity: Some(previous.severity),
        priority: Some(previous.priority),
        frequency: Some(previous.frequency),
        description: Some(previous.description.clone()),
        status: Some(Status::InProgress),
        assignee: Some("Taylor Vu".into()),
        assignee_phone: Some("0912333444".into()),
        ..IncidentDraft::default()
    };
    commands::update_incident(state, incident.id.clone(), patch, previous)?;

    commands::add_comment(
        state,
        incident.id,
        "Swapped the clogged air filter; monitoring inlet temps.".into(),
    )?;

    Ok(())
}
