//! Live subscription pump.
//!
//! The store has no push channel, so subscriptions poll the revision
//! counter and, when it moves, emit full refreshed snapshots through
//! an `EventSink`. Every subscription hands back a cancellable handle.
//! The pump thread holds only a weak reference to the stop flag, so
//! it exits on the next tick after either an explicit `cancel()` or
//! the last handle being dropped; no code path leaves it running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::warn;

use tracker_core::stats;
use tracker_core::store::Store;

const POLL_INTERVAL_MS: u64 = 750;

pub trait EventSink: Send + Sync + 'static {
    fn emit_json(&self, event: &str, payload: serde_json::Value);
}

/// Handle for one live subscription. Cancel on view change or logout;
/// dropping every clone of the handle stops the pump as well.
#[derive(Clone)]
pub struct Subscription {
    stop: Arc<AtomicBool>,
}

impl Subscription {
    fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Collection-level subscription: incidents, projects and the derived
/// statistics, re-emitted in full every time anything changes.
pub fn subscribe_collections(store: &Store, sink: impl EventSink) -> Subscription {
    let sub = Subscription::new();
    let stop = Arc::downgrade(&sub.stop);
    let store = store.clone();

    std::thread::spawn(move || {
        let mut last_rev = -1;
        while pump_should_run(&stop) {
            emit_collection_snapshots(&store, &sink, &mut last_rev);
            std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
        }
    });

    sub
}

/// Per-incident timeline subscription, newest entry first.
pub fn subscribe_activity(
    store: &Store,
    incident_id: &str,
    sink: impl EventSink,
) -> Subscription {
    let sub = Subscription::new();
    let stop = Arc::downgrade(&sub.stop);
    let store = store.clone();
    let incident_id = incident_id.to_string();

    std::thread::spawn(move || {
        let mut last_rev = -1;
        while pump_should_run(&stop) {
            emit_activity_snapshot(&store, &incident_id, &sink, &mut last_rev);
            std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
        }
    });

    sub
}

/// The pump keeps going only while some handle is alive and none has
/// cancelled. A dead weak reference means every handle was dropped.
fn pump_should_run(stop: &Weak<AtomicBool>) -> bool {
    match stop.upgrade() {
        Some(flag) => !flag.load(Ordering::SeqCst),
        None => false,
    }
}

pub(crate) fn emit_collection_snapshots(
    store: &Store,
    sink: &impl EventSink,
    last_rev: &mut i64,
) {
    let rev = match store.revision() {
        Ok(rev) => rev,
        Err(err) => {
            warn!(error = %err, "revision poll failed");
            return;
        }
    };
    if rev == *last_rev {
        return;
    }
    *last_rev = rev;

    match store.list_incidents() {
        Ok(incidents) => {
            sink.emit_json(
                "stats-updated",
                serde_json::to_value(stats::summarize(&incidents)).unwrap_or_default(),
            );
            sink.emit_json(
                "incidents-updated",
                serde_json::to_value(&incidents).unwrap_or_default(),
            );
        }
        Err(err) => warn!(error = %err, "incident snapshot failed"),
    }

    match store.list_projects() {
        Ok(projects) => sink.emit_json(
            "projects-updated",
            serde_json::to_value(&projects).unwrap_or_default(),
        ),
        Err(err) => warn!(error = %err, "project snapshot failed"),
    }
}

pub(crate) fn emit_activity_snapshot(
    store: &Store,
    incident_id: &str,
    sink: &impl EventSink,
    last_rev: &mut i64,
) {
    let rev = match store.revision() {
        Ok(rev) => rev,
        Err(err) => {
            warn!(error = %err, "revision poll failed");
            return;
        }
    };
    if rev == *last_rev {
        return;
    }
    *last_rev = rev;

    match store.activities_for_incident(incident_id) {
        Ok(mut entries) => {
            entries.reverse(); // newest first for the detail view
            sink.emit_json(
                "activity-updated",
                serde_json::json!({
                    "incidentId": incident_id,
                    "entries": serde_json::to_value(&entries).unwrap_or_default(),
                }),
            );
        }
        Err(err) => warn!(error = %err, "activity snapshot failed"),
    }
}

#[cfg(feature = "tauri-app")]
pub struct TauriSink {
    app: tauri::AppHandle,
}

#[cfg(feature = "tauri-app")]
impl TauriSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

#[cfg(feature = "tauri-app")]
impl EventSink for TauriSink {
    fn emit_json(&self, event: &str, payload: serde_json::Value) {
        use tauri::Manager;
        let _ = self.app.emit_all(event, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracker_core::draft::IncidentDraft;
    use tracker_core::model::{Role, SessionUser};
    use tracker_core::repo::IncidentRepository;

    fn db_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        format!("/tmp/incident-tracker-tests/{name}-{nanos}.db")
    }

    #[derive(Default)]
    struct CaptureSink {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl EventSink for CaptureSink {
        fn emit_json(&self, event: &str, _payload: serde_json::Value) {
            if let Ok(mut guard) = self.seen.lock() {
                guard.push(event.to_string());
            }
        }
    }

    fn reporter() -> SessionUser {
        SessionUser {
            uid: "uid-user".into(),
            email: "user@demo.com".into(),
            name: "Lena Pham".into(),
            phone: String::new(),
            title: "Office staff".into(),
            role: Role::User,
        }
    }

    fn draft() -> IncidentDraft {
        IncidentDraft {
            title: Some("Badge reader offline".into()),
            project: Some("Project Alpha".into()),
            area: Some("Main lobby".into()),
            ..IncidentDraft::default()
        }
    }

    #[test]
    fn snapshot_fires_on_revision_change_only() {
        let store = Store::open(&db_path("pump")).expect("open");
        let repo = IncidentRepository::new(store.clone());
        repo.create(&draft(), &reporter()).expect("create");

        let sink = CaptureSink::default();
        let mut last_rev = -1;

        emit_collection_snapshots(&store, &sink, &mut last_rev);
        let first_pass = sink.seen.lock().expect("lock").len();
        assert!(first_pass >= 2); // incidents + stats (+ projects)

        // no writes in between: nothing new
        emit_collection_snapshots(&store, &sink, &mut last_rev);
        assert_eq!(sink.seen.lock().expect("lock").len(), first_pass);

        repo.create(&draft(), &reporter()).expect("create");
        emit_collection_snapshots(&store, &sink, &mut last_rev);
        assert!(sink.seen.lock().expect("lock").len() > first_pass);
    }

    #[test]
    fn activity_snapshot_is_newest_first() {
        let store = Store::open(&db_path("activity-pump")).expect("open");
        let repo = IncidentRepository::new(store.clone());
        let incident = repo.create(&draft(), &reporter()).expect("create");
        repo.comment(&incident.id, "first comment", &reporter())
            .expect("comment");

        struct PayloadSink(Arc<Mutex<Vec<serde_json::Value>>>);
        impl EventSink for PayloadSink {
            fn emit_json(&self, _event: &str, payload: serde_json::Value) {
                self.0.lock().expect("lock").push(payload);
            }
        }

        let payloads = Arc::new(Mutex::new(Vec::new()));
        let sink = PayloadSink(payloads.clone());
        let mut last_rev = -1;
        emit_activity_snapshot(&store, &incident.id, &sink, &mut last_rev);

        let captured = payloads.lock().expect("lock");
        let entries = captured[0]["entries"].as_array().expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["content"], "first comment");
        assert_eq!(entries[1]["content"], "created a new incident report.");
    }

    #[test]
    fn cancelled_subscription_reports_cancelled() {
        let store = Store::open(&db_path("cancel")).expect("open");
        let sub = subscribe_collections(&store, CaptureSink::default());
        assert!(!sub.is_cancelled());
        sub.cancel();
        assert!(sub.is_cancelled());
    }

    #[test]
    fn pump_stops_after_cancel() {
        let sub = Subscription::new();
        let stop = Arc::downgrade(&sub.stop);
        assert!(pump_should_run(&stop));
        sub.cancel();
        assert!(!pump_should_run(&stop));
    }

    #[test]
    fn pump_stops_when_every_handle_is_dropped() {
        let sub = Subscription::new();
        let extra_handle = sub.clone();
        let stop = Arc::downgrade(&sub.stop);

        drop(sub);
        assert!(pump_should_run(&stop)); // one handle still alive

        drop(extra_handle);
        assert!(!pump_should_run(&stop));
    }
}
