//! Application state: session, store handles, live subscriptions.
//!
//! This is the explicit replacement for the ambient globals of the
//! original app. Init happens on successful sign-in; logout tears the
//! whole thing down, cancelling every live subscription so callbacks
//! never fire against a dead view.

use std::sync::{Arc, Mutex, RwLock};

use tracker_core::auth::LocalAuthenticator;
use tracker_core::model::SessionUser;
use tracker_core::repo::IncidentRepository;
use tracker_core::store::Store;

use crate::runtime::Subscription;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub repo: IncidentRepository,
    pub auth: Arc<LocalAuthenticator>,
    session: Arc<RwLock<Option<SessionUser>>>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl AppState {
    pub fn new(store: Store, auth: LocalAuthenticator) -> Self {
        Self {
            repo: IncidentRepository::new(store.clone()),
            store,
            auth: Arc::new(auth),
            session: Arc::new(RwLock::new(None)),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }

    pub fn begin_session(&self, user: SessionUser) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(user);
        }
    }

    /// Clears the session and cancels every registered subscription.
    pub fn end_session(&self) {
        if let Ok(mut guard) = self.session.write() {
            *guard = None;
        }
        if let Ok(mut subs) = self.subscriptions.lock() {
            for sub in subs.drain(..) {
                sub.cancel();
            }
        }
    }

    /// Tracks a live subscription so logout can cancel it.
    pub fn register_subscription(&self, sub: Subscription) {
        if let Ok(mut subs) = self.subscriptions.lock() {
            *subs = subs
                .drain(..)
                .filter(|s| !s.is_cancelled())
                .collect();
            subs.push(sub);
        }
    }
}
