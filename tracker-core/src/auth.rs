//! Authentication seam.
//!
//! The application only depends on the `Authenticator` trait; the
//! local implementation keeps sha2 digests in the credentials
//! collection. Session-change listeners fire on login and logout so
//! views can react without polling.

use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::AuthError;
use crate::identity;
use crate::model::SessionUser;
use crate::store::Store;

pub type SessionListener = Box<dyn Fn(Option<&SessionUser>) + Send + Sync>;

pub trait Authenticator: Send + Sync {
    /// Resolves credentials to a session user. Any credential mismatch
    /// collapses to `InvalidCredentials`; nothing more specific leaks.
    fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    fn sign_out(&self);

    /// Requires re-proof of the old password before accepting the new
    /// one; a mismatch fails distinctly from transport errors.
    fn change_password(&self, email: &str, old: &str, new: &str) -> Result<(), AuthError>;

    fn on_session_change(&self, listener: SessionListener);
}

pub struct LocalAuthenticator {
    store: Store,
    listeners: Arc<Mutex<Vec<SessionListener>>>,
}

impl LocalAuthenticator {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers demo credentials for accounts that have none yet.
    /// Mirrors the seeded demo accounts of the original deployment.
    pub fn seed_demo_credentials(&self, password: &str) -> Result<(), AuthError> {
        for profile in identity::seed_profiles() {
            let existing = self
                .store
                .credential_digest(&profile.email)
                .map_err(|e| AuthError::Transport(e.to_string()))?;
            if existing.is_none() {
                self.store
                    .set_credential(&profile.email, &digest(password))
                    .map_err(|e| AuthError::Transport(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn notify(&self, session: Option<&SessionUser>) {
        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener(session);
            }
        }
    }
}

impl Authenticator for LocalAuthenticator {
    fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let stored = self
            .store
            .credential_digest(email)
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let Some(stored) = stored else {
            return Err(AuthError::InvalidCredentials);
        };
        if stored != digest(password) {
            return Err(AuthError::InvalidCredentials);
        }

        let profile = identity::resolve_profile(&self.store, email);
        let user = identity::session_user(&uid_for(email), email, profile);
        info!(email, "signed in");
        self.notify(Some(&user));
        Ok(user)
    }

    fn sign_out(&self) {
        info!("signed out");
        self.notify(None);
    }

    fn change_password(&self, email: &str, old: &str, new: &str) -> Result<(), AuthError> {
        let stored = self
            .store
            .credential_digest(email)
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let Some(stored) = stored else {
            return Err(AuthError::InvalidCredentials);
        };
        if stored != digest(old) {
            return Err(AuthError::WrongPassword);
        }
        self.store
            .set_credential(email, &digest(new))
            .map_err(|e| AuthError::Transport(e.to_string()))
    }

    fn on_session_change(&self, listener: SessionListener) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }
}

fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Stable principal id derived from the email; stands in for the
/// provider-issued uid of the hosted identity service.
fn uid_for(email: &str) -> String {
    format!("uid-{}", hex::encode(&Sha256::digest(email.as_bytes())[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn db_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        format!("/tmp/incident-tracker-tests/{name}-{nanos}.db")
    }

    fn auth(name: &str) -> LocalAuthenticator {
        let store = Store::open(&db_path(name)).expect("open");
        let auth = LocalAuthenticator::new(store);
        auth.seed_demo_credentials("123456").expect("seed");
        auth
    }

    #[test]
    fn sign_in_resolves_seeded_profile() {
        let auth = auth("sign-in");
        let user = auth.sign_in("tech@demo.com", "123456").expect("sign in");
        assert_eq!(user.name, "Taylor Vu");
        assert_eq!(user.role, crate::model::Role::Tech);
        assert!(user.uid.starts_with("uid-"));
    }

    #[test]
    fn bad_password_and_unknown_email_fail_the_same_way() {
        let auth = auth("bad-creds");
        let wrong = auth.sign_in("tech@demo.com", "nope").expect_err("wrong");
        let unknown = auth.sign_in("ghost@demo.com", "123456").expect_err("unknown");
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[test]
    fn change_password_requires_old_password() {
        let auth = auth("change-pass");
        let err = auth
            .change_password("tech@demo.com", "wrong-old", "new-pass")
            .expect_err("must fail");
        assert!(matches!(err, AuthError::WrongPassword));

        auth.change_password("tech@demo.com", "123456", "new-pass")
            .expect("change");
        assert!(auth.sign_in("tech@demo.com", "123456").is_err());
        assert!(auth.sign_in("tech@demo.com", "new-pass").is_ok());
    }

    #[test]
    fn session_listeners_fire_on_login_and_logout() {
        let auth = auth("listeners");
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_listener = fired.clone();
        auth.on_session_change(Box::new(move |_| {
            fired_in_listener.fetch_add(1, Ordering::SeqCst);
        }));

        auth.sign_in("user@demo.com", "123456").expect("sign in");
        auth.sign_out();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
