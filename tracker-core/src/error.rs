//! Error taxonomy for the tracker.
//!
//! Every failure a user action can surface falls in one of these
//! buckets; `user_message` is what the view layer shows, while the
//! underlying detail stays in the log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document exceeds the store size limit")]
    PayloadTooLarge,

    #[error("store failure: {0}")]
    Transport(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("current password does not match")]
    WrongPassword,

    #[error("auth transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("comment is empty")]
    EmptyComment,

    #[error("image slot already holds the maximum of {0} images")]
    ImageLimit(usize),

    #[error("incident not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl TrackerError {
    /// User-facing notice. Transport detail is deliberately withheld
    /// here; callers log the full error before showing this.
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Validation(fields) => {
                format!("Please fill in the required fields: {}", fields.join(", "))
            }
            TrackerError::EmptyComment => "Comment cannot be empty.".to_string(),
            TrackerError::ImageLimit(max) => {
                format!("A maximum of {max} images is allowed per slot.")
            }
            TrackerError::NotFound(_) => "This incident no longer exists.".to_string(),
            TrackerError::Store(StoreError::PayloadTooLarge) => {
                "The report is too large, likely from attached images. Please remove some images."
                    .to_string()
            }
            TrackerError::Store(StoreError::Transport(_)) => {
                "Saving failed. Please try again.".to_string()
            }
            TrackerError::Auth(AuthError::InvalidCredentials) => "Sign-in failed.".to_string(),
            TrackerError::Auth(AuthError::WrongPassword) => {
                "The current password you entered is incorrect.".to_string()
            }
            TrackerError::Auth(AuthError::Transport(_)) => {
                "Sign-in is unavailable. Please try again.".to_string()
            }
        }
    }
}
