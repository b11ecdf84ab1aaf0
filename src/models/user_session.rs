use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Key under which the login state is stored in the session cookie.
pub const SESSION_KEY: &str = "user";

/// Logins last seven days.
pub fn session_duration() -> Duration {
    Duration::days(7)
}

/// Login state sealed into the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub is_logged_in: bool,
    pub email: String,
    /// Unix milliseconds.
    pub expires_at: i64,
}

impl UserSession {
    pub fn logged_in(email: &str) -> Self {
        UserSession {
            is_logged_in: true,
            email: email.to_string(),
            expires_at: (Utc::now() + session_duration()).timestamp_millis(),
        }
    }

    /// A stored session that ran past its expiry reads as logged out.
    pub fn current(stored: Option<UserSession>) -> UserSession {
        match stored {
            Some(session) if session.is_logged_in && !session.is_expired() => session,
            _ => UserSession::default(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now().timestamp_millis()
    }
}
