//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// In-memory admin session with an idle deadline
///
/// The deadline moves forward on every authenticated request; a session
/// whose deadline passes without activity is expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Email of the signed-in admin
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Instant after which the session counts as expired
    pub deadline: DateTime<Utc>,
}

impl Session {
    /// Create a session starting at `now` with the given idle window
    pub fn new(email: &str, now: DateTime<Utc>, idle: Duration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: now,
            deadline: now + idle,
        }
    }

    /// Check whether the session is expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }

    /// Check whether the session is expired right now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Push the deadline forward from `now`
    pub fn touch(&mut self, now: DateTime<Utc>, idle: Duration) {
        self.deadline = now + idle;
    }
}
