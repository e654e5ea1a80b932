//! Session service
//!
//! In-memory session store with an idle timeout. A session stays alive
//! as long as authenticated requests keep arriving; once the gap
//! between two requests exceeds the idle window, the next request
//! observes the expiry exactly once and the session is gone. Manual
//! logout removes the session without ever reporting an expiry.

use crate::models::Session;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Error types for session operations
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The idle window elapsed between two requests
    #[error("Session expired due to inactivity")]
    Expired,

    /// Unknown or already removed session
    #[error("Session not found")]
    NotFound,
}

/// Session store shared across request handlers
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    idle: Duration,
}

impl SessionService {
    /// Create a session store with the given idle window
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle,
        }
    }

    /// The configured idle window
    pub fn idle_window(&self) -> Duration {
        self.idle
    }

    /// Start a session for a signed-in admin
    pub async fn create(&self, email: &str) -> Session {
        self.create_at(email, Utc::now()).await
    }

    async fn create_at(&self, email: &str, now: DateTime<Utc>) -> Session {
        let session = Session::new(email, now, self.idle);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Validate a session and push its deadline forward.
    ///
    /// An expired session is removed while the expiry is reported, so
    /// only one caller ever sees `Expired`; everyone after that gets
    /// `NotFound`.
    pub async fn touch(&self, id: &str) -> Result<Session, SessionError> {
        self.touch_at(id, Utc::now()).await
    }

    async fn touch_at(&self, id: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().await;

        let session = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        if session.is_expired_at(now) {
            sessions.remove(id);
            return Err(SessionError::Expired);
        }

        session.touch(now, self.idle);
        Ok(session.clone())
    }

    /// Remove a session on manual logout.
    ///
    /// Returns whether the session existed. A session past its deadline
    /// is removed the same way; logout never surfaces an expiry.
    pub async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }

    /// Drop every expired session and return how many were removed.
    /// Runs periodically so abandoned sessions do not pile up.
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now()).await
    }

    async fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    /// Number of live sessions in the store
    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
