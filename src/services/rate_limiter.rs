//! Rate limiter for login attempts
//!
//! Slows brute force attacks against the admin login by limiting
//! failed attempts per email address and overall requests per IP.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;
use tokio::sync::RwLock;

/// Failed attempts allowed per email within [`EMAIL_WINDOW_MINUTES`]
const EMAIL_MAX_ATTEMPTS: usize = 5;
const EMAIL_WINDOW_MINUTES: i64 = 15;

/// Login requests allowed per IP within [`IP_WINDOW_MINUTES`]
const IP_MAX_ATTEMPTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

/// Login rate limiter
pub struct LoginRateLimiter {
    /// Failed login attempts keyed by lowercased email
    email_attempts: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    /// Login requests keyed by client IP
    ip_attempts: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            email_attempts: RwLock::new(HashMap::new()),
            ip_attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Check if an email is currently locked out
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let window = Duration::minutes(EMAIL_WINDOW_MINUTES);
        prune_and_count(&self.email_attempts, email.to_lowercase(), window).await
            >= EMAIL_MAX_ATTEMPTS
    }

    /// Record a failed login attempt for an email
    pub async fn record_failed_attempt(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts
            .entry(email.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget an email's failures after a successful login
    pub async fn clear_email_attempts(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts.remove(&email.to_lowercase());
    }

    /// Check if an IP is currently limited
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let window = Duration::minutes(IP_WINDOW_MINUTES);
        prune_and_count(&self.ip_attempts, ip, window).await >= IP_MAX_ATTEMPTS
    }

    /// Record a login request from an IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_default().push(Utc::now());
    }

    /// Drop entries whose windows have fully elapsed; called periodically
    pub async fn cleanup(&self) {
        let now = Utc::now();
        prune_map(
            &self.email_attempts,
            now - Duration::minutes(EMAIL_WINDOW_MINUTES),
        )
        .await;
        prune_map(&self.ip_attempts, now - Duration::minutes(IP_WINDOW_MINUTES)).await;
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop timestamps outside the window for one key and count the rest
async fn prune_and_count<K: Hash + Eq>(
    map: &RwLock<HashMap<K, Vec<DateTime<Utc>>>>,
    key: K,
    window: Duration,
) -> usize {
    let cutoff = Utc::now() - window;
    let mut attempts = map.write().await;
    let entry = attempts.entry(key).or_default();
    entry.retain(|time| *time > cutoff);
    entry.len()
}

async fn prune_map<K: Hash + Eq>(
    map: &RwLock<HashMap<K, Vec<DateTime<Utc>>>>,
    cutoff: DateTime<Utc>,
) {
    let mut attempts = map.write().await;
    attempts.retain(|_, times| {
        times.retain(|time| *time > cutoff);
        !times.is_empty()
    });
}
