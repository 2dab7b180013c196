//! Session store.
//!
//! One entry per logged-in user, keyed by an opaque token. Each session
//! owns its role, its own editable copy of the KPI thresholds, and its
//! alert log — threshold edits and alert accumulation never leak across
//! sessions. Sessions live in memory only; a restart logs everyone out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::Role;
use crate::engine::alerts::AlertLog;
use crate::types::{Alert, Thresholds};

/// Per-session mutable state.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub role: Role,
    pub thresholds: Thresholds,
    pub alerts: AlertLog,
    pub opened_at: DateTime<Utc>,
}

/// Token-keyed session map.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
    default_thresholds: Thresholds,
}

impl SessionStore {
    /// `default_thresholds` seed every new session (from `PlantConfig`).
    pub fn new(default_thresholds: Thresholds) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_thresholds,
        }
    }

    /// Open a session for an authenticated role. Returns the opaque token.
    pub async fn open(&self, role: Role) -> String {
        let token = Uuid::new_v4().to_string();
        let state = SessionState {
            role,
            thresholds: self.default_thresholds.clone(),
            alerts: AlertLog::new(),
            opened_at: Utc::now(),
        };
        self.sessions.write().await.insert(token.clone(), state);
        token
    }

    /// Drop a session (logout).
    pub async fn close(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn role_of(&self, token: &str) -> Option<Role> {
        self.sessions.read().await.get(token).map(|s| s.role)
    }

    pub async fn thresholds_of(&self, token: &str) -> Option<Thresholds> {
        self.sessions.read().await.get(token).map(|s| s.thresholds.clone())
    }

    /// Replace the session's threshold set. Caller enforces the role check.
    pub async fn set_thresholds(&self, token: &str, thresholds: Thresholds) -> bool {
        match self.sessions.write().await.get_mut(token) {
            Some(state) => {
                state.thresholds = thresholds;
                true
            }
            None => false,
        }
    }

    /// Merge freshly fired alerts into the session log (message-text dedup).
    /// Returns how many were new, or `None` for an unknown token.
    pub async fn absorb_alerts(&self, token: &str, alerts: Vec<Alert>) -> Option<usize> {
        self.sessions
            .write()
            .await
            .get_mut(token)
            .map(|state| state.alerts.absorb(alerts))
    }

    pub async fn alerts_of(&self, token: &str) -> Option<Vec<Alert>> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|s| s.alerts.entries().to_vec())
    }

    /// Explicit user action: empty the session's alert log.
    pub async fn clear_alerts(&self, token: &str) -> bool {
        match self.sessions.write().await.get_mut(token) {
            Some(state) => {
                state.alerts.clear();
                true
            }
            None => false,
        }
    }
}
