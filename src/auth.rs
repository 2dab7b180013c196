//! Credential lookup capability.
//!
//! Access control is injected, not hardcoded: handlers receive a
//! [`CredentialStore`] and never see the credential table directly. The
//! shipped implementation is a static table fed from `plant_config.toml`;
//! a deployment can swap in a directory-backed store without touching the
//! rest of the service.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::config::CredentialEntry;

// ============================================================================
// Roles
// ============================================================================

/// Who is logged in, and what they may touch.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Records weigh-ins and incidents, reads dashboards
    Operator,
    /// Additionally edits session thresholds
    Supervisor,
    /// Full access
    Admin,
}

impl Role {
    /// Threshold edits are restricted to privileged roles.
    pub fn can_edit_thresholds(self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin)
    }

    /// Parse the config's role column. Unknown strings get no role at all —
    /// a typo must not silently grant operator access.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "operator" | "operatrice" | "opératrice" => Some(Role::Operator),
            "supervisor" | "chef" | "chef_equipe" => Some(Role::Supervisor),
            "admin" | "administrateur" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

// ============================================================================
// Credential Store
// ============================================================================

/// Injected credential lookup: `Some(role)` on a match, `None` otherwise.
pub trait CredentialStore: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Option<Role>;
}

/// Static username → (password, role) table from the plant config.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    entries: HashMap<String, (String, Role)>,
}

impl StaticCredentials {
    /// Build from config rows, skipping entries whose role fails to parse.
    pub fn from_config(entries: &[CredentialEntry]) -> Self {
        let mut table = HashMap::new();
        for entry in entries {
            match Role::parse(&entry.role) {
                Some(role) => {
                    table.insert(entry.username.clone(), (entry.password.clone(), role));
                }
                None => {
                    warn!(
                        username = %entry.username,
                        role = %entry.role,
                        "credential entry with unknown role skipped"
                    );
                }
            }
        }
        Self { entries: table }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        let (stored_password, role) = self.entries.get(username)?;
        if stored_password == password {
            Some(*role)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticCredentials {
        StaticCredentials::from_config(&[
            CredentialEntry {
                username: "op1".to_string(),
                password: "secret".to_string(),
                role: "operator".to_string(),
            },
            CredentialEntry {
                username: "chef".to_string(),
                password: "autre".to_string(),
                role: "supervisor".to_string(),
            },
        ])
    }

    #[test]
    fn test_valid_credentials_return_role() {
        assert_eq!(store().authenticate("op1", "secret"), Some(Role::Operator));
        assert_eq!(store().authenticate("chef", "autre"), Some(Role::Supervisor));
    }

    #[test]
    fn test_wrong_password_returns_none() {
        assert_eq!(store().authenticate("op1", "wrong"), None);
    }

    #[test]
    fn test_unknown_user_returns_none() {
        assert_eq!(store().authenticate("ghost", "secret"), None);
    }

    #[test]
    fn test_unknown_role_entry_is_skipped() {
        let store = StaticCredentials::from_config(&[CredentialEntry {
            username: "typo".to_string(),
            password: "x".to_string(),
            role: "operatorr".to_string(),
        }]);
        assert!(store.is_empty());
        assert_eq!(store.authenticate("typo", "x"), None);
    }

    #[test]
    fn test_role_permissions() {
        assert!(!Role::Operator.can_edit_thresholds());
        assert!(Role::Supervisor.can_edit_thresholds());
        assert!(Role::Admin.can_edit_thresholds());
    }

    #[test]
    fn test_role_parse_french_spellings() {
        assert_eq!(Role::parse("Chef"), Some(Role::Supervisor));
        assert_eq!(Role::parse("administrateur"), Some(Role::Admin));
        assert_eq!(Role::parse("visiteur"), None);
    }
}
