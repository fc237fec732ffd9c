//! Provisioned team members.
//!
//! Stored as `users.yaml` in the data directory. Ingress adapters resolve an
//! [`Actor`] from this directory on every request, so role changes and
//! disables take effect without reissuing credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::{ReiError, Result};
use crate::paths;
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_user_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl UserRecord {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            email: None,
            name: name.into(),
            role,
            slack_user_id: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn to_actor(&self) -> Actor {
        Actor {
            id: self.id.clone(),
            email: self.email.clone(),
            name: Some(self.name.clone()),
            role: self.role,
            slack_user_id: self.slack_user_id.clone(),
            active: self.active,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDirectory {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl UserDirectory {
    /// Load `users.yaml`; a missing file is an empty directory.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::users_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let dir: UserDirectory = serde_yaml::from_str(&data)?;
        Ok(dir)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::users_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Add a user. Ids, emails (case-insensitive) and Slack ids must be unique.
    pub fn add(&mut self, user: UserRecord) -> Result<()> {
        if self.get(&user.id).is_some() {
            return Err(ReiError::UserExists(user.id));
        }
        if let Some(ref email) = user.email {
            if self.find_by_email(email).is_some() {
                return Err(ReiError::UserExists(email.clone()));
            }
        }
        if let Some(ref slack) = user.slack_user_id {
            if self.find_by_slack(slack).is_some() {
                return Err(ReiError::UserExists(slack.clone()));
            }
        }
        self.users.push(user);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| {
            u.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        })
    }

    pub fn find_by_slack(&self, slack_user_id: &str) -> Option<&UserRecord> {
        self.users
            .iter()
            .find(|u| u.slack_user_id.as_deref() == Some(slack_user_id))
    }

    /// Find by id, then by email.
    pub fn lookup(&self, key: &str) -> Option<&UserRecord> {
        self.get(key).or_else(|| self.find_by_email(key))
    }

    fn lookup_mut(&mut self, key: &str) -> Result<&mut UserRecord> {
        let idx = self
            .users
            .iter()
            .position(|u| {
                u.id == key
                    || u.email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| ReiError::UserNotFound(key.to_string()))?;
        Ok(&mut self.users[idx])
    }

    pub fn set_active(&mut self, key: &str, active: bool) -> Result<()> {
        self.lookup_mut(key)?.active = active;
        Ok(())
    }

    pub fn set_role(&mut self, key: &str, role: Role) -> Result<()> {
        self.lookup_mut(key)?.role = role;
        Ok(())
    }

    pub fn link_slack(&mut self, key: &str, slack_user_id: &str) -> Result<()> {
        if let Some(other) = self.find_by_slack(slack_user_id) {
            if other.id != key && other.email.as_deref() != Some(key) {
                return Err(ReiError::UserExists(slack_user_id.to_string()));
            }
        }
        self.lookup_mut(key)?.slack_user_id = Some(slack_user_id.to_string());
        Ok(())
    }

    /// Resolve the actor behind a Slack user id. Unprovisioned Slack users
    /// act as active members.
    pub fn resolve_slack(&self, slack_user_id: &str) -> Actor {
        self.find_by_slack(slack_user_id)
            .map(UserRecord::to_actor)
            .unwrap_or_else(|| Actor::slack_guest(slack_user_id))
    }
}
