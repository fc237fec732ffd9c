use serde::{Deserialize, Serialize};

use crate::types::Role;

/// The caller behind one request, resolved by an ingress adapter from its
/// credential. Lives only for the duration of that request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_user_id: Option<String>,
    pub active: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            role,
            slack_user_id: None,
            active: true,
        }
    }

    /// An actor for a Slack user with no provisioned account.
    pub fn slack_guest(slack_user_id: &str) -> Self {
        Self {
            id: format!("slack:{slack_user_id}"),
            email: None,
            name: None,
            role: Role::Member,
            slack_user_id: Some(slack_user_id.to_string()),
            active: true,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.active = false;
        self
    }

    /// Name shown in chat replies: display name, then email, then id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}
