//! User service events.

use chrono::{DateTime, Utc};
use common::{RoleId, SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UserEvent {
    UserRegistered(UserRegisteredData),

    UserLoggedIn(SessionEventData),

    UserLoggedOut(SessionEventData),

    PasswordChanged(UserChangedData),

    /// The account was disabled and its sessions revoked.
    UserDeactivated(UserChangedData),
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserRegistered(_) => "UserRegistered",
            UserEvent::UserLoggedIn(_) => "UserLoggedIn",
            UserEvent::UserLoggedOut(_) => "UserLoggedOut",
            UserEvent::PasswordChanged(_) => "PasswordChanged",
            UserEvent::UserDeactivated(_) => "UserDeactivated",
        }
    }

    fn aggregate_id(&self) -> String {
        match self {
            UserEvent::UserRegistered(d) => d.user_id.to_string(),
            UserEvent::UserLoggedIn(d) | UserEvent::UserLoggedOut(d) => d.user_id.to_string(),
            UserEvent::PasswordChanged(d) | UserEvent::UserDeactivated(d) => {
                d.user_id.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisteredData {
    pub user_id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEventData {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChangedData {
    pub user_id: UserId,
    pub changed_at: DateTime<Utc>,
}
