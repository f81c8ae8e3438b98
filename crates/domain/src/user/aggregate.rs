//! User aggregate.

use chrono::{DateTime, Utc};
use common::{RoleId, SessionId, UserId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::events::{SessionEventData, UserChangedData, UserRegisteredData};
use super::{Action, Resource, Role, UserError, UserEvent};

/// A staff account.
///
/// `role` is resolved from `role_id` when the user is loaded through the
/// service; effective permissions are exactly the role's permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,

    #[serde(default)]
    version: Version,

    email: String,

    password_hash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    role_id: Option<RoleId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Role>,

    is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_login_at: Option<DateTime<Utc>>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for User {
    type Id = UserId;
    type Event = UserEvent;
    type Error = UserError;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn id(&self) -> &UserId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

/// Lowercased, trimmed address if it looks like `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String, UserError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(UserError::InvalidEmail { email });
    }
    Ok(email)
}

// Queries
impl User {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role_id(&self) -> Option<&RoleId> {
        self.role_id.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// False when the user has no role.
    pub fn can_access(&self, resource: Resource, action: Action) -> bool {
        self.role
            .as_ref()
            .is_some_and(|role| role.allows(resource, action))
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.role.as_ref().is_some_and(|role| role.name() == name)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(super::ADMIN)
    }
}

// Command methods
impl User {
    pub fn create(
        email: &str,
        password_hash: String,
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<UserEvent>), UserError> {
        let email = normalize_email(email)?;

        let user = Self {
            id: UserId::generate(),
            version: Version::initial(),
            email,
            password_hash,
            role_id: role.as_ref().map(|r| r.id().clone()),
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let event = UserEvent::UserRegistered(UserRegisteredData {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role_id: user.role_id.clone(),
            registered_at: now,
        });
        Ok((user, vec![event]))
    }

    /// Attaches the resolved role. Does not change the stored role id.
    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub fn assign_role(&mut self, role: Role, now: DateTime<Utc>) {
        self.role_id = Some(role.id().clone());
        self.role = Some(role);
        self.updated_at = now;
    }

    pub fn record_login(
        &mut self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, UserError> {
        if !self.is_active {
            return Err(UserError::Inactive);
        }
        self.last_login_at = Some(now);
        self.updated_at = now;
        Ok(vec![UserEvent::UserLoggedIn(SessionEventData {
            user_id: self.id.clone(),
            session_id: session_id.clone(),
            at: now,
        })])
    }

    pub fn set_password_hash(
        &mut self,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, UserError> {
        if !self.is_active {
            return Err(UserError::Inactive);
        }
        self.password_hash = password_hash;
        self.updated_at = now;
        Ok(vec![UserEvent::PasswordChanged(UserChangedData {
            user_id: self.id.clone(),
            changed_at: now,
        })])
    }

    /// No-op when already inactive.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Vec<UserEvent> {
        if !self.is_active {
            return Vec::new();
        }
        self.is_active = false;
        self.updated_at = now;
        vec![UserEvent::UserDeactivated(UserChangedData {
            user_id: self.id.clone(),
            changed_at: now,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{KITCHEN_STAFF, default_roles};

    fn role(name: &str) -> Role {
        default_roles(Utc::now())
            .into_iter()
            .find(|r| r.name() == name)
            .unwrap()
    }

    #[test]
    fn access_follows_role() {
        let (user, events) =
            User::create("Cook@Example.com", "hash".into(), Some(role(KITCHEN_STAFF)), Utc::now())
                .unwrap();
        assert_eq!(user.email(), "cook@example.com");
        assert_eq!(events.len(), 1);

        assert!(user.has_role("kitchen_staff"));
        assert!(!user.has_role("Kitchen_Staff"));
        assert!(!user.is_admin());
        assert!(user.can_access(Resource::Kitchen, Action::Delete));
        assert!(!user.can_access(Resource::User, Action::Read));
    }

    #[test]
    fn no_role_means_no_access() {
        let (user, _) = User::create("a@b.co", "hash".into(), None, Utc::now()).unwrap();
        assert!(!user.can_access(Resource::Menu, Action::Read));
        assert!(!user.is_admin());
    }

    #[test]
    fn email_format() {
        for bad in ["", "plain", "@x.com", "a@b", "a@.com", "a@b.", "a b@c.com", "a@b@c.com"] {
            assert!(normalize_email(bad).is_err(), "{bad}");
        }
        assert_eq!(normalize_email(" A@B.io ").unwrap(), "a@b.io");
    }

    #[test]
    fn inactive_user_cannot_log_in() {
        let (mut user, _) = User::create("a@b.co", "hash".into(), None, Utc::now()).unwrap();
        assert_eq!(user.deactivate(Utc::now()).len(), 1);
        assert!(user.deactivate(Utc::now()).is_empty());
        assert!(matches!(
            user.record_login(&SessionId::generate(), Utc::now()),
            Err(UserError::Inactive)
        ));
    }
}
