//! Roles, permissions and the default role catalogue.

use chrono::{DateTime, Utc};
use common::{PermissionId, RoleId, Version, wire_enum};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{UserError, UserEvent};

wire_enum! {
    /// What a permission protects.
    pub enum Resource: "resource" {
        Menu => "menu",
        Order => "order",
        Kitchen => "kitchen",
        Reservation => "reservation",
        Inventory => "inventory",
        User => "user",
        Report => "report",
    }
}

wire_enum! {
    /// What a permission allows on its resource.
    pub enum Action: "action" {
        Create => "create",
        Read => "read",
        Update => "update",
        Delete => "delete",
        /// Every action on the resource.
        Manage => "manage",
        View => "view",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub resource: Resource,
    pub action: Action,
    #[serde(default)]
    pub description: String,
}

impl Permission {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self {
            id: PermissionId::generate(),
            name: format!("{resource}:{action}"),
            resource,
            action,
            description: String::new(),
        }
    }

    /// True if this permission grants `action` on `resource`.
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.resource == resource && (self.action == action || self.action == Action::Manage)
    }
}

/// A named set of permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    id: RoleId,

    #[serde(default)]
    version: Version,

    name: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    permissions: Vec<Permission>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for Role {
    type Id = RoleId;
    type Event = UserEvent;
    type Error = UserError;

    fn aggregate_type() -> &'static str {
        "Role"
    }

    fn id(&self) -> &RoleId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: Vec<Permission>,
        now: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(UserError::MissingRoleName);
        }
        Ok(Self {
            id: RoleId::generate(),
            version: Version::initial(),
            name,
            description: description.into(),
            permissions,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Exact match on `(resource, action)`, or `(resource, manage)`.
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.permissions.iter().any(|p| p.grants(resource, action))
    }

    /// Adds a permission unless an equal grant is already present.
    pub fn grant(&mut self, resource: Resource, action: Action, now: DateTime<Utc>) {
        let present = self
            .permissions
            .iter()
            .any(|p| p.resource == resource && p.action == action);
        if !present {
            self.permissions.push(Permission::new(resource, action));
            self.updated_at = now;
        }
    }
}

pub const ADMIN: &str = "admin";
pub const MANAGER: &str = "manager";
pub const KITCHEN_STAFF: &str = "kitchen_staff";
pub const WAITSTAFF: &str = "waitstaff";
pub const HOST: &str = "host";
pub const CASHIER: &str = "cashier";

fn grants(pairs: &[(Resource, Action)]) -> Vec<Permission> {
    pairs.iter().map(|&(r, a)| Permission::new(r, a)).collect()
}

/// The roles every installation starts with.
pub fn default_roles(now: DateTime<Utc>) -> Vec<Role> {
    use Action::*;
    use Resource::*;

    let catalogue: [(&str, &str, Vec<Permission>); 6] = [
        (
            ADMIN,
            "Full access",
            Resource::ALL.iter().map(|&r| Permission::new(r, Manage)).collect(),
        ),
        (
            MANAGER,
            "Runs the floor and the back office",
            grants(&[
                (Menu, Manage),
                (Order, Manage),
                (Kitchen, Manage),
                (Reservation, Manage),
                (Inventory, Manage),
                (User, Read),
                (Report, View),
            ]),
        ),
        (
            KITCHEN_STAFF,
            "Prepares tickets",
            grants(&[
                (Order, Read),
                (Order, Update),
                (Kitchen, Manage),
                (Inventory, Read),
            ]),
        ),
        (
            WAITSTAFF,
            "Takes and serves orders",
            grants(&[
                (Menu, Read),
                (Order, Create),
                (Order, Read),
                (Order, Update),
                (Kitchen, Read),
                (Reservation, Read),
            ]),
        ),
        (
            HOST,
            "Seats guests and books tables",
            grants(&[(Reservation, Manage), (Menu, Read), (Order, Read)]),
        ),
        (
            CASHIER,
            "Settles bills",
            grants(&[(Order, Read), (Order, Update), (Menu, Read), (Report, View)]),
        ),
    ];

    catalogue
        .into_iter()
        .map(|(name, description, permissions)| Role {
            id: RoleId::generate(),
            version: Version::initial(),
            name: name.to_string(),
            description: description.to_string(),
            permissions,
            created_at: now,
            updated_at: now,
        })
        .collect()
}
