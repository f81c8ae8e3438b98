//! Suppliers of inventory items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{SupplierId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::memory::MemoryStore;
use crate::repository::{Repository, RepositoryResult};

use super::events::SupplierData;
use super::{InventoryError, InventoryEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    id: SupplierId,

    #[serde(default)]
    version: Version,

    name: String,

    #[serde(default)]
    contact_name: String,

    #[serde(default)]
    email: String,

    #[serde(default)]
    phone: String,

    is_active: bool,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for Supplier {
    type Id = SupplierId;
    type Event = InventoryEvent;
    type Error = InventoryError;

    fn aggregate_type() -> &'static str {
        "Supplier"
    }

    fn id(&self) -> &SupplierId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl NewSupplier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Supplier {
    pub fn create(
        input: NewSupplier,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<InventoryEvent>), InventoryError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::MissingSupplierName);
        }

        let supplier = Self {
            id: SupplierId::generate(),
            version: Version::initial(),
            name,
            contact_name: input.contact_name,
            email: input.email,
            phone: input.phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let event = InventoryEvent::SupplierCreated(supplier.data(now));
        Ok((supplier, vec![event]))
    }

    fn data(&self, now: DateTime<Utc>) -> SupplierData {
        SupplierData {
            supplier_id: self.id.clone(),
            name: self.name.clone(),
            changed_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact_name(&self) -> &str {
        &self.contact_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stops the supplier from being linked to items. No-op when already
    /// inactive.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Vec<InventoryEvent> {
        if !self.is_active {
            return Vec::new();
        }
        self.is_active = false;
        self.updated_at = now;
        vec![InventoryEvent::SupplierDeactivated(self.data(now))]
    }
}

#[async_trait]
pub trait SupplierRepository: Repository<Supplier> {
    /// Every supplier, by name.
    async fn list(&self) -> RepositoryResult<Vec<Supplier>>;

    async fn list_active(&self) -> RepositoryResult<Vec<Supplier>>;
}

pub type InMemorySupplierRepository = MemoryStore<Supplier>;

#[async_trait]
impl SupplierRepository for MemoryStore<Supplier> {
    async fn list(&self) -> RepositoryResult<Vec<Supplier>> {
        let mut suppliers = self.filter(|_| true).await;
        suppliers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(suppliers)
    }

    async fn list_active(&self) -> RepositoryResult<Vec<Supplier>> {
        let mut suppliers = self.filter(|s| s.is_active()).await;
        suppliers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(suppliers)
    }
}
