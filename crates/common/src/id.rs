use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Marker for an entity that owns an identifier space.
///
/// Each marker is an uninhabited type, so `Id<T>` carries no extra data
/// beyond its string value.
pub trait IdTag: Send + Sync + 'static {
    /// Textual prefix, e.g. `ord` in `ord_5f0c...`.
    const PREFIX: &'static str;
}

/// Opaque identifier of the form `<prefix>_<opaque>`.
///
/// The tag parameter keeps identifiers of different entities apart at
/// compile time; an `OrderId` cannot be passed where a `MenuItemId` is
/// expected. The textual form is stable and is what gets persisted and
/// published.
pub struct Id<T: IdTag> {
    value: String,
    _tag: PhantomData<fn() -> T>,
}

impl<T: IdTag> Id<T> {
    /// Generates a fresh identifier with the entity's prefix.
    pub fn generate() -> Self {
        Self::from_string(format!("{}_{}", T::PREFIX, Uuid::new_v4().simple()))
    }

    /// Wraps an existing identifier.
    ///
    /// Foreign references are accepted verbatim; the prefix is not
    /// enforced so ids minted by other services still round-trip.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _tag: PhantomData,
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns true if the identifier has no content.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Returns true if the identifier carries this entity's prefix.
    pub fn has_prefix(&self) -> bool {
        self.value
            .strip_prefix(T::PREFIX)
            .is_some_and(|rest| rest.starts_with('_') && rest.len() > 1)
    }

    /// Consumes the identifier, returning the inner string.
    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T: IdTag> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_string(self.value.clone())
    }
}

impl<T: IdTag> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: IdTag> Eq for Id<T> {}

impl<T: IdTag> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdTag> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: IdTag> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdTag> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl<T: IdTag> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T: IdTag> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl<T: IdTag> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

impl<T: IdTag> FromStr for Id<T> {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_string(s))
    }
}

impl<T: IdTag> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T: IdTag> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdTag> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_string)
    }
}

macro_rules! id_tags {
    ($($(#[$doc:meta])* $tag:ident => $alias:ident, $prefix:literal;)*) => {
        $(
            #[doc = concat!("Tag for `", $prefix, "_` identifiers.")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $tag {}

            impl IdTag for $tag {
                const PREFIX: &'static str = $prefix;
            }

            $(#[$doc])*
            pub type $alias = Id<$tag>;
        )*
    };
}

id_tags! {
    /// Identifier of an order.
    OrderTag => OrderId, "ord";
    /// Identifier of a line item inside an order.
    OrderItemTag => OrderItemId, "item";
    /// Identifier of a kitchen ticket.
    KitchenOrderTag => KitchenOrderId, "ko";
    /// Identifier of an item on a kitchen ticket.
    KitchenItemTag => KitchenItemId, "ki";
    /// Identifier of a table reservation.
    ReservationTag => ReservationId, "res";
    /// Identifier of a menu.
    MenuTag => MenuId, "menu";
    /// Identifier of a menu category.
    CategoryTag => CategoryId, "cat";
    /// Identifier of a menu item.
    MenuItemTag => MenuItemId, "item";
    /// Identifier of a stocked inventory item.
    InventoryItemTag => InventoryItemId, "inv";
    /// Identifier of a stock movement.
    MovementTag => MovementId, "mov";
    /// Identifier of a supplier.
    SupplierTag => SupplierId, "sup";
    /// Identifier of a user.
    UserTag => UserId, "user";
    /// Identifier of a role.
    RoleTag => RoleId, "role";
    /// Identifier of a permission.
    PermissionTag => PermissionId, "perm";
    /// Identifier of a login session.
    SessionTag => SessionId, "session";
}
