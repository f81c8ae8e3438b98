//! Domain event plumbing shared by all services.
//!
//! Services publish [`EventEnvelope`]s through an [`EventPublisher`]; peers
//! receive them through a [`Subscription`] on the bus.

pub mod envelope;
pub mod error;
pub mod memory;
pub mod publisher;

pub use envelope::{EventEnvelope, EventEnvelopeBuilder, metadata};
pub use error::{BusError, Result};
pub use memory::InMemoryEventBus;
pub use publisher::{EventPublisher, Subscription};
