//! Cross-service event consumers.
//!
//! Each [`EventHandler`] reacts to a few event types by driving its own
//! service's aggregate towards a target state, so applying an event twice
//! has the same effect as applying it once. The [`EventProcessor`] feeds
//! handlers from a bus subscription; handler failures are logged and the
//! event is dropped.

pub mod error;
pub mod handler;
pub mod handlers;
pub mod processor;

pub use error::{ConsumerError, Result};
pub use handler::{EventHandler, Outcome};
pub use handlers::{
    KitchenTicketHandler, MenuStockHandler, OrderStatusHandler, ReservationAdvisoryHandler,
};
pub use processor::EventProcessor;
