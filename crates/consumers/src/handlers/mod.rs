//! Cross-service handlers, one per induced effect.

mod kitchen_tickets;
mod menu_stock;
mod order_status;
mod reservation_advisory;

pub use kitchen_tickets::{DEFAULT_PREP_TIME, KitchenTicketHandler};
pub use menu_stock::MenuStockHandler;
pub use order_status::OrderStatusHandler;
pub use reservation_advisory::ReservationAdvisoryHandler;
