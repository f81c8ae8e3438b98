//! Order state machine.

use common::wire_enum;

wire_enum! {
    /// The status of an order in its lifecycle.
    ///
    /// State transitions:
    /// ```text
    /// CREATED ──► PAID ──► PREPARING ──► READY ──► COMPLETED
    ///    │          │          │           │
    ///    └──────────┴──────────┴───────────┴──► CANCELLED
    /// ```
    #[derive(Default)]
    pub enum OrderStatus: "order status" {
        /// Order is open; items may be changed.
        #[default]
        Created => "CREATED",
        /// Payment was taken; the kitchen takes over.
        Paid => "PAID",
        Preparing => "PREPARING",
        Ready => "READY",
        /// Handed over (terminal).
        Completed => "COMPLETED",
        /// Terminal sink.
        Cancelled => "CANCELLED",
    }
}

impl OrderStatus {
    /// Returns true if `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Created, Paid)
                | (Paid, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (Created | Paid | Preparing | Ready, Cancelled)
        )
    }

    /// Returns true if items can be modified in this status.
    pub fn can_modify_items(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

wire_enum! {
    /// How the order is served.
    pub enum OrderType: "order type" {
        DineIn => "DINE_IN",
        Takeout => "TAKEOUT",
        Delivery => "DELIVERY",
    }
}
