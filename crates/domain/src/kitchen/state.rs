//! Kitchen ticket and item state machines.

use common::wire_enum;

wire_enum! {
    /// The status of a kitchen ticket.
    ///
    /// ```text
    /// NEW ──► PREPARING ──► READY ──► COMPLETED
    ///  │          │           │
    ///  └──────────┴───────────┴──► CANCELLED
    /// ```
    ///
    /// Apart from COMPLETED, the status is normally driven by the items
    /// (see `KitchenOrder::update_item_status`).
    #[derive(Default)]
    pub enum KitchenOrderStatus: "kitchen order status" {
        #[default]
        New => "NEW",
        Preparing => "PREPARING",
        Ready => "READY",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl KitchenOrderStatus {
    pub fn can_transition_to(&self, next: KitchenOrderStatus) -> bool {
        use KitchenOrderStatus::*;
        matches!(
            (self, next),
            (New, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (New | Preparing | Ready, Cancelled)
        )
    }

    /// Items can be added or removed only before the ticket is ready.
    pub fn can_modify_items(&self) -> bool {
        matches!(self, KitchenOrderStatus::New | KitchenOrderStatus::Preparing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            KitchenOrderStatus::Completed | KitchenOrderStatus::Cancelled
        )
    }

    /// Returns true once the ticket no longer needs cooking time.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            KitchenOrderStatus::Ready
                | KitchenOrderStatus::Completed
                | KitchenOrderStatus::Cancelled
        )
    }
}

wire_enum! {
    /// The status of one line on a kitchen ticket.
    #[derive(Default)]
    pub enum KitchenItemStatus: "kitchen item status" {
        #[default]
        New => "NEW",
        Preparing => "PREPARING",
        Ready => "READY",
        Cancelled => "CANCELLED",
    }
}

impl KitchenItemStatus {
    pub fn can_transition_to(&self, next: KitchenItemStatus) -> bool {
        use KitchenItemStatus::*;
        matches!(
            (self, next),
            (New, Preparing) | (Preparing, Ready) | (New | Preparing, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, KitchenItemStatus::Ready | KitchenItemStatus::Cancelled)
    }
}

wire_enum! {
    #[derive(Default, PartialOrd, Ord)]
    pub enum Priority: "priority" {
        Low => "LOW",
        #[default]
        Normal => "NORMAL",
        High => "HIGH",
        Urgent => "URGENT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_transitions() {
        use KitchenOrderStatus::*;
        assert!(New.can_transition_to(Preparing));
        assert!(Ready.can_transition_to(Completed));
        assert!(Ready.can_transition_to(Cancelled));
        assert!(!New.can_transition_to(Ready));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(New));
    }

    #[test]
    fn item_transitions() {
        use KitchenItemStatus::*;
        assert!(New.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Cancelled));
        assert!(!New.can_transition_to(Ready));
        assert!(Ready.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn priorities_order_by_urgency() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::default(), Priority::Normal);
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
    }
}
