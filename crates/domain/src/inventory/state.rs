//! Stock levels and movement kinds.

use common::wire_enum;

wire_enum! {
    /// Why the stock of an item changed.
    pub enum MovementType: "movement type" {
        In => "IN",
        Out => "OUT",
        Adjustment => "ADJUSTMENT",
        Reserved => "RESERVED",
        Released => "RELEASED",
        Waste => "WASTE",
    }
}

wire_enum! {
    /// Health of an item's available stock.
    #[derive(Default)]
    pub enum StockLevel: "stock level" {
        #[default]
        Ok => "OK",
        /// At or below the minimum.
        Low => "LOW",
        /// Nothing left to use.
        Out => "OUT",
    }
}

impl StockLevel {
    /// Classifies `available` against `minimum`.
    pub fn of(available: f64, minimum: f64) -> Self {
        if available <= 0.0 {
            StockLevel::Out
        } else if available <= minimum {
            StockLevel::Low
        } else {
            StockLevel::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(StockLevel::of(10.0, 5.0), StockLevel::Ok);
        assert_eq!(StockLevel::of(5.0, 5.0), StockLevel::Low);
        assert_eq!(StockLevel::of(0.0, 5.0), StockLevel::Out);
        assert_eq!(StockLevel::of(-1.0, 0.0), StockLevel::Out);
        assert_eq!(StockLevel::of(0.5, 0.0), StockLevel::Ok);
    }
}
