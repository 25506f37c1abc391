pub mod costing;
pub mod stock;

use rust_decimal::Decimal;
use serde::Serialize;

pub use costing::{
    compute_issue_costs, cost_items, ClosingStock, CostingMethod, CostingReport, IssueCost,
};
pub use stock::{stock_summary, StockLine};

/// Quantity and value of stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub quantity: Decimal,
    pub value: Decimal,
}

impl Holding {
    pub fn new(quantity: Decimal, value: Decimal) -> Self {
        Holding { quantity, value }
    }

    pub fn add(&mut self, quantity: Decimal, value: Decimal) {
        self.quantity += quantity;
        self.value += value;
    }

    /// Average cost, zero when nothing is on hand.
    pub fn unit_cost(&self) -> Decimal {
        if self.quantity > Decimal::ZERO {
            self.value / self.quantity
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero() && self.value.is_zero()
    }
}
