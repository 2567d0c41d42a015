//! Order read model.

use chrono::{DateTime, Utc};
use common::{FoodId, OrderId, OwnerId};
use serde::Serialize;
use store::{OrderLine, OrderRecord};

use super::OrderState;

/// An order as seen by callers of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub owner: OwnerId,
    /// One entry per unit ordered; a food may appear several times.
    pub items: Vec<OrderLine>,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns true once the order consumed its stock.
    pub fn is_fulfilled(&self) -> bool {
        self.state == OrderState::Fulfilled
    }

    /// Returns the number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns how many units of a food the order requests.
    pub fn quantity_of(&self, food_id: FoodId) -> u32 {
        self.items.iter().filter(|l| l.food_id == food_id).count() as u32
    }
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            owner: record.owner,
            items: record.lines,
            state: OrderState::from_fulfilled(record.fulfilled),
            created_at: record.created_at,
        }
    }
}
