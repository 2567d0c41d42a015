//! The singleton stock ledger.

mod service;

pub use service::Inventory;

use serde::Serialize;
use store::Version;

use crate::catalog::FoodItem;

/// Point-in-time view of the inventory joined with catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySnapshot {
    pub version: Version,
    /// Stocked foods ordered by name.
    pub items: Vec<FoodItem>,
}

impl InventorySnapshot {
    /// Looks up the quantity of a food by its normalized name.
    pub fn quantity_of(&self, name: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.amount)
    }
}
