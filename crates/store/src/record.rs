use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FoodId, OrderId, OwnerId, Result, StoreError};

/// Revision of the inventory.
///
/// A freshly created inventory is at version 0. Every stock-changing write
/// increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a freshly created inventory.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Canonical catalog entry for a food item.
///
/// Holds no quantity: stock lives only in [`InventoryRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: FoodId,
    /// Normalized (uppercase) name, unique across the catalog.
    pub name: String,
    pub price: u32,
    /// Sorted, deduplicated uppercase allergen tags.
    pub allergens: Vec<String>,
}

/// The inventory singleton: an index of food ids to quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub version: Version,
    pub stock: BTreeMap<FoodId, u32>,
}

impl InventoryRecord {
    /// Creates an empty inventory at the initial version.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the quantity on hand for a food, 0 if it is not stocked.
    pub fn quantity(&self, food_id: FoodId) -> u32 {
        self.stock.get(&food_id).copied().unwrap_or(0)
    }

    /// Returns true if the food has an entry in the stock index.
    pub fn contains(&self, food_id: FoodId) -> bool {
        self.stock.contains_key(&food_id)
    }

    /// Computes the quantities left after taking every demanded unit.
    ///
    /// Demands are checked in the order given and the first one that cannot
    /// be covered fails with `InsufficientStock`. A food missing from the
    /// stock index counts as having nothing on hand.
    pub fn reserve(&self, demand: &[StockDemand]) -> Result<StockChange> {
        let mut change = StockChange::new();
        for item in demand {
            let available = self.quantity(item.food_id);
            if available < item.required {
                return Err(StoreError::InsufficientStock {
                    item: item.name.clone(),
                    required: item.required,
                    available,
                });
            }
            change = change.set_quantity(item.food_id, available - item.required);
        }
        Ok(change)
    }
}

/// Units of one food an order needs taken from stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDemand {
    pub food_id: FoodId,
    pub name: String,
    pub required: u32,
}

/// One unit of a food within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub food_id: FoodId,
    /// Food name captured when the order was placed.
    pub food_name: String,
}

impl OrderLine {
    pub fn new(food_id: FoodId, food_name: impl Into<String>) -> Self {
        Self {
            food_id,
            food_name: food_name.into(),
        }
    }
}

/// Persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub name: String,
    pub owner: OwnerId,
    pub lines: Vec<OrderLine>,
    pub fulfilled: bool,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Returns true if any line references the given food.
    pub fn references(&self, food_id: FoodId) -> bool {
        self.lines.iter().any(|line| line.food_id == food_id)
    }
}

/// A set of changes applied atomically against the inventory.
///
/// Catalog field updates and new absolute quantities are committed together
/// or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockChange {
    /// Catalog records to overwrite. Each must already exist.
    pub foods: Vec<FoodRecord>,

    /// New absolute quantities. Each food must already be in the stock index.
    pub quantities: BTreeMap<FoodId, u32>,
}

impl StockChange {
    /// Creates an empty change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a catalog record.
    pub fn update_food(mut self, food: FoodRecord) -> Self {
        self.foods.push(food);
        self
    }

    /// Sets the quantity on hand for a food.
    pub fn set_quantity(mut self, food_id: FoodId, quantity: u32) -> Self {
        self.quantities.insert(food_id, quantity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(Version::initial() < Version::initial().next());
        assert_eq!(Version::new(4).next(), Version::new(5));
        assert_eq!(Version::new(7).to_string(), "7");
    }

    #[test]
    fn inventory_quantity_defaults_to_zero() {
        let food = FoodId::new();
        let mut inventory = InventoryRecord::empty();
        assert_eq!(inventory.quantity(food), 0);
        assert!(!inventory.contains(food));

        inventory.stock.insert(food, 3);
        assert_eq!(inventory.quantity(food), 3);
        assert!(inventory.contains(food));
    }

    #[test]
    fn order_references_food() {
        let bread = FoodId::new();
        let order = OrderRecord {
            id: OrderId::new(),
            name: "lunch".to_string(),
            owner: OwnerId::new("alice"),
            lines: vec![OrderLine::new(bread, "BREAD")],
            fulfilled: false,
            created_at: Utc::now(),
        };
        assert!(order.references(bread));
        assert!(!order.references(FoodId::new()));
    }

    #[test]
    fn stock_change_builder() {
        let food = FoodId::new();
        let change = StockChange::new().set_quantity(food, 4);
        assert_eq!(change.quantities.get(&food), Some(&4));
        assert!(change.foods.is_empty());
    }

    fn demand(food_id: FoodId, name: &str, required: u32) -> StockDemand {
        StockDemand {
            food_id,
            name: name.to_string(),
            required,
        }
    }

    #[test]
    fn reserve_computes_remaining_quantities() {
        let bread = FoodId::new();
        let milk = FoodId::new();
        let mut inventory = InventoryRecord::empty();
        inventory.stock.insert(bread, 5);
        inventory.stock.insert(milk, 2);

        let change = inventory
            .reserve(&[demand(bread, "BREAD", 2), demand(milk, "MILK", 2)])
            .unwrap();
        assert_eq!(change.quantities.get(&bread), Some(&3));
        assert_eq!(change.quantities.get(&milk), Some(&0));
    }

    #[test]
    fn reserve_reports_first_short_item() {
        let bread = FoodId::new();
        let milk = FoodId::new();
        let mut inventory = InventoryRecord::empty();
        inventory.stock.insert(bread, 1);

        let err = inventory
            .reserve(&[demand(bread, "BREAD", 2), demand(milk, "MILK", 1)])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock { ref item, required: 2, available: 1 } if item == "BREAD"
        ));

        let err = inventory.reserve(&[demand(milk, "MILK", 1)]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock { available: 0, .. }
        ));
    }
}
