//! Groups an order's line items into the stock it needs.

use std::collections::HashMap;

use common::FoodId;
use domain::Order;
use store::StockDemand;

/// Line items of an order grouped by food, in name order.
///
/// The store checks demands in the order given, so a shortage is always
/// reported for the first short food by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentPlan {
    items: Vec<StockDemand>,
}

impl FulfillmentPlan {
    /// Groups the order's line items by food and counts occurrences.
    pub fn for_order(order: &Order) -> Self {
        let mut groups: HashMap<FoodId, StockDemand> = HashMap::new();
        for line in &order.items {
            groups
                .entry(line.food_id)
                .or_insert_with(|| StockDemand {
                    food_id: line.food_id,
                    name: line.food_name.clone(),
                    required: 0,
                })
                .required += 1;
        }

        let mut items: Vec<_> = groups.into_values().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.food_id.cmp(&b.food_id)));
        Self { items }
    }

    /// Returns the grouped items.
    pub fn items(&self) -> &[StockDemand] {
        &self.items
    }
}
