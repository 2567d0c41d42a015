use crate::{FoodId, OrderRecord, OwnerId};

/// Builder for filtering persisted orders.
///
/// Every filter is optional; an empty query matches all orders. Results are
/// returned in creation order.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter by owning user.
    pub owner: Option<OwnerId>,

    /// Filter by fulfillment flag.
    pub fulfilled: Option<bool>,

    /// Only orders with at least one line referencing this food.
    pub references_food: Option<FoodId>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for orders owned by one user.
    pub fn for_owner(owner: OwnerId) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    /// Filters by owner.
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Filters by fulfillment flag.
    pub fn fulfilled(mut self, fulfilled: bool) -> Self {
        self.fulfilled = Some(fulfilled);
        self
    }

    /// Keeps only orders referencing the given food.
    pub fn references_food(mut self, food_id: FoodId) -> Self {
        self.references_food = Some(food_id);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the order satisfies every filter except paging.
    pub fn matches(&self, order: &OrderRecord) -> bool {
        if let Some(ref owner) = self.owner
            && &order.owner != owner
        {
            return false;
        }
        if let Some(fulfilled) = self.fulfilled
            && order.fulfilled != fulfilled
        {
            return false;
        }
        if let Some(food_id) = self.references_food
            && !order.references(food_id)
        {
            return false;
        }
        true
    }
}
