use async_trait::async_trait;

use crate::{
    FoodId, FoodRecord, InventoryRecord, OrderId, OrderQuery, OrderRecord, OwnerId, Result,
    StockChange, StockDemand, Version,
};

/// Repository for catalog records, the inventory singleton and orders.
///
/// The inventory's stock index is the only place quantities are kept. Every
/// write that changes stock increments the inventory version. Writes that
/// check state before changing it hold the inventory lock for the whole
/// check, so concurrent callers are serialized rather than rejected. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a new catalog record and adds it to the stock index.
    ///
    /// Creates the inventory if it does not exist. Fails with
    /// `DuplicateName` if a food with the same name is already present.
    ///
    /// Returns the new inventory version.
    async fn insert_food(&self, food: FoodRecord, quantity: u32) -> Result<Version>;

    /// Retrieves a catalog record by id.
    async fn get_food(&self, id: FoodId) -> Result<Option<FoodRecord>>;

    /// Retrieves a catalog record by its normalized name.
    async fn get_food_by_name(&self, name: &str) -> Result<Option<FoodRecord>>;

    /// Lists all catalog records ordered by name.
    async fn list_foods(&self) -> Result<Vec<FoodRecord>>;

    /// Removes a catalog record together with its stock entry.
    ///
    /// Fails with `FoodInUse` while any unfulfilled order references the
    /// food. The check and the removal happen under one lock, so no order
    /// for the food can be placed in between.
    ///
    /// Returns the new inventory version.
    async fn delete_food(&self, id: FoodId) -> Result<Version>;

    /// Returns the inventory, or None if it has not been created.
    async fn get_inventory(&self) -> Result<Option<InventoryRecord>>;

    /// Creates the inventory singleton if missing and returns it.
    ///
    /// Calling this on an existing inventory returns it unchanged.
    async fn create_inventory(&self) -> Result<InventoryRecord>;

    /// Applies a stock change atomically.
    ///
    /// Every referenced food is checked before anything is written: either
    /// the whole change lands or none of it does.
    ///
    /// Returns the new inventory version.
    async fn apply(&self, change: StockChange) -> Result<Version>;

    /// Takes the demanded stock and marks the order fulfilled in one write.
    ///
    /// The order state and the quantities are read and changed under the
    /// inventory lock. Fails with `OrderNotFound`, `OrderAlreadyFulfilled`
    /// or `InsufficientStock` without changing anything. Creates the
    /// inventory if it does not exist.
    ///
    /// Returns the new inventory version.
    async fn fulfill_order(&self, order_id: OrderId, demand: &[StockDemand]) -> Result<Version>;

    /// Persists a new order.
    ///
    /// Fails with `FoodNotFound` if a line references a food that is not in
    /// the catalog at the time of the write.
    async fn insert_order(&self, order: OrderRecord) -> Result<()>;

    /// Retrieves an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Retrieves orders matching a query, oldest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>>;

    /// Removes every order owned by a user. Returns how many were removed.
    async fn delete_orders_for_owner(&self, owner: &OwnerId) -> Result<u64>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait StoreExt: Store {
    /// Returns the inventory, creating it first if necessary.
    async fn get_or_create_inventory(&self) -> Result<InventoryRecord> {
        match self.get_inventory().await? {
            Some(inventory) => Ok(inventory),
            None => self.create_inventory().await,
        }
    }

    /// Checks if an order exists.
    async fn order_exists(&self, id: OrderId) -> Result<bool> {
        Ok(self.get_order(id).await?.is_some())
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}
