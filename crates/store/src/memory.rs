use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    FoodId, FoodRecord, InventoryRecord, OrderId, OrderQuery, OrderRecord, OwnerId, Result,
    StockChange, StockDemand, StoreError, Version, store::Store,
};

#[derive(Default)]
struct MemoryState {
    foods: HashMap<FoodId, FoodRecord>,
    inventory: Option<InventoryRecord>,
    orders: Vec<OrderRecord>,
}

impl MemoryState {
    fn name_taken(&self, name: &str, except: &[FoodId]) -> bool {
        self.foods
            .values()
            .any(|food| food.name == name && !except.contains(&food.id))
    }

    fn blocking_orders(&self, food_id: FoodId) -> usize {
        self.orders
            .iter()
            .filter(|o| !o.fulfilled && o.references(food_id))
            .count()
    }

    /// Checks a change against the current state without touching it.
    fn validate(&self, change: &StockChange) -> Result<()> {
        let inventory = self.inventory.as_ref().ok_or(StoreError::InventoryMissing)?;

        let updated: Vec<FoodId> = change.foods.iter().map(|f| f.id).collect();
        for (index, food) in change.foods.iter().enumerate() {
            if !self.foods.contains_key(&food.id) {
                return Err(StoreError::FoodNotFound(food.id));
            }
            let clashes_in_change = change.foods[..index].iter().any(|f| f.name == food.name && f.id != food.id);
            if clashes_in_change || self.name_taken(&food.name, &updated) {
                return Err(StoreError::DuplicateName(food.name.clone()));
            }
        }

        for food_id in change.quantities.keys() {
            if !inventory.contains(*food_id) {
                return Err(StoreError::FoodNotFound(*food_id));
            }
        }

        Ok(())
    }
}

/// In-memory store implementation.
///
/// All state sits behind a single lock, so every write is serialized and a
/// stock change is observed either completely or not at all.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of catalog records.
    pub async fn food_count(&self) -> usize {
        self.state.read().await.foods.len()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears the catalog, the inventory and all orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.foods.clear();
        state.inventory = None;
        state.orders.clear();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_food(&self, food: FoodRecord, quantity: u32) -> Result<Version> {
        let mut state = self.state.write().await;

        if state.name_taken(&food.name, &[]) {
            return Err(StoreError::DuplicateName(food.name));
        }

        let inventory = state.inventory.get_or_insert_with(InventoryRecord::empty);
        inventory.stock.insert(food.id, quantity);
        inventory.version = inventory.version.next();
        let version = inventory.version;

        state.foods.insert(food.id, food);
        Ok(version)
    }

    async fn get_food(&self, id: FoodId) -> Result<Option<FoodRecord>> {
        let state = self.state.read().await;
        Ok(state.foods.get(&id).cloned())
    }

    async fn get_food_by_name(&self, name: &str) -> Result<Option<FoodRecord>> {
        let state = self.state.read().await;
        Ok(state.foods.values().find(|f| f.name == name).cloned())
    }

    async fn list_foods(&self) -> Result<Vec<FoodRecord>> {
        let state = self.state.read().await;
        let mut foods: Vec<_> = state.foods.values().cloned().collect();
        foods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(foods)
    }

    async fn delete_food(&self, id: FoodId) -> Result<Version> {
        let mut state = self.state.write().await;

        let name = match state.foods.get(&id) {
            Some(food) => food.name.clone(),
            None => return Err(StoreError::FoodNotFound(id)),
        };
        let count = state.blocking_orders(id);
        if count > 0 {
            return Err(StoreError::FoodInUse { name, count });
        }

        state.foods.remove(&id);
        let inventory = state.inventory.get_or_insert_with(InventoryRecord::empty);
        inventory.stock.remove(&id);
        inventory.version = inventory.version.next();
        Ok(inventory.version)
    }

    async fn get_inventory(&self) -> Result<Option<InventoryRecord>> {
        let state = self.state.read().await;
        Ok(state.inventory.clone())
    }

    async fn create_inventory(&self) -> Result<InventoryRecord> {
        let mut state = self.state.write().await;
        Ok(state
            .inventory
            .get_or_insert_with(InventoryRecord::empty)
            .clone())
    }

    async fn apply(&self, change: StockChange) -> Result<Version> {
        let mut state = self.state.write().await;

        state.validate(&change)?;

        for food in change.foods {
            state.foods.insert(food.id, food);
        }

        let inventory = state
            .inventory
            .as_mut()
            .ok_or(StoreError::InventoryMissing)?;
        inventory.stock.extend(change.quantities);
        inventory.version = inventory.version.next();

        Ok(inventory.version)
    }

    async fn fulfill_order(&self, order_id: OrderId, demand: &[StockDemand]) -> Result<Version> {
        let mut state = self.state.write().await;
        let state = &mut *state;

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if order.fulfilled {
            return Err(StoreError::OrderAlreadyFulfilled(order_id));
        }

        let inventory = state.inventory.get_or_insert_with(InventoryRecord::empty);
        let change = inventory.reserve(demand)?;

        inventory.stock.extend(change.quantities);
        inventory.version = inventory.version.next();
        order.fulfilled = true;

        Ok(inventory.version)
    }

    async fn insert_order(&self, order: OrderRecord) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(line) = order
            .lines
            .iter()
            .find(|line| !state.foods.contains_key(&line.food_id))
        {
            return Err(StoreError::FoodNotFound(line.food_id));
        }

        state.orders.push(order);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps
        orders.sort_by_key(|o| o.created_at);

        let offset = query.offset.unwrap_or(0);
        let orders = orders.into_iter().skip(offset);

        let orders = match query.limit {
            Some(limit) => orders.take(limit).collect(),
            None => orders.collect(),
        };

        Ok(orders)
    }

    async fn delete_orders_for_owner(&self, owner: &OwnerId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.orders.len();
        state.orders.retain(|o| &o.owner != owner);
        Ok((before - state.orders.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::OrderLine;

    fn food(name: &str) -> FoodRecord {
        FoodRecord {
            id: FoodId::new(),
            name: name.to_string(),
            price: 2,
            allergens: vec![],
        }
    }

    fn order(owner: &str, lines: &[&FoodRecord]) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(),
            name: "order".to_string(),
            owner: OwnerId::new(owner),
            lines: lines
                .iter()
                .map(|f| OrderLine::new(f.id, f.name.clone()))
                .collect(),
            fulfilled: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_food_creates_inventory_and_bumps_version() {
        let store = InMemoryStore::new();
        assert!(store.get_inventory().await.unwrap().is_none());

        let bread = food("BREAD");
        let version = store.insert_food(bread.clone(), 5).await.unwrap();
        assert_eq!(version, Version::new(1));

        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert_eq!(inventory.quantity(bread.id), 5);
        assert_eq!(inventory.version, Version::new(1));
        assert_eq!(store.food_count().await, 1);
    }

    #[tokio::test]
    async fn insert_food_rejects_duplicate_name() {
        let store = InMemoryStore::new();
        store.insert_food(food("TEA"), 1).await.unwrap();

        let result = store.insert_food(food("TEA"), 3).await;
        assert!(matches!(result, Err(StoreError::DuplicateName(name)) if name == "TEA"));
        assert_eq!(store.food_count().await, 1);
    }

    #[tokio::test]
    async fn list_foods_sorted_by_name() {
        let store = InMemoryStore::new();
        store.insert_food(food("TEA"), 1).await.unwrap();
        store.insert_food(food("APPLE"), 1).await.unwrap();
        store.insert_food(food("MILK"), 1).await.unwrap();

        let names: Vec<_> = store
            .list_foods()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["APPLE", "MILK", "TEA"]);
    }

    #[tokio::test]
    async fn delete_food_removes_stock_entry() {
        let store = InMemoryStore::new();
        let bread = food("BREAD");
        store.insert_food(bread.clone(), 5).await.unwrap();

        store.delete_food(bread.id).await.unwrap();

        assert!(store.get_food(bread.id).await.unwrap().is_none());
        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert!(!inventory.contains(bread.id));
        assert_eq!(inventory.version, Version::new(2));

        let result = store.delete_food(bread.id).await;
        assert!(matches!(result, Err(StoreError::FoodNotFound(_))));
    }

    #[tokio::test]
    async fn create_inventory_is_idempotent() {
        let store = InMemoryStore::new();
        let first = store.create_inventory().await.unwrap();
        store.insert_food(food("TEA"), 2).await.unwrap();
        let second = store.create_inventory().await.unwrap();

        assert_eq!(first.version, Version::initial());
        assert_eq!(second.version, Version::new(1));
        assert_eq!(second.stock.len(), 1);
    }

    #[tokio::test]
    async fn apply_without_inventory_fails() {
        let store = InMemoryStore::new();
        let result = store.apply(StockChange::new()).await;
        assert!(matches!(result, Err(StoreError::InventoryMissing)));
    }

    #[tokio::test]
    async fn apply_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        store.insert_food(tea.clone(), 4).await.unwrap();

        let result = store
            .apply(
                StockChange::new()
                    .set_quantity(tea.id, 1)
                    .set_quantity(FoodId::new(), 9),
            )
            .await;

        assert!(matches!(result, Err(StoreError::FoodNotFound(_))));
        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert_eq!(inventory.quantity(tea.id), 4);
        assert_eq!(inventory.version, Version::new(1));
    }

    fn demand(food: &FoodRecord, required: u32) -> StockDemand {
        StockDemand {
            food_id: food.id,
            name: food.name.clone(),
            required,
        }
    }

    #[tokio::test]
    async fn fulfill_order_takes_stock_and_flips_order() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        store.insert_food(tea.clone(), 4).await.unwrap();
        let placed = order("alice", &[&tea, &tea]);
        store.insert_order(placed.clone()).await.unwrap();

        let version = store
            .fulfill_order(placed.id, &[demand(&tea, 2)])
            .await
            .unwrap();
        assert_eq!(version, Version::new(2));

        let stored = store.get_order(placed.id).await.unwrap().unwrap();
        assert!(stored.fulfilled);
        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert_eq!(inventory.quantity(tea.id), 2);

        let again = store.fulfill_order(placed.id, &[demand(&tea, 2)]).await;
        assert!(matches!(again, Err(StoreError::OrderAlreadyFulfilled(_))));
        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert_eq!(inventory.quantity(tea.id), 2);
    }

    #[tokio::test]
    async fn fulfill_order_short_stock_changes_nothing() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        let milk = food("MILK");
        store.insert_food(tea.clone(), 4).await.unwrap();
        store.insert_food(milk.clone(), 1).await.unwrap();
        let placed = order("alice", &[&milk, &milk, &tea]);
        store.insert_order(placed.clone()).await.unwrap();

        let result = store
            .fulfill_order(placed.id, &[demand(&milk, 2), demand(&tea, 1)])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { ref item, required: 2, available: 1 }) if item == "MILK"
        ));
        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert_eq!(inventory.quantity(tea.id), 4);
        assert_eq!(inventory.quantity(milk.id), 1);
        assert_eq!(inventory.version, Version::new(2));
        assert!(!store.get_order(placed.id).await.unwrap().unwrap().fulfilled);
    }

    #[tokio::test]
    async fn fulfill_unknown_order_fails() {
        let store = InMemoryStore::new();
        let missing = OrderId::new();
        let result = store.fulfill_order(missing, &[]).await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn concurrent_fulfillments_never_oversell() {
        let store = InMemoryStore::new();
        let coffee = food("COFFEE");
        store.insert_food(coffee.clone(), 100).await.unwrap();

        let mut placed = Vec::new();
        for _ in 0..150 {
            let o = order("alice", &[&coffee]);
            store.insert_order(o.clone()).await.unwrap();
            placed.push(o.id);
        }

        let tasks: Vec<_> = placed
            .into_iter()
            .map(|id| {
                let store = store.clone();
                let wanted = demand(&coffee, 1);
                tokio::spawn(async move { store.fulfill_order(id, &[wanted]).await })
            })
            .collect();

        let mut fulfilled = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => fulfilled += 1,
                Err(StoreError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(fulfilled, 100);
        let inventory = store.get_inventory().await.unwrap().unwrap();
        assert_eq!(inventory.quantity(coffee.id), 0);
    }

    #[tokio::test]
    async fn delete_food_refused_while_unfulfilled_orders_reference_it() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        store.insert_food(tea.clone(), 4).await.unwrap();
        let placed = order("alice", &[&tea, &tea]);
        store.insert_order(placed.clone()).await.unwrap();

        let result = store.delete_food(tea.id).await;
        assert!(matches!(
            result,
            Err(StoreError::FoodInUse { ref name, count: 1 }) if name == "TEA"
        ));
        assert!(store.get_food(tea.id).await.unwrap().is_some());

        store
            .fulfill_order(placed.id, &[demand(&tea, 2)])
            .await
            .unwrap();
        store.delete_food(tea.id).await.unwrap();
        assert!(store.get_food(tea.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_order_rejects_unknown_food() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        let ghost = food("GHOST");
        store.insert_food(tea.clone(), 4).await.unwrap();

        let result = store.insert_order(order("alice", &[&tea, &ghost])).await;
        assert!(matches!(result, Err(StoreError::FoodNotFound(id)) if id == ghost.id));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn delete_and_order_placement_do_not_interleave() {
        for _ in 0..50 {
            let store = InMemoryStore::new();
            let tea = food("TEA");
            store.insert_food(tea.clone(), 4).await.unwrap();

            let deleting = {
                let store = store.clone();
                let id = tea.id;
                tokio::spawn(async move { store.delete_food(id).await })
            };
            let placing = {
                let store = store.clone();
                let placed = order("alice", &[&tea]);
                tokio::spawn(async move { store.insert_order(placed).await })
            };

            let deleted = deleting.await.unwrap();
            let placed = placing.await.unwrap();

            // Exactly one side wins and no order is left pointing at a missing food
            match (deleted, placed) {
                (Ok(_), Err(StoreError::FoodNotFound(_))) => {
                    assert_eq!(store.order_count().await, 0);
                }
                (Err(StoreError::FoodInUse { .. }), Ok(())) => {
                    assert!(store.get_food(tea.id).await.unwrap().is_some());
                }
                (d, p) => panic!("unexpected outcome: {d:?} / {p:?}"),
            }
        }
    }

    #[tokio::test]
    async fn apply_rejects_rename_onto_existing_name() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        let milk = food("MILK");
        store.insert_food(tea.clone(), 1).await.unwrap();
        store.insert_food(milk.clone(), 1).await.unwrap();

        let renamed = FoodRecord {
            name: "TEA".to_string(),
            ..milk.clone()
        };
        let result = store
            .apply(StockChange::new().update_food(renamed))
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateName(_))));
        let stored = store.get_food(milk.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "MILK");
    }

    #[tokio::test]
    async fn query_orders_filters_and_pages() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        let milk = food("MILK");
        store.insert_food(tea.clone(), 10).await.unwrap();
        store.insert_food(milk.clone(), 10).await.unwrap();

        let first = order("alice", &[&tea]);
        let second = order("bob", &[&milk]);
        let third = order("alice", &[&milk]);
        for o in [&first, &second, &third] {
            store.insert_order(o.clone()).await.unwrap();
        }

        let alice = store
            .query_orders(OrderQuery::for_owner(OwnerId::new("alice")))
            .await
            .unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].id, first.id);
        assert_eq!(alice[1].id, third.id);

        let referencing_milk = store
            .query_orders(OrderQuery::new().fulfilled(false).references_food(milk.id))
            .await
            .unwrap();
        assert_eq!(referencing_milk.len(), 2);

        let paged = store
            .query_orders(OrderQuery::new().offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, second.id);
    }

    #[tokio::test]
    async fn delete_orders_for_owner_only_removes_theirs() {
        let store = InMemoryStore::new();
        let tea = food("TEA");
        store.insert_food(tea.clone(), 10).await.unwrap();
        store.insert_order(order("alice", &[&tea])).await.unwrap();
        store.insert_order(order("alice", &[&tea])).await.unwrap();
        store.insert_order(order("bob", &[&tea])).await.unwrap();

        let removed = store
            .delete_orders_for_owner(&OwnerId::new("alice"))
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.order_count().await, 1);
    }
}
