//! Order ledger: creation and filtered queries over persisted orders.

use std::collections::HashMap;

use chrono::Utc;
use common::{FoodId, OrderId, OwnerId};
use serde::Deserialize;
use store::{FoodRecord, OrderLine, OrderQuery, OrderRecord, Store};

use crate::catalog::ValidationError;
use crate::error::DomainError;

use super::Order;

/// Input for placing an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    /// Display name; blank or absent names get a generated default.
    #[serde(default)]
    pub name: Option<String>,

    /// One food id per unit ordered.
    pub items: Vec<FoodId>,
}

impl NewOrder {
    pub fn new(items: impl IntoIterator<Item = FoodId>) -> Self {
        Self {
            name: None,
            items: items.into_iter().collect(),
        }
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Service owning order records.
pub struct OrderLedger<S: Store> {
    store: S,
}

impl<S: Store> OrderLedger<S> {
    /// Creates a new order ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places a new, unfulfilled order for the caller.
    ///
    /// Every item must resolve to a catalog entry, both here and again when
    /// the store writes the order. Stock is not touched.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        owner: Option<&OwnerId>,
        order: NewOrder,
    ) -> Result<Order, DomainError> {
        let owner = require_owner(owner)?;

        if order.items.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }

        let mut resolved: HashMap<FoodId, FoodRecord> = HashMap::new();
        let mut lines = Vec::with_capacity(order.items.len());
        for food_id in order.items {
            if !resolved.contains_key(&food_id) {
                let food = self
                    .store
                    .get_food(food_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Food", food_id))?;
                resolved.insert(food_id, food);
            }
            if let Some(food) = resolved.get(&food_id) {
                lines.push(OrderLine::new(food_id, food.name.clone()));
            }
        }

        let id = OrderId::new();
        let name = match order.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_order_name(id),
        };

        let record = OrderRecord {
            id,
            name,
            owner: owner.clone(),
            lines,
            fulfilled: false,
            created_at: Utc::now(),
        };
        self.store.insert_order(record.clone()).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %id, owner = %owner, items = record.lines.len(), "order created");

        Ok(record.into())
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(id)
            .await?
            .map(Order::from)
            .ok_or_else(|| DomainError::not_found("Order", id))
    }

    /// Lists every order, oldest first.
    pub async fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        self.query(OrderQuery::new()).await
    }

    /// Lists fulfilled orders.
    pub async fn list_fulfilled(&self) -> Result<Vec<Order>, DomainError> {
        self.query(OrderQuery::new().fulfilled(true)).await
    }

    /// Lists orders still waiting for fulfillment.
    pub async fn list_unfulfilled(&self) -> Result<Vec<Order>, DomainError> {
        self.query(OrderQuery::new().fulfilled(false)).await
    }

    /// Lists the caller's orders.
    pub async fn list_for_owner(&self, owner: Option<&OwnerId>) -> Result<Vec<Order>, DomainError> {
        let owner = require_owner(owner)?;
        self.query(OrderQuery::for_owner(owner.clone())).await
    }

    /// Lists the caller's fulfilled orders.
    pub async fn list_fulfilled_for_owner(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Order>, DomainError> {
        let owner = require_owner(owner)?;
        self.query(OrderQuery::for_owner(owner.clone()).fulfilled(true))
            .await
    }

    /// Lists the caller's unfulfilled orders.
    pub async fn list_unfulfilled_for_owner(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Order>, DomainError> {
        let owner = require_owner(owner)?;
        self.query(OrderQuery::for_owner(owner.clone()).fulfilled(false))
            .await
    }

    /// Removes every order owned by a user, fulfilled or not.
    ///
    /// Called explicitly by whoever deletes the user. Returns how many
    /// orders were removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_for_owner(&self, owner: &OwnerId) -> Result<u64, DomainError> {
        let deleted = self.store.delete_orders_for_owner(owner).await?;
        tracing::info!(owner = %owner, deleted, "orders removed for owner");
        Ok(deleted)
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<Order>, DomainError> {
        let records = self.store.query_orders(query).await?;
        Ok(records.into_iter().map(Order::from).collect())
    }
}

fn require_owner(owner: Option<&OwnerId>) -> Result<&OwnerId, DomainError> {
    match owner {
        Some(owner) if !owner.as_str().trim().is_empty() => Ok(owner),
        _ => Err(DomainError::Unauthenticated),
    }
}

/// `Order <first 8 characters of the id>`
fn default_order_name(id: OrderId) -> String {
    let id = id.to_string();
    format!("Order {}", &id[..8])
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;
    use crate::catalog::{Catalog, NewFood};
    use crate::order::OrderState;

    async fn setup() -> (OrderLedger<InMemoryStore>, FoodId, FoodId) {
        let store = InMemoryStore::new();
        let catalog = Catalog::new(store.clone());
        let tea = catalog
            .create(NewFood::new("TEA", 1, 2, Vec::<String>::new()))
            .await
            .unwrap();
        let bagel = catalog
            .create(NewFood::new("BAGEL", 4, 4, ["gluten"]))
            .await
            .unwrap();
        (OrderLedger::new(store), tea.id, bagel.id)
    }

    #[tokio::test]
    async fn create_requires_owner() {
        let (ledger, tea, _) = setup().await;

        let err = ledger.create(None, NewOrder::new([tea])).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));

        let blank = OwnerId::new("  ");
        let err = ledger
            .create(Some(&blank), NewOrder::new([tea]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn create_rejects_empty_and_unknown_items() {
        let (ledger, tea, _) = setup().await;
        let alice = OwnerId::new("alice");

        let err = ledger
            .create(Some(&alice), NewOrder::new([]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::EmptyOrder)
        ));

        let err = ledger
            .create(Some(&alice), NewOrder::new([tea, FoodId::new()]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Food", .. }));
        assert!(ledger.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_captures_names_and_defaults_display_name() {
        let (ledger, tea, bagel) = setup().await;
        let alice = OwnerId::new("alice");

        let order = ledger
            .create(Some(&alice), NewOrder::new([tea, bagel, tea]))
            .await
            .unwrap();

        assert_eq!(order.state, OrderState::Created);
        assert_eq!(order.owner, alice);
        assert_eq!(order.quantity_of(tea), 2);
        assert_eq!(order.items[1].food_name, "BAGEL");
        assert_eq!(order.name, format!("Order {}", &order.id.to_string()[..8]));

        let named = ledger
            .create(Some(&alice), NewOrder::new([bagel]).named("  breakfast "))
            .await
            .unwrap();
        assert_eq!(named.name, "breakfast");
    }

    #[tokio::test]
    async fn create_does_not_touch_stock() {
        let (ledger, tea, _) = setup().await;
        let before = ledger.store().get_inventory().await.unwrap().unwrap();

        ledger
            .create(Some(&OwnerId::new("alice")), NewOrder::new([tea, tea, tea]))
            .await
            .unwrap();

        let after = ledger.store().get_inventory().await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn get_missing_order_is_not_found() {
        let (ledger, _, _) = setup().await;
        let err = ledger.get(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Order", .. }));
    }

    #[tokio::test]
    async fn owner_scoped_lists() {
        let (ledger, tea, bagel) = setup().await;
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");

        let first = ledger
            .create(Some(&alice), NewOrder::new([tea]))
            .await
            .unwrap();
        ledger
            .create(Some(&bob), NewOrder::new([bagel]))
            .await
            .unwrap();
        let third = ledger
            .create(Some(&alice), NewOrder::new([bagel]))
            .await
            .unwrap();

        let mine = ledger.list_for_owner(Some(&alice)).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);

        assert_eq!(ledger.list_unfulfilled_for_owner(Some(&alice)).await.unwrap().len(), 2);
        assert!(ledger.list_fulfilled_for_owner(Some(&alice)).await.unwrap().is_empty());
        assert_eq!(ledger.list_unfulfilled().await.unwrap().len(), 3);
        assert!(ledger.list_fulfilled().await.unwrap().is_empty());

        assert!(matches!(
            ledger.list_for_owner(None).await,
            Err(DomainError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn delete_for_owner_cascades_only_their_orders() {
        let (ledger, tea, bagel) = setup().await;
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");
        ledger.create(Some(&alice), NewOrder::new([tea])).await.unwrap();
        ledger.create(Some(&alice), NewOrder::new([bagel])).await.unwrap();
        ledger.create(Some(&bob), NewOrder::new([bagel])).await.unwrap();

        assert_eq!(ledger.delete_for_owner(&alice).await.unwrap(), 2);
        assert_eq!(ledger.delete_for_owner(&alice).await.unwrap(), 0);

        let remaining = ledger.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].owner, bob);
    }
}
