//! Inventory service over the stock singleton.

use std::collections::HashMap;

use store::{StockChange, Store, StoreExt, Version};

use crate::catalog::{FoodItem, NewFood, normalize_name};
use crate::error::DomainError;

use super::InventorySnapshot;

/// Service exposing the singleton stock ledger.
pub struct Inventory<S: Store> {
    store: S,
}

impl<S: Store> Inventory<S> {
    /// Creates a new inventory service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the current snapshot, creating an empty inventory on first use.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self) -> Result<InventorySnapshot, DomainError> {
        let inventory = self.store.get_or_create_inventory().await?;
        let foods = self.store.list_foods().await?;

        let items = foods
            .into_iter()
            .filter(|food| inventory.contains(food.id))
            .map(|food| {
                let amount = inventory.quantity(food.id);
                FoodItem::from_record(food, amount)
            })
            .collect();

        Ok(InventorySnapshot {
            version: inventory.version,
            items,
        })
    }

    /// Overwrites quantity, price and allergens for entries matching an
    /// existing inventory item by name.
    ///
    /// Entries whose name matches nothing are ignored; no item is ever added.
    /// Every matched entry is validated before the single write, so one bad
    /// entry rejects the whole update.
    #[tracing::instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn update(&self, entries: Vec<NewFood>) -> Result<InventorySnapshot, DomainError> {
        let inventory = self
            .store
            .get_inventory()
            .await?
            .ok_or_else(|| DomainError::not_found("Inventory", "singleton"))?;

        let by_name: HashMap<String, _> = self
            .store
            .list_foods()
            .await?
            .into_iter()
            .filter(|food| inventory.contains(food.id))
            .map(|food| (food.name.clone(), food))
            .collect();

        let mut change = StockChange::new();
        let mut matched = 0usize;
        for entry in &entries {
            let Ok(name) = normalize_name(&entry.name) else {
                continue;
            };
            let Some(existing) = by_name.get(&name) else {
                tracing::debug!(%name, "inventory entry ignored, no matching item");
                continue;
            };

            let (record, amount) = entry.validate()?.into_record(existing.id);
            change = change.update_food(record).set_quantity(existing.id, amount);
            matched += 1;
        }

        if matched > 0 {
            let version: Version = self.store.apply(change).await?;
            tracing::info!(matched, %version, "inventory updated");
        }

        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;
    use crate::catalog::{Catalog, ValidationError};

    async fn stocked() -> (Catalog<InMemoryStore>, Inventory<InMemoryStore>) {
        let store = InMemoryStore::new();
        let catalog = Catalog::new(store.clone());
        catalog
            .create(NewFood::new("COFFEE", 5, 3, ["caffeine"]))
            .await
            .unwrap();
        catalog
            .create(NewFood::new("TEA", 1, 2, Vec::<String>::new()))
            .await
            .unwrap();
        (catalog, Inventory::new(store))
    }

    #[tokio::test]
    async fn get_creates_empty_inventory_on_first_access() {
        let inventory = Inventory::new(InMemoryStore::new());

        let snapshot = inventory.get().await.unwrap();

        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.version, Version::initial());
        assert!(inventory.store().get_inventory().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn get_joins_catalog_and_stock() {
        let (_, inventory) = stocked().await;

        let snapshot = inventory.get().await.unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.quantity_of("COFFEE"), Some(5));
        assert_eq!(snapshot.quantity_of("TEA"), Some(1));
    }

    #[tokio::test]
    async fn update_without_inventory_is_not_found() {
        let inventory = Inventory::new(InMemoryStore::new());

        let err = inventory
            .update(vec![NewFood::new("COFFEE", 1, 1, Vec::<String>::new())])
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { entity: "Inventory", .. }));
    }

    #[tokio::test]
    async fn update_overwrites_matched_and_ignores_unknown() {
        let (catalog, inventory) = stocked().await;

        let snapshot = inventory
            .update(vec![
                NewFood::new("coffee", 12, 4, ["caffeine"]),
                NewFood::new("CROISSANT", 7, 3, ["gluten"]),
            ])
            .await
            .unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.quantity_of("COFFEE"), Some(12));
        assert_eq!(snapshot.quantity_of("CROISSANT"), None);
        assert_eq!(catalog.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_matched_entry_rejects_whole_update() {
        let (_, inventory) = stocked().await;

        let err = inventory
            .update(vec![
                NewFood::new("COFFEE", 9, 3, Vec::<String>::new()),
                NewFood::new("TEA", -1, 2, Vec::<String>::new()),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::NegativeAmount)
        ));
        let snapshot = inventory.get().await.unwrap();
        assert_eq!(snapshot.quantity_of("COFFEE"), Some(5));
        assert_eq!(snapshot.quantity_of("TEA"), Some(1));
    }

    #[tokio::test]
    async fn invalid_unmatched_entry_is_ignored() {
        let (_, inventory) = stocked().await;

        let snapshot = inventory
            .update(vec![
                NewFood::new("GHOST", -5, -5, Vec::<String>::new()),
                NewFood::new("TEA", 3, 2, Vec::<String>::new()),
            ])
            .await
            .unwrap();

        assert_eq!(snapshot.quantity_of("TEA"), Some(3));
    }

    #[tokio::test]
    async fn update_bumps_version_once() {
        let (_, inventory) = stocked().await;
        let before = inventory.get().await.unwrap().version;

        let after = inventory
            .update(vec![
                NewFood::new("COFFEE", 1, 3, Vec::<String>::new()),
                NewFood::new("TEA", 1, 2, Vec::<String>::new()),
            ])
            .await
            .unwrap()
            .version;

        assert_eq!(after, before.next());
    }
}
