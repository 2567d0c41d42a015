//! Catalog service: create, read, update and guarded delete of food items.

use common::FoodId;
use store::{InventoryRecord, StockChange, Store};

use crate::error::DomainError;

use super::{FoodItem, NewFood, sample_catalog};

/// Service owning food definitions.
///
/// Quantities are read from and written to the inventory's stock index, so a
/// returned [`FoodItem`] always reflects the single stored quantity.
pub struct Catalog<S: Store> {
    store: S,
}

impl<S: Store> Catalog<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds a new food to the catalog and the inventory.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, food: NewFood) -> Result<FoodItem, DomainError> {
        let valid = food.validate()?;

        if self.store.get_food_by_name(&valid.name).await?.is_some() {
            tracing::debug!(name = %valid.name, "duplicate food rejected");
            return Err(DomainError::DuplicateName(valid.name));
        }

        let (record, amount) = valid.into_record(FoodId::new());
        self.store.insert_food(record.clone(), amount).await?;

        metrics::counter!("catalog_foods_created_total").increment(1);
        tracing::info!(food_id = %record.id, name = %record.name, amount, "food created");

        Ok(FoodItem::from_record(record, amount))
    }

    /// Loads a food by id.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: FoodId) -> Result<FoodItem, DomainError> {
        let record = self
            .store
            .get_food(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Food", id))?;

        let amount = self.current_stock().await?.quantity(id);
        Ok(FoodItem::from_record(record, amount))
    }

    /// Lists every food ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<FoodItem>, DomainError> {
        let stock = self.current_stock().await?;
        let foods = self.store.list_foods().await?;

        Ok(foods
            .into_iter()
            .map(|record| {
                let amount = stock.quantity(record.id);
                FoodItem::from_record(record, amount)
            })
            .collect())
    }

    /// Overwrites the stock, price and allergens of the food with this name.
    ///
    /// The catalog record and its stock entry change in one write.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, food: NewFood) -> Result<FoodItem, DomainError> {
        let valid = food.validate()?;

        let existing = self
            .store
            .get_food_by_name(&valid.name)
            .await?
            .ok_or_else(|| DomainError::not_found("Food", &valid.name))?;

        let (record, amount) = valid.into_record(existing.id);
        self.store
            .apply(
                StockChange::new()
                    .update_food(record.clone())
                    .set_quantity(record.id, amount),
            )
            .await?;

        tracing::info!(food_id = %record.id, name = %record.name, amount, "food updated");
        Ok(FoodItem::from_record(record, amount))
    }

    /// Removes a food from the catalog and the inventory.
    ///
    /// Refused while any unfulfilled order still references the food. The
    /// store checks and deletes in one write, so an order placed concurrently
    /// either blocks the delete or fails to find the food. Fulfilled orders
    /// keep the captured name and do not block deletion.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: FoodId) -> Result<FoodItem, DomainError> {
        let item = self.get(id).await?;

        match self.store.delete_food(id).await.map_err(DomainError::from) {
            Ok(_) => {}
            Err(DomainError::FoodInUse { name, count }) => {
                tracing::warn!(
                    food_id = %id,
                    name = %name,
                    orders = count,
                    "delete refused, food referenced by unfulfilled orders"
                );
                return Err(DomainError::FoodInUse { name, count });
            }
            Err(e) => return Err(e),
        }

        metrics::counter!("catalog_foods_deleted_total").increment(1);
        tracing::info!(food_id = %id, name = %item.name, "food deleted");

        Ok(item)
    }

    /// Populates an empty catalog with the built-in sample foods.
    ///
    /// Returns the number of foods created; 0 if the catalog already had
    /// entries.
    #[tracing::instrument(skip(self))]
    pub async fn seed_if_empty(&self) -> Result<usize, DomainError> {
        if !self.store.list_foods().await?.is_empty() {
            return Ok(0);
        }

        let mut created = 0;
        for food in sample_catalog() {
            match self.create(food).await {
                Ok(_) => created += 1,
                Err(DomainError::DuplicateName(name)) => {
                    tracing::debug!(%name, "sample food already present");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(created, "sample catalog seeded");
        Ok(created)
    }

    async fn current_stock(&self) -> Result<InventoryRecord, DomainError> {
        Ok(self.store.get_inventory().await?.unwrap_or_default())
    }
}
