use thiserror::Error;

use crate::{FoodId, OrderId};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A food with the same normalized name already exists.
    #[error("Food name already exists: {0}")]
    DuplicateName(String),

    /// The inventory singleton has not been created yet.
    #[error("Inventory does not exist")]
    InventoryMissing,

    /// The referenced food is not in the catalog or the stock index.
    #[error("Food not found: {0}")]
    FoodNotFound(FoodId),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order was already marked fulfilled.
    #[error("Order already fulfilled: {0}")]
    OrderAlreadyFulfilled(OrderId),

    /// Stock on hand does not cover what an order needs.
    #[error("Insufficient stock for {item}: required {required}, available {available}")]
    InsufficientStock {
        item: String,
        required: u32,
        available: u32,
    },

    /// Unfulfilled orders still reference the food.
    #[error("Food {name} is referenced by {count} unfulfilled order(s)")]
    FoodInUse { name: String, count: usize },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
