//! Domain error types.

use common::OrderId;
use store::StoreError;
use thiserror::Error;

use crate::catalog::ValidationError;

/// Errors that can occur during catalog, inventory and order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed field validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A food with the same normalized name is already in the catalog.
    #[error("The name of the new food already exists in the system: {0}")]
    DuplicateName(String),

    /// The food is still referenced by unfulfilled orders.
    #[error("Cannot delete {name}: referenced by {count} unfulfilled order(s)")]
    FoodInUse { name: String, count: usize },

    /// The order was fulfilled before.
    #[error("Order {0} has already been fulfilled")]
    AlreadyFulfilled(OrderId),

    /// Stock is insufficient for one of the order's items.
    #[error("Not enough stock to fulfill the order for {item}. Need: {required}, Available: {available}")]
    OutOfStock {
        item: String,
        required: u32,
        available: u32,
    },

    /// The operation needs a caller identity and none was supplied.
    #[error("Authentication required")]
    Unauthenticated,

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    /// Shorthand for a missing entity keyed by anything displayable.
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns true for the conflict family (duplicate name, food in use).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::DuplicateName(_) | DomainError::FoodInUse { .. }
        )
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateName(name) => DomainError::DuplicateName(name),
            StoreError::InventoryMissing => DomainError::not_found("Inventory", "singleton"),
            StoreError::FoodNotFound(id) => DomainError::not_found("Food", id),
            StoreError::OrderNotFound(id) => DomainError::not_found("Order", id),
            StoreError::OrderAlreadyFulfilled(id) => DomainError::AlreadyFulfilled(id),
            StoreError::InsufficientStock {
                item,
                required,
                available,
            } => DomainError::OutOfStock {
                item,
                required,
                available,
            },
            StoreError::FoodInUse { name, count } => DomainError::FoodInUse { name, count },
            other => DomainError::Store(other),
        }
    }
}
