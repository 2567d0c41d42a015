//! Domain layer for the food ordering core.
//!
//! This crate provides:
//! - Catalog service with name normalization and field validation
//! - Inventory service over the singleton stock ledger
//! - Order ledger and the order state machine
//! - Role-based access policy

pub mod access;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod order;

pub use access::{AccessDenied, Operation, Role, UnknownRole, authorize};
pub use catalog::{Catalog, FoodItem, NewFood, ValidationError};
pub use common::{FoodId, OrderId, OwnerId};
pub use error::DomainError;
pub use inventory::{Inventory, InventorySnapshot};
pub use order::{NewOrder, Order, OrderLedger, OrderState};
