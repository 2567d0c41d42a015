//! Persistence layer for the food ordering core.
//!
//! The [`Store`] trait is the repository abstraction the domain talks to. Two
//! backends implement it: [`InMemoryStore`] for tests and single-process
//! deployments, and [`PostgresStore`] for a relational database.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{FoodId, OrderId, OwnerId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::OrderQuery;
pub use record::{
    FoodRecord, InventoryRecord, OrderLine, OrderRecord, StockChange, StockDemand,
    Version,
};
pub use store::{Store, StoreExt};
