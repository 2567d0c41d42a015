//! Order fulfillment against the shared inventory.
//!
//! Fulfilling an order groups its line items by food and hands the demand to
//! the store, which checks every item against the stock on hand and, only
//! when all of them are satisfiable, decrements the stock and marks the order
//! fulfilled. The check and the write happen under the inventory lock, so
//! concurrent fulfillments queue behind each other instead of failing.

pub mod coordinator;
pub mod plan;

pub use coordinator::FulfillmentCoordinator;
pub use plan::FulfillmentPlan;
