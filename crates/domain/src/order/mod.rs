//! Orders: state machine, read model and ledger.

mod ledger;
mod model;
mod state;

pub use ledger::{NewOrder, OrderLedger};
pub use model::Order;
pub use state::OrderState;
