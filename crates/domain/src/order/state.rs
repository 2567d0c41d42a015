//! Order state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► Fulfilled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderState {
    /// Order was placed and has not consumed any stock.
    #[default]
    Created,

    /// Stock was decremented for every line item (terminal state).
    Fulfilled,
}

impl OrderState {
    /// Maps the persisted fulfillment flag to a state.
    pub fn from_fulfilled(fulfilled: bool) -> Self {
        if fulfilled {
            OrderState::Fulfilled
        } else {
            OrderState::Created
        }
    }

    /// Returns true if the order can be fulfilled in this state.
    pub fn can_fulfill(&self) -> bool {
        matches!(self, OrderState::Created)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Fulfilled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "Created",
            OrderState::Fulfilled => "Fulfilled",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
