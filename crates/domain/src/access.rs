//! Role-based access policy.
//!
//! The policy is a pure table lookup: no IO, no identity handling. Callers
//! resolve the caller's role first and check it before dispatching.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller roles known to the ordering core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts `ADMIN` and `ROLE_ADMIN` style spellings in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "ADMIN" => Ok(Role::Admin),
            "STAFF" => Ok(Role::Staff),
            "CUSTOMER" => Ok(Role::Customer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Guarded operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ViewCatalog,
    ManageCatalog,
    ViewInventory,
    UpdateInventory,
    PlaceOrder,
    ViewAllOrders,
    ViewOwnOrders,
    FulfillOrder,
    DeleteOwnerOrders,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ViewCatalog => "view_catalog",
            Operation::ManageCatalog => "manage_catalog",
            Operation::ViewInventory => "view_inventory",
            Operation::UpdateInventory => "update_inventory",
            Operation::PlaceOrder => "place_order",
            Operation::ViewAllOrders => "view_all_orders",
            Operation::ViewOwnOrders => "view_own_orders",
            Operation::FulfillOrder => "fulfill_order",
            Operation::DeleteOwnerOrders => "delete_owner_orders",
        }
    }

    fn allows(&self, role: Role) -> bool {
        match self {
            Operation::ViewCatalog
            | Operation::ViewInventory
            | Operation::PlaceOrder
            | Operation::ViewOwnOrders => true,
            Operation::ManageCatalog
            | Operation::UpdateInventory
            | Operation::ViewAllOrders
            | Operation::FulfillOrder => matches!(role, Role::Admin | Role::Staff),
            Operation::DeleteOwnerOrders => role == Role::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("forbidden: role {role} may not {}", .operation.as_str())]
pub struct AccessDenied {
    pub role: Role,
    pub operation: Operation,
}

/// Checks whether a role may perform an operation.
pub fn authorize(role: Role, operation: Operation) -> Result<(), AccessDenied> {
    if operation.allows(role) {
        Ok(())
    } else {
        Err(AccessDenied { role, operation })
    }
}
