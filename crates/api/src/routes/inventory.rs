//! Inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{FoodItem, InventorySnapshot, NewFood, Operation};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::caller::Caller;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct UpdateInventoryRequest {
    pub foods: Vec<NewFood>,
}

#[derive(Serialize)]
pub struct InventoryResponse {
    pub version: i64,
    pub foods: Vec<FoodItem>,
}

impl From<InventorySnapshot> for InventoryResponse {
    fn from(snapshot: InventorySnapshot) -> Self {
        Self {
            version: snapshot.version.as_i64(),
            foods: snapshot.items,
        }
    }
}

/// GET /api/inventory: current stock, created empty on first access.
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<InventoryResponse>, ApiError> {
    caller.authorize(Operation::ViewInventory)?;
    Ok(Json(state.inventory.get().await?.into()))
}

/// POST /api/inventory: overwrite quantities of foods already stocked.
#[tracing::instrument(skip(state, caller, req))]
pub async fn update<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<UpdateInventoryRequest>,
) -> Result<Json<InventoryResponse>, ApiError> {
    caller.authorize(Operation::UpdateInventory)?;
    Ok(Json(state.inventory.update(req.foods).await?.into()))
}
