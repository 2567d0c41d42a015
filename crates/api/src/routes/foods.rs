//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{FoodId, FoodItem, NewFood, Operation};
use store::Store;

use super::parse_id;
use crate::AppState;
use crate::caller::Caller;
use crate::error::ApiError;

/// POST /api/foods: add a food to the catalog with its initial stock.
#[tracing::instrument(skip(state, caller, food))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(food): Json<NewFood>,
) -> Result<Json<FoodItem>, ApiError> {
    caller.authorize(Operation::ManageCatalog)?;
    Ok(Json(state.catalog.create(food).await?))
}

/// GET /api/foods: list the catalog by name.
#[tracing::instrument(skip(state, caller))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<FoodItem>>, ApiError> {
    caller.authorize(Operation::ViewCatalog)?;
    Ok(Json(state.catalog.list().await?))
}

/// GET /api/foods/{id}
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<FoodItem>, ApiError> {
    caller.authorize(Operation::ViewCatalog)?;
    let id: FoodId = parse_id(&id)?;
    Ok(Json(state.catalog.get(id).await?))
}

/// POST /api/foods/updateFood: overwrite a food's fields, matched by name.
#[tracing::instrument(skip(state, caller, food))]
pub async fn update<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(food): Json<NewFood>,
) -> Result<Json<FoodItem>, ApiError> {
    caller.authorize(Operation::ManageCatalog)?;
    Ok(Json(state.catalog.update(food).await?))
}

/// DELETE /api/foods/{id}: returns the removed item.
#[tracing::instrument(skip(state, caller))]
pub async fn delete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<FoodItem>, ApiError> {
    caller.authorize(Operation::ManageCatalog)?;
    let id: FoodId = parse_id(&id)?;
    Ok(Json(state.catalog.delete(id).await?))
}
