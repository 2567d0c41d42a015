//! Order placement, listing and fulfillment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use domain::{DomainError, NewOrder, Operation, Order, OrderId, OwnerId};
use serde::{Deserialize, Serialize};
use store::{OrderLine, Store};

use super::parse_id;
use crate::AppState;
use crate::caller::Caller;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct FulfillOrderRequest {
    pub id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub name: String,
    pub owner: OwnerId,
    pub items: Vec<OrderLine>,
    pub fulfilled: bool,
    pub state: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            fulfilled: order.is_fulfilled(),
            state: order.state.as_str(),
            id: order.id,
            name: order.name,
            owner: order.owner,
            items: order.items,
            created_at: order.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

fn respond(orders: Vec<Order>) -> Json<Vec<OrderResponse>> {
    Json(orders.into_iter().map(OrderResponse::from).collect())
}

// -- Handlers --

/// POST /api/orders: place an order for the calling user.
#[tracing::instrument(skip(state, caller, order))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(order): Json<NewOrder>,
) -> Result<Json<OrderResponse>, ApiError> {
    caller.authorize(Operation::PlaceOrder)?;
    let order = state.orders.create(caller.owner(), order).await?;
    Ok(Json(order.into()))
}

/// GET /api/orders
#[tracing::instrument(skip(state, caller))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    caller.authorize(Operation::ViewAllOrders)?;
    Ok(respond(state.orders.list_all().await?))
}

/// GET /api/orders/fulfilledOrders
#[tracing::instrument(skip(state, caller))]
pub async fn list_fulfilled<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    caller.authorize(Operation::ViewAllOrders)?;
    Ok(respond(state.orders.list_fulfilled().await?))
}

/// GET /api/orders/unfulfilledOrders
#[tracing::instrument(skip(state, caller))]
pub async fn list_unfulfilled<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    caller.authorize(Operation::ViewAllOrders)?;
    Ok(respond(state.orders.list_unfulfilled().await?))
}

/// GET /api/orders/{id}
///
/// Customers only see their own orders; anything else reads as not found.
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    caller.authorize(Operation::ViewOwnOrders)?;
    let id: OrderId = parse_id(&id)?;
    let order = state.orders.get(id).await?;

    if !caller.sees_all_orders() && caller.owner() != Some(&order.owner) {
        return Err(DomainError::not_found("Order", id).into());
    }
    Ok(Json(order.into()))
}

/// POST /api/orders/fulfillOrder: consume stock for an order, all or nothing.
#[tracing::instrument(skip(state, caller, req))]
pub async fn fulfill<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<FulfillOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    caller.authorize(Operation::FulfillOrder)?;
    let id: OrderId = parse_id(&req.id)?;

    match state.fulfillment.fulfill(id).await {
        Ok(order) => Ok(Json(order.into())),
        Err(e) => Err(fulfillment_error(id, e)),
    }
}

/// Only a missing order is a failed precondition; anything else missing keeps
/// its usual status.
fn fulfillment_error(id: OrderId, err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound {
            entity: "Order", ..
        } => ApiError::PreconditionFailed(format!("Order {id} does not exist")),
        other => other.into(),
    }
}

/// GET /api/orders/my-orders
#[tracing::instrument(skip(state, caller))]
pub async fn my_orders<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    caller.authorize(Operation::ViewOwnOrders)?;
    Ok(respond(state.orders.list_for_owner(caller.owner()).await?))
}

/// GET /api/orders/my-orders/fulfilled
#[tracing::instrument(skip(state, caller))]
pub async fn my_fulfilled<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    caller.authorize(Operation::ViewOwnOrders)?;
    Ok(respond(
        state.orders.list_fulfilled_for_owner(caller.owner()).await?,
    ))
}

/// GET /api/orders/my-orders/unfulfilled
#[tracing::instrument(skip(state, caller))]
pub async fn my_unfulfilled<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    caller.authorize(Operation::ViewOwnOrders)?;
    Ok(respond(
        state
            .orders
            .list_unfulfilled_for_owner(caller.owner())
            .await?,
    ))
}

/// DELETE /api/orders/owner/{owner}: cascade for a user being removed.
#[tracing::instrument(skip(state, caller))]
pub async fn delete_for_owner<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(owner): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    caller.authorize(Operation::DeleteOwnerOrders)?;
    let deleted = state.orders.delete_for_owner(&OwnerId::new(owner)).await?;
    Ok(Json(DeletedResponse { deleted }))
}
