//! HTTP API server with observability for the food ordering core.
//!
//! Exposes catalog, inventory and order endpoints under `/api`, guarded by
//! the role policy, plus `/health` and Prometheus `/metrics`.

pub mod caller;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use domain::{Catalog, Inventory, OrderLedger};
use fulfillment::FulfillmentCoordinator;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub catalog: Catalog<S>,
    pub inventory: Inventory<S>,
    pub orders: OrderLedger<S>,
    pub fulfillment: FulfillmentCoordinator<S>,
}

/// Wires every service over one shared store.
pub fn create_state<S: Store + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: Catalog::new(store.clone()),
        inventory: Inventory::new(store.clone()),
        orders: OrderLedger::new(store.clone()),
        fulfillment: FulfillmentCoordinator::new(store),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/foods",
            post(routes::foods::create::<S>).get(routes::foods::list::<S>),
        )
        .route("/foods/updateFood", post(routes::foods::update::<S>))
        .route(
            "/foods/{id}",
            get(routes::foods::get::<S>).delete(routes::foods::delete::<S>),
        )
        .route(
            "/inventory",
            get(routes::inventory::get::<S>).post(routes::inventory::update::<S>),
        )
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/fulfilledOrders",
            get(routes::orders::list_fulfilled::<S>),
        )
        .route(
            "/orders/unfulfilledOrders",
            get(routes::orders::list_unfulfilled::<S>),
        )
        .route("/orders/fulfillOrder", post(routes::orders::fulfill::<S>))
        .route("/orders/my-orders", get(routes::orders::my_orders::<S>))
        .route(
            "/orders/my-orders/fulfilled",
            get(routes::orders::my_fulfilled::<S>),
        )
        .route(
            "/orders/my-orders/unfulfilled",
            get(routes::orders::my_unfulfilled::<S>),
        )
        .route(
            "/orders/owner/{owner}",
            delete(routes::orders::delete_for_owner::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
