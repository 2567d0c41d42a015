//! Fulfillment coordinator: the atomic check-and-decrement.

use std::time::Instant;

use common::OrderId;
use domain::{DomainError, Order, OrderState};
use store::Store;

use crate::plan::FulfillmentPlan;

/// Converts a created order into a fulfilled one by consuming stock.
///
/// The only component that touches stock and order state together. The
/// order's line items are grouped into a plan and the store checks and
/// applies it in one locked write, so two fulfillments never decide on the
/// same stock and a sufficient inventory never turns a request away.
pub struct FulfillmentCoordinator<S: Store> {
    store: S,
}

impl<S: Store> FulfillmentCoordinator<S> {
    /// Creates a coordinator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fulfills an order, all or nothing.
    ///
    /// Fails with `NotFound` for an unknown order, `AlreadyFulfilled` if the
    /// order was fulfilled before and `OutOfStock` for the first short item
    /// in name order.
    #[tracing::instrument(skip(self))]
    pub async fn fulfill(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let start = Instant::now();
        let result = self.try_fulfill(order_id).await;

        metrics::histogram!("fulfillment_duration_seconds").record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_fulfilled_total").increment(1);
                tracing::info!(order_id = %order.id, items = order.item_count(), "order fulfilled");
            }
            Err(e) => {
                let reason = rejection_reason(e);
                metrics::counter!("fulfillment_rejected_total", "reason" => reason).increment(1);
                tracing::warn!(error = %e, reason, "fulfillment rejected");
            }
        }

        result
    }

    async fn try_fulfill(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let record = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;

        let mut order = Order::from(record);
        if !order.state.can_fulfill() {
            return Err(DomainError::AlreadyFulfilled(order_id));
        }

        // The store re-checks the order state under its lock
        let plan = FulfillmentPlan::for_order(&order);
        self.store.fulfill_order(order_id, plan.items()).await?;

        order.state = OrderState::Fulfilled;
        Ok(order)
    }
}

fn rejection_reason(e: &DomainError) -> &'static str {
    match e {
        DomainError::NotFound { .. } => "not_found",
        DomainError::AlreadyFulfilled(_) => "already_fulfilled",
        DomainError::OutOfStock { .. } => "out_of_stock",
        _ => "error",
    }
}
