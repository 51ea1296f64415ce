//! # Order Lifecycle Manager
//!
//! The single place where status changes are authorised. Two kinds of caller exist:
//!
//! - **Admin**: may set any status. Setting the current status again returns the order
//!   unchanged.
//! - **Owner**: may only cancel, and only while the order is PROCESSING.
//!
//! Moving an order into CANCELLED gives its stock back. The release is guarded by the
//! order's `stock_reserved` flag, which is claimed atomically in the order store first, so
//! concurrent cancellations and an admin bouncing an order in and out of CANCELLED can never
//! release the same items twice.
//!
//! Every status write is conditional on the status that was read. A change decided on a stale
//! read fails with `Conflict` instead of overwriting a newer state.

use crate::clients::{OrderClient, ProductClient};
use crate::error::ShopError;
use crate::model::{Order, OrderId, OrderStatus, Requester};
use crate::order_actor::OrderError;
use tracing::{error, info, instrument, warn};

#[derive(Clone)]
pub struct OrderLifecycleManager {
    orders: OrderClient,
    products: ProductClient,
}

impl OrderLifecycleManager {
    pub fn new(orders: OrderClient, products: ProductClient) -> Self {
        Self { orders, products }
    }

    /// Moves the order to `requested` on behalf of `requester`.
    ///
    /// Admins bypass the transition table; everyone else is held to the owner rules.
    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        requested: OrderStatus,
        requester: &Requester,
    ) -> Result<Order, ShopError> {
        let order = self.orders.find_by_id(order_id).await?;

        if requester.is_admin() {
            if order.status == requested {
                return Ok(order);
            }
            if !order.status.can_transition_to(requested) {
                info!(from = %order.status, to = %requested, "Admin override of transition table");
            }
        } else {
            Self::check_owner_cancel(&order, requested, requester)?;
        }

        self.apply(order, requested).await
    }

    /// Same as [`transition`](Self::transition), with the status given as its wire name.
    pub async fn transition_named(
        &self,
        order_id: OrderId,
        requested: &str,
        requester: &Requester,
    ) -> Result<Order, ShopError> {
        let status = requested
            .parse::<OrderStatus>()
            .map_err(|e| ShopError::Validation(e.to_string()))?;
        self.transition(order_id, status, requester).await
    }

    /// The owner's cancel. Admins get no special treatment here.
    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn cancel_own(
        &self,
        order_id: OrderId,
        requester: &Requester,
    ) -> Result<Order, ShopError> {
        let order = self.orders.find_by_id(order_id).await?;
        Self::check_owner_cancel(&order, OrderStatus::Cancelled, requester)?;
        self.apply(order, OrderStatus::Cancelled).await
    }

    fn check_owner_cancel(
        order: &Order,
        requested: OrderStatus,
        requester: &Requester,
    ) -> Result<(), ShopError> {
        if !order.is_owned_by(&requester.user_id) {
            warn!(order_id = %order.id, "Status change on another user's order");
            return Err(ShopError::Forbidden(format!(
                "{} does not belong to {}",
                order.id, requester.user_id
            )));
        }
        if requested != OrderStatus::Cancelled || order.status != OrderStatus::Processing {
            return Err(ShopError::InvalidTransition {
                from: order.status,
                to: requested,
            });
        }
        Ok(())
    }

    async fn apply(&self, order: Order, next: OrderStatus) -> Result<Order, ShopError> {
        if order.status.is_terminal() && order.status != next {
            warn!(order_id = %order.id, to = %next, "Leaving CANCELLED does not re-reserve stock");
        }

        if next == OrderStatus::Cancelled && order.stock_reserved {
            self.orders
                .claim_reservation(order.id, order.status)
                .await
                .map_err(|e| Self::stale_to_conflict(&order, e))?;
            self.release_line_items(&order).await;
        }

        let updated = self
            .orders
            .update_status(order.id, order.status, next)
            .await
            .map_err(|e| Self::stale_to_conflict(&order, e))?;
        info!(order_id = %updated.id, from = %order.status, to = %next, "Status changed");
        Ok(updated)
    }

    fn stale_to_conflict(order: &Order, e: OrderError) -> ShopError {
        match e {
            OrderError::StaleState(msg) => {
                warn!(order_id = %order.id, %msg, "Order changed under a status change");
                ShopError::Conflict(format!("{} changed concurrently", order.id))
            }
            e => e.into(),
        }
    }

    /// Releases every line item, continuing past failures.
    async fn release_line_items(&self, order: &Order) {
        let mut failed = 0usize;
        for item in &order.line_items {
            if let Err(e) = self
                .products
                .release_stock(item.product_id, item.quantity)
                .await
            {
                failed += 1;
                error!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "Stock release failed"
                );
            }
        }
        if failed > 0 {
            error!(order_id = %order.id, failed, "Cancellation released stock only partially");
        }
    }
}
