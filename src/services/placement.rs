//! # Order Placement
//!
//! Turns a cart into a persisted order backed by reserved stock.
//!
//! Each line item is reserved with its own atomic `Reserve` on the inventory ledger, in
//! line-item order. Successful reservations are recorded in a compensation log; if a later
//! item fails (or the order cannot be stored), the log is replayed in reverse as `Release`
//! calls before the error is returned, so a failed placement leaves stock as it found it.
//!
//! One exception: a `Reserve` the ledger did not answer in time may still be applied after
//! the caller gave up. Releasing it blindly could hand back stock that was never taken, so
//! it is left alone and reported at `error` level as in doubt, and the returned
//! `StorageUnavailable` names it.
//!
//! With `compensate` switched off the log is only reported, at `error` level, and the held
//! stock stays held until an operator reconciles it.

use crate::clients::{OrderClient, ProductClient};
use crate::error::ShopError;
use crate::model::{LineItem, Order, OrderCreate, ProductId, Requester};
use crate::product_actor::ProductError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// One entry of a cart: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Rejects an empty cart or a zero quantity.
pub(crate) fn validate_cart(items: &[CartItem]) -> Result<(), ShopError> {
    if items.is_empty() {
        return Err(ShopError::Validation(
            "order must contain at least one item".into(),
        ));
    }
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(ShopError::Validation(format!(
            "quantity for {} must be at least 1",
            item.product_id
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct OrderPlacement {
    products: ProductClient,
    orders: OrderClient,
    compensate: bool,
}

impl OrderPlacement {
    pub fn new(products: ProductClient, orders: OrderClient, compensate: bool) -> Self {
        Self {
            products,
            orders,
            compensate,
        }
    }

    /// Reserves stock for every item and persists a PROCESSING order.
    ///
    /// Unit prices are read from the catalog now and captured into the order.
    ///
    /// # Errors
    /// `Validation` for a malformed cart, `NotFound` for an unknown product and
    /// `InsufficientStock` naming the first product that could not be reserved.
    #[instrument(skip(self, items), fields(user_id = %requester.user_id, items = items.len()))]
    pub async fn place(
        &self,
        requester: &Requester,
        items: &[CartItem],
        external_session_id: Option<String>,
    ) -> Result<Order, ShopError> {
        debug!(?items, "place called");
        validate_cart(items)?;

        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let product = self.products.find(item.product_id).await?;
            line_items.push(LineItem::new(
                item.product_id,
                item.quantity,
                product.price_cents,
            ));
        }
        let mut params = OrderCreate::from_items(requester.user_id.clone(), line_items)
            .ok_or_else(|| ShopError::Validation("order total overflows".into()))?;
        params.external_session_id = external_session_id;
        params.stock_reserved = true;

        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
        for item in &params.line_items {
            match self
                .products
                .reserve_stock(item.product_id, item.quantity)
                .await
            {
                Ok(_) => reserved.push((item.product_id, item.quantity)),
                Err(ProductError::Unavailable(reason)) => {
                    self.unwind(&reserved).await;
                    error!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        %reason,
                        "Reservation outcome unknown; reconcile manually"
                    );
                    return Err(ShopError::StorageUnavailable(format!(
                        "reservation of {} x{} is in doubt: {reason}",
                        item.product_id, item.quantity
                    )));
                }
                Err(e) => {
                    self.unwind(&reserved).await;
                    return Err(e.into());
                }
            }
        }

        match self.orders.create(params).await {
            Ok(order) => {
                info!(order_id = %order.id, total_cents = order.total_cents, "Order placed");
                Ok(order)
            }
            Err(e) => {
                self.unwind(&reserved).await;
                Err(e.into())
            }
        }
    }

    async fn unwind(&self, reserved: &[(ProductId, u32)]) {
        if reserved.is_empty() {
            return;
        }
        if !self.compensate {
            error!(
                ?reserved,
                "Placement failed after partial reservation; stock left held, reconcile manually"
            );
            return;
        }
        for (product_id, quantity) in reserved.iter().rev() {
            match self.products.release_stock(*product_id, *quantity).await {
                Ok(stock) => debug!(%product_id, quantity, stock, "Reservation rolled back"),
                Err(e) => {
                    error!(%product_id, quantity, error = %e, "Rollback release failed")
                }
            }
        }
        warn!(count = reserved.len(), "Partial reservation rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{create_mock_client, expect_action, expect_get, MockClient};
    use crate::framework::{FrameworkError, ResourceRequest};
    use crate::model::{OrderStatus, Product};
    use crate::product_actor::{ProductAction, ProductActionResult};
    use std::time::Duration;

    fn product(id: u32, price: u64) -> Product {
        Product::new(ProductId(id), format!("p{id}"), price, 10)
    }

    fn shortage(id: u32) -> FrameworkError {
        FrameworkError::EntityError(Box::new(ProductError::InsufficientStock {
            product: ProductId(id),
            requested: 5,
            available: 1,
        }))
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_touching_stock() {
        let products = MockClient::<Product>::new();
        let orders = MockClient::<Order>::new();
        let placement = OrderPlacement::new(
            ProductClient::new(products.client()),
            OrderClient::new(orders.client()),
            true,
        );

        let result = placement.place(&Requester::customer("u1"), &[], None).await;
        assert!(matches!(result, Err(ShopError::Validation(_))));

        let zero = [CartItem::new(ProductId(1), 0)];
        let result = placement.place(&Requester::customer("u1"), &zero, None).await;
        assert!(matches!(result, Err(ShopError::Validation(_))));
    }

    #[tokio::test]
    async fn failed_second_item_releases_the_first() {
        let mut products = MockClient::<Product>::new();
        products.expect_get().return_ok(Some(product(1, 100)));
        products.expect_get().return_ok(Some(product(2, 200)));
        products.expect_action().return_ok(ProductActionResult::Reserved(8));
        products.expect_action().return_err(shortage(2));
        products.expect_action().return_ok(ProductActionResult::Released(10));
        let orders = MockClient::<Order>::new();

        let placement = OrderPlacement::new(
            ProductClient::new(products.client()),
            OrderClient::new(orders.client()),
            true,
        );
        let items = [CartItem::new(ProductId(1), 2), CartItem::new(ProductId(2), 5)];
        let result = placement.place(&Requester::customer("u1"), &items, None).await;

        assert!(matches!(
            result,
            Err(ShopError::InsufficientStock { product: ProductId(2), .. })
        ));
        products.verify();
        orders.verify();
    }

    #[tokio::test]
    async fn timed_out_reservation_is_reported_not_released() {
        let (inner, mut ledger) = create_mock_client::<Product>(8);
        let products = ProductClient::new(inner.with_timeout(Duration::from_millis(50)));

        let script = tokio::spawn(async move {
            for id in [1, 2] {
                let (_, respond_to) = expect_get(&mut ledger).await.unwrap();
                let _ = respond_to.send(Ok(Some(product(id, 100))));
            }
            let (_, _, respond_to) = expect_action(&mut ledger).await.unwrap();
            let _ = respond_to.send(Ok(ProductActionResult::Reserved(9)));

            // Answers after the caller stopped waiting.
            let (_, _, late) = expect_action(&mut ledger).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = late.send(Ok(ProductActionResult::Reserved(9)));

            let mut seen = Vec::new();
            while let Some(request) = ledger.recv().await {
                if let ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } = request
                {
                    seen.push((id, action));
                    let _ = respond_to.send(Ok(ProductActionResult::Released(10)));
                }
            }
            seen
        });

        let placement = OrderPlacement::new(
            products,
            OrderClient::new(MockClient::<Order>::new().client()),
            true,
        );
        let items = [CartItem::new(ProductId(1), 1), CartItem::new(ProductId(2), 1)];
        let result = placement.place(&Requester::customer("u1"), &items, None).await;

        assert!(matches!(
            result,
            Err(ShopError::StorageUnavailable(ref msg)) if msg.contains("product_2")
        ));
        drop(placement);
        let seen = script.await.unwrap();
        assert_eq!(seen, vec![(ProductId(1), ProductAction::Release(1))]);
    }

    #[tokio::test]
    async fn without_compensation_the_reservation_stays() {
        let mut products = MockClient::<Product>::new();
        products.expect_get().return_ok(Some(product(1, 100)));
        products.expect_get().return_ok(Some(product(2, 200)));
        products.expect_action().return_ok(ProductActionResult::Reserved(8));
        products.expect_action().return_err(shortage(2));

        let placement = OrderPlacement::new(
            ProductClient::new(products.client()),
            OrderClient::new(MockClient::<Order>::new().client()),
            false,
        );
        let items = [CartItem::new(ProductId(1), 2), CartItem::new(ProductId(2), 5)];
        let result = placement.place(&Requester::customer("u1"), &items, None).await;

        assert!(result.is_err());
        products.verify();
    }

    #[tokio::test]
    async fn captured_prices_feed_the_order_total() {
        let mut products = MockClient::<Product>::new();
        products.expect_get().return_ok(Some(product(1, 1_250)));
        products.expect_action().return_ok(ProductActionResult::Reserved(8));

        let (actor, inner) = crate::order_actor::new(8);
        tokio::spawn(actor.run(()));

        let placement = OrderPlacement::new(
            ProductClient::new(products.client()),
            OrderClient::new(inner),
            true,
        );
        let order = placement
            .place(
                &Requester::customer("u1"),
                &[CartItem::new(ProductId(1), 2)],
                None,
            )
            .await
            .unwrap();

        assert_eq!(order.total_cents, 2_500);
        assert_eq!(order.line_items[0].unit_price_cents, 1_250);
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.stock_reserved);
        products.verify();
    }
}
