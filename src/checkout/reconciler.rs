//! # Checkout Reconciler
//!
//! Turns a paid payment session into exactly one order.
//!
//! Idempotency comes from the order store's unique index on the session id rather than from
//! a lock: look the session's order up, create it if missing, and if the create loses a race
//! to a concurrent confirmation (`DuplicateSession`) read back the winner's order. Every
//! caller for the same session therefore gets the same order.
//!
//! Line items come from the session metadata recorded when the session was opened and the
//! total from the provider's charged amount. Nothing the client sends at confirmation time
//! is trusted.

use super::metadata::SessionMetadata;
use super::provider::{PaymentProvider, ProviderSession};
use super::webhook::{parse_event, verify_webhook_signature, CHECKOUT_SESSION_COMPLETED};
use crate::clients::{CouponClient, OrderClient};
use crate::error::ShopError;
use crate::model::{Order, OrderCreate, OrderStatus};
use crate::order_actor::OrderError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What a webhook delivery led to.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Reconciled(Order),
    /// Event type we do not act on. Acknowledge it so the provider stops retrying.
    Ignored(String),
}

#[derive(Clone)]
pub struct CheckoutReconciler {
    orders: OrderClient,
    coupons: CouponClient,
    provider: Arc<dyn PaymentProvider>,
    webhook_secret: Option<String>,
}

impl CheckoutReconciler {
    pub fn new(
        orders: OrderClient,
        coupons: CouponClient,
        provider: Arc<dyn PaymentProvider>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            orders,
            coupons,
            provider,
            webhook_secret,
        }
    }

    /// Returns the order for `session_id`, creating it on first confirmation.
    ///
    /// # Errors
    /// `PaymentNotCompleted` while the session is unpaid; no order is created.
    #[instrument(skip(self))]
    pub async fn confirm(&self, session_id: &str) -> Result<Order, ShopError> {
        if session_id.trim().is_empty() {
            return Err(ShopError::Validation("missing session id".into()));
        }

        let session = self.provider.retrieve_session(session_id).await?;
        if !session.paid {
            info!("Session not paid yet");
            return Err(ShopError::PaymentNotCompleted(session.id));
        }

        if let Some(order) = self.orders.find_by_session_id(&session.id).await? {
            debug!(order_id = %order.id, "Session already reconciled");
            match SessionMetadata::from_provider(&session.metadata) {
                Ok(metadata) => self.redeem_coupon(&metadata).await?,
                Err(e) => warn!(error = %e, "Metadata unreadable, coupon left as is"),
            }
            return Ok(order);
        }

        let metadata = SessionMetadata::from_provider(&session.metadata)?;
        let order = self.create_or_fetch(&session, &metadata).await?;
        self.redeem_coupon(&metadata).await?;
        Ok(order)
    }

    async fn create_or_fetch(
        &self,
        session: &ProviderSession,
        metadata: &SessionMetadata,
    ) -> Result<Order, ShopError> {
        let params = OrderCreate {
            user_id: metadata.user_id.clone(),
            line_items: metadata.line_items(),
            total_cents: session.amount_total_cents,
            external_session_id: Some(session.id.clone()),
            status: OrderStatus::Processing,
            stock_reserved: false,
        };

        match self.orders.create(params).await {
            Ok(order) => {
                info!(order_id = %order.id, total_cents = order.total_cents, "Order created from session");
                Ok(order)
            }
            Err(OrderError::DuplicateSession(_)) => {
                debug!("Lost the create race, reading the winner's order");
                self.orders
                    .find_by_session_id(&session.id)
                    .await?
                    .ok_or_else(|| {
                        ShopError::Conflict(format!(
                            "session {} reported as duplicate but has no order",
                            session.id
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn redeem_coupon(&self, metadata: &SessionMetadata) -> Result<(), ShopError> {
        if let Some(code) = &metadata.coupon_code {
            let flipped = self.coupons.deactivate(code, &metadata.user_id).await?;
            debug!(%code, flipped, "Coupon redeemed");
        }
        Ok(())
    }

    /// Verifies and dispatches a provider webhook.
    ///
    /// `checkout.session.completed` reconciles the session; other event types are ignored.
    #[instrument(skip(self, payload, signature_header))]
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, ShopError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| ShopError::Payment("webhook secret is not configured".into()))?;
        verify_webhook_signature(payload, signature_header, secret, now)?;

        let event = parse_event(payload)?;
        if event.event_type != CHECKOUT_SESSION_COMPLETED {
            debug!(event_type = %event.event_type, "Webhook ignored");
            return Ok(WebhookOutcome::Ignored(event.event_type));
        }
        let session_id = event
            .object_id
            .ok_or_else(|| ShopError::Validation("webhook event without session id".into()))?;
        let order = self.confirm(&session_id).await?;
        Ok(WebhookOutcome::Reconciled(order))
    }
}
