//! # Checkout Sessions
//!
//! Prices a cart from the catalog, applies the user's coupon and opens a payment session
//! whose metadata records exactly what was sold. Stock is not reserved here; a checkout
//! order is created only once the payment is confirmed.

use super::metadata::SessionMetadata;
use super::provider::{CheckoutLine, CheckoutRequest, PaymentProvider};
use crate::clients::{CouponClient, ProductClient};
use crate::coupon_actor::CouponError;
use crate::error::ShopError;
use crate::model::{total_cents, Coupon, LineItem, Requester};
use crate::services::placement::validate_cart;
use crate::services::CartItem;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// When a purchase earns a gift coupon, and what the coupon is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiftPolicy {
    /// Charged total (after discount) at or above which a gift is issued.
    pub threshold_cents: u64,
    pub discount_percent: u8,
    pub valid_for: Duration,
}

impl Default for GiftPolicy {
    fn default() -> Self {
        Self {
            threshold_cents: 20_000,
            discount_percent: 10,
            valid_for: Duration::days(30),
        }
    }
}

/// Where the hosted checkout sends the shopper afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// Storefront routes under `client_url`. The provider fills in `{CHECKOUT_SESSION_ID}`.
    pub fn for_client(client_url: &str) -> Self {
        let base = client_url.trim_end_matches('/');
        Self {
            success_url: format!("{base}/purchase-success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base}/purchase-cancel"),
        }
    }
}

/// What the storefront needs to send the shopper to the payment page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutStarted {
    pub session_id: String,
    pub url: Option<String>,
    /// Amount to be charged, after any discount.
    pub total_cents: u64,
    pub discount_cents: u64,
    pub gift_coupon: Option<Coupon>,
}

#[derive(Clone)]
pub struct CheckoutService {
    products: ProductClient,
    coupons: CouponClient,
    provider: Arc<dyn PaymentProvider>,
    gift: GiftPolicy,
    urls: CheckoutUrls,
}

impl CheckoutService {
    pub fn new(
        products: ProductClient,
        coupons: CouponClient,
        provider: Arc<dyn PaymentProvider>,
        gift: GiftPolicy,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            products,
            coupons,
            provider,
            gift,
            urls,
        }
    }

    /// Opens a payment session for `items`.
    ///
    /// A coupon code that is unknown, inactive, expired or someone else's is ignored: the
    /// session is opened at full price.
    #[instrument(skip(self, items), fields(user_id = %requester.user_id, items = items.len()))]
    pub async fn start(
        &self,
        requester: &Requester,
        items: &[CartItem],
        coupon_code: Option<&str>,
    ) -> Result<CheckoutStarted, ShopError> {
        validate_cart(items)?;

        let mut line_items = Vec::with_capacity(items.len());
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self.products.find(item.product_id).await?;
            line_items.push(LineItem::new(
                item.product_id,
                item.quantity,
                product.price_cents,
            ));
            lines.push(CheckoutLine {
                name: product.name,
                unit_amount_cents: product.price_cents,
                quantity: item.quantity,
            });
        }
        let gross = total_cents(&line_items)
            .ok_or_else(|| ShopError::Validation("order total overflows".into()))?;

        let coupon = match coupon_code.filter(|code| !code.is_empty()) {
            Some(code) => match self
                .coupons
                .validate(&requester.user_id, code, Utc::now())
                .await
            {
                Ok(coupon) => Some(coupon),
                Err(e @ (CouponError::NotFound(_) | CouponError::Expired(_))) => {
                    warn!(%code, reason = %e, "Coupon not applicable, charging full price");
                    None
                }
                Err(e) => return Err(e.into()),
            },
            None => None,
        };
        let discount_cents = coupon.as_ref().map_or(0, |c| c.discount_on(gross));
        let total = gross - discount_cents;

        let metadata = SessionMetadata::from_line_items(
            requester.user_id.clone(),
            coupon.as_ref().map(|c| c.code.clone()),
            &line_items,
        );
        let request = CheckoutRequest {
            lines,
            discount_percent: coupon.as_ref().map(|c| c.discount_percent),
            metadata: metadata.to_provider()?,
            success_url: self.urls.success_url.clone(),
            cancel_url: self.urls.cancel_url.clone(),
        };
        let session = self.provider.create_session(request).await?;
        info!(session_id = %session.id, total_cents = total, discount_cents, "Checkout session opened");

        let gift_coupon = if total >= self.gift.threshold_cents {
            match self
                .coupons
                .issue_gift(
                    &requester.user_id,
                    self.gift.discount_percent,
                    self.gift.valid_for,
                )
                .await
            {
                Ok(gift) => Some(gift),
                Err(e) => {
                    error!(error = %e, "Gift coupon could not be issued");
                    None
                }
            }
        } else {
            None
        };

        Ok(CheckoutStarted {
            session_id: session.id,
            url: session.url,
            total_cents: total,
            discount_cents,
            gift_coupon,
        })
    }
}
