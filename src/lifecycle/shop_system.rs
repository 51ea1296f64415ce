use crate::checkout::{
    CheckoutReconciler, CheckoutService, InMemoryPaymentProvider, PaymentProvider, StripeProvider,
};
use crate::clients::{CouponClient, OrderClient, ProductClient};
use crate::error::ShopError;
use crate::lifecycle::ShopConfig;
use crate::services::{OrderLifecycleManager, OrderPlacement};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The running order core: one actor per resource plus the services wired on top.
///
/// # Architecture
///
/// - **Product actor**: the inventory ledger
/// - **Order actor**: the order store, unique on session id
/// - **Coupon actor**: per-user discount coupons
///
/// None of the actors depend on each other; cross-resource flows live in the services.
///
/// # Example
///
/// ```ignore
/// let system = ShopSystem::new(&ShopConfig::from_env())?;
/// let order = system.placement.place(&requester, &cart, None).await?;
/// system.lifecycle.cancel_own(order.id, &requester).await?;
/// system.shutdown().await?;
/// ```
pub struct ShopSystem {
    pub product_client: ProductClient,
    pub order_client: OrderClient,
    pub coupon_client: CouponClient,
    pub placement: OrderPlacement,
    pub lifecycle: OrderLifecycleManager,
    pub checkout: CheckoutService,
    pub reconciler: CheckoutReconciler,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ShopSystem {
    /// Starts the system with Stripe when a secret key is configured, otherwise with the
    /// in-memory provider.
    pub fn new(config: &ShopConfig) -> Result<Self, ShopError> {
        let provider: Arc<dyn PaymentProvider> = match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeProvider::new(key.clone(), config.request_timeout)?),
            None => {
                warn!("STRIPE_SECRET_KEY not set, using the in-memory payment provider");
                Arc::new(InMemoryPaymentProvider::new())
            }
        };
        Ok(Self::with_provider(config, provider))
    }

    /// Spawns the actors and wires the services around `provider`.
    pub fn with_provider(config: &ShopConfig, provider: Arc<dyn PaymentProvider>) -> Self {
        let (product_actor, product_inner) = crate::product_actor::new(config.channel_buffer);
        let (order_actor, order_inner) = crate::order_actor::new(config.channel_buffer);
        let (coupon_actor, coupon_inner) = crate::coupon_actor::new(config.channel_buffer);

        let handles = vec![
            tokio::spawn(product_actor.run(())),
            tokio::spawn(order_actor.run(())),
            tokio::spawn(coupon_actor.run(())),
        ];

        let product_client = ProductClient::new(product_inner.with_timeout(config.request_timeout));
        let order_client = OrderClient::new(order_inner.with_timeout(config.request_timeout));
        let coupon_client = CouponClient::new(coupon_inner.with_timeout(config.request_timeout));

        let placement = OrderPlacement::new(
            product_client.clone(),
            order_client.clone(),
            config.compensate_partial_reservations,
        );
        let lifecycle = OrderLifecycleManager::new(order_client.clone(), product_client.clone());
        let checkout = CheckoutService::new(
            product_client.clone(),
            coupon_client.clone(),
            provider.clone(),
            config.gift,
            config.checkout_urls(),
        );
        let reconciler = CheckoutReconciler::new(
            order_client.clone(),
            coupon_client.clone(),
            provider,
            config.stripe_webhook_secret.clone(),
        );

        info!(
            channel_buffer = config.channel_buffer,
            timeout_ms = config.request_timeout.as_millis() as u64,
            compensate = config.compensate_partial_reservations,
            "Shop system started"
        );

        Self {
            product_client,
            order_client,
            coupon_client,
            placement,
            lifecycle,
            checkout,
            reconciler,
            handles,
        }
    }

    /// Drops every client this system owns and waits for the actors to drain.
    ///
    /// Clones of clients or services handed out earlier keep their actor alive; drop them
    /// first or this waits for them.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let Self {
            product_client,
            order_client,
            coupon_client,
            placement,
            lifecycle,
            checkout,
            reconciler,
            handles,
        } = self;
        drop((
            product_client,
            order_client,
            coupon_client,
            placement,
            lifecycle,
            checkout,
            reconciler,
        ));

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {e:?}"));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
