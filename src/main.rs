use std::sync::Arc;
use storefront::checkout::InMemoryPaymentProvider;
use storefront::lifecycle::{setup_tracing, ShopConfig, ShopSystem};
use storefront::model::{ProductCreate, ProductUpdate, Requester};
use storefront::services::CartItem;
use storefront::ShopError;
use tracing::{info, info_span, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    let config = ShopConfig::from_env();

    let provider = InMemoryPaymentProvider::new();
    let system = ShopSystem::with_provider(&config, Arc::new(provider.clone()));
    let alice = Requester::customer("alice");

    let (lamp, tv) = async {
        let lamp = system
            .product_client
            .create_product(ProductCreate {
                name: "Desk Lamp".into(),
                price_cents: 2_500,
                stock: 10,
            })
            .await?;
        let tv = system
            .product_client
            .create_product(ProductCreate {
                name: "Television".into(),
                price_cents: 12_000,
                stock: 3,
            })
            .await?;
        Ok::<_, ShopError>((lamp, tv))
    }
    .instrument(info_span!("seed_catalog"))
    .await?;

    async {
        let order = system
            .placement
            .place(&alice, &[CartItem::new(lamp, 2)], None)
            .await?;
        let stock = system.product_client.check_stock(lamp).await?;
        info!(stock, "After placement");

        let repriced = system
            .product_client
            .update_product(
                lamp,
                ProductUpdate {
                    price_cents: Some(2_900),
                    ..ProductUpdate::default()
                },
            )
            .await?;
        let placed = system.order_client.find_by_id(order.id).await?;
        info!(
            catalog_cents = repriced.price_cents,
            order_total_cents = placed.total_cents,
            "Repricing leaves placed orders alone"
        );

        system.lifecycle.cancel_own(order.id, &alice).await?;
        let stock = system.product_client.check_stock(lamp).await?;
        info!(stock, "After cancellation");

        let refused = system
            .placement
            .place(&alice, &[CartItem::new(lamp, 1), CartItem::new(tv, 5)], None)
            .await;
        if let Err(e) = refused {
            info!(error = %e, status = e.status_code(), "Order refused");
        }
        let stock = system.product_client.check_stock(lamp).await?;
        info!(stock, "Lamp stock untouched");
        Ok::<_, ShopError>(())
    }
    .instrument(info_span!("order_processing"))
    .await?;

    async {
        let started = system
            .checkout
            .start(&alice, &[CartItem::new(tv, 2)], None)
            .await?;
        if let Some(gift) = &started.gift_coupon {
            info!(code = %gift.code, "Gift coupon earned");
        }

        if let Err(e) = system.reconciler.confirm(&started.session_id).await {
            info!(error = %e, "Confirmation before payment refused");
        }
        provider.mark_paid(&started.session_id);

        let first = system.reconciler.confirm(&started.session_id).await?;
        let second = system.reconciler.confirm(&started.session_id).await?;
        info!(
            first = %first.id,
            second = %second.id,
            total_cents = first.total_cents,
            "Session confirmed twice"
        );
        Ok::<_, ShopError>(())
    }
    .instrument(info_span!("checkout"))
    .await?;

    system.shutdown().await?;
    Ok(())
}
