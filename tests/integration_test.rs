use std::sync::Arc;
use storefront::checkout::{
    InMemoryPaymentProvider, ProviderSession, SessionMetadata,
};
use storefront::lifecycle::{ShopConfig, ShopSystem};
use storefront::model::{LineItem, OrderStatus, ProductCreate, ProductId, Requester, UserId};
use storefront::services::CartItem;
use storefront::ShopError;

fn start(config: ShopConfig) -> (ShopSystem, InMemoryPaymentProvider) {
    let provider = InMemoryPaymentProvider::new();
    let system = ShopSystem::with_provider(&config, Arc::new(provider.clone()));
    (system, provider)
}

async fn product(system: &ShopSystem, price_cents: u64, stock: u32) -> ProductId {
    system
        .product_client
        .create_product(ProductCreate {
            name: format!("product at {price_cents}"),
            price_cents,
            stock,
        })
        .await
        .expect("Failed to create product")
}

async fn stock(system: &ShopSystem, id: ProductId) -> u32 {
    system
        .product_client
        .check_stock(id)
        .await
        .expect("Failed to check stock")
}

fn paid_session(id: &str, user: &str, coupon: Option<&str>) -> ProviderSession {
    let metadata = SessionMetadata::from_line_items(
        UserId::new(user),
        coupon.map(str::to_string),
        &[LineItem::new(ProductId(1), 1, 25_000)],
    );
    ProviderSession {
        id: id.to_string(),
        paid: true,
        amount_total_cents: 25_000,
        metadata: metadata.to_provider().expect("metadata encodes"),
        url: None,
    }
}

/// Stock 5: an order for 3 succeeds and leaves 2, the next order for 3 is refused.
#[tokio::test]
async fn second_order_is_refused_when_stock_runs_out() {
    let (system, _) = start(ShopConfig::default());
    let a = product(&system, 1_000, 5).await;
    let alice = Requester::customer("alice");

    let order = system
        .placement
        .place(&alice, &[CartItem::new(a, 3)], None)
        .await
        .expect("first order fits");
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(stock(&system, a).await, 2);

    let refused = system
        .placement
        .place(&alice, &[CartItem::new(a, 3)], None)
        .await;
    assert_eq!(
        refused,
        Err(ShopError::InsufficientStock {
            product: a,
            requested: 3,
            available: 2
        })
    );
    assert_eq!(stock(&system, a).await, 2);
    assert_eq!(refused.unwrap_err().status_code(), 409);

    system.shutdown().await.expect("clean shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    let (system, _) = start(ShopConfig::default());
    let a = product(&system, 1_000, 5).await;

    let mut tasks = Vec::new();
    for i in 0..2 {
        let placement = system.placement.clone();
        tasks.push(tokio::spawn(async move {
            let buyer = Requester::customer(format!("buyer{i}"));
            placement.place(&buyer, &[CartItem::new(a, 3)], None).await
        }));
    }
    let mut placed = 0;
    let mut refused = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => placed += 1,
            Err(ShopError::InsufficientStock { .. }) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((placed, refused), (1, 1));
    assert_eq!(stock(&system, a).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stock_never_goes_negative_under_load() {
    let (system, _) = start(ShopConfig::default());
    let a = product(&system, 100, 10).await;

    let mut tasks = Vec::new();
    for _ in 0..25 {
        let products = system.product_client.clone();
        tasks.push(tokio::spawn(async move { products.reserve_stock(a, 1).await }));
    }
    let mut ok = 0;
    for task in tasks {
        if task.await.expect("task panicked").is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 10);
    assert_eq!(stock(&system, a).await, 0);
}

/// Order of 2 takes stock 10 to 8; the owner's cancel brings it back to 10.
#[tokio::test]
async fn owner_cancel_restores_stock() {
    let (system, _) = start(ShopConfig::default());
    let p = product(&system, 1_500, 10).await;
    let alice = Requester::customer("alice");

    let order = system
        .placement
        .place(&alice, &[CartItem::new(p, 2)], None)
        .await
        .expect("order fits");
    assert_eq!(stock(&system, p).await, 8);

    let cancelled = system
        .lifecycle
        .cancel_own(order.id, &alice)
        .await
        .expect("owner may cancel");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock(&system, p).await, 10);

    let again = system.lifecycle.cancel_own(order.id, &alice).await;
    assert!(matches!(again, Err(ShopError::InvalidTransition { .. })));
    assert_eq!(stock(&system, p).await, 10);
}

#[tokio::test]
async fn cancelling_a_shipped_order_is_an_invalid_transition() {
    let (system, _) = start(ShopConfig::default());
    let p = product(&system, 1_500, 10).await;
    let alice = Requester::customer("alice");
    let admin = Requester::admin("root");

    let order = system
        .placement
        .place(&alice, &[CartItem::new(p, 4)], None)
        .await
        .expect("order fits");

    let shipped = system
        .lifecycle
        .transition(order.id, OrderStatus::Shipped, &admin)
        .await
        .expect("admin may skip ahead");
    assert_eq!(shipped.status, OrderStatus::Shipped);

    let result = system.lifecycle.cancel_own(order.id, &alice).await;
    assert_eq!(
        result,
        Err(ShopError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled
        })
    );
    assert_eq!(stock(&system, p).await, 6);
}

#[tokio::test]
async fn strangers_cannot_cancel() {
    let (system, _) = start(ShopConfig::default());
    let p = product(&system, 1_500, 10).await;

    let order = system
        .placement
        .place(&Requester::customer("alice"), &[CartItem::new(p, 1)], None)
        .await
        .expect("order fits");

    let result = system
        .lifecycle
        .cancel_own(order.id, &Requester::customer("mallory"))
        .await;
    assert!(matches!(result, Err(ShopError::Forbidden(_))));
    assert_eq!(result.unwrap_err().status_code(), 403);
    assert_eq!(stock(&system, p).await, 9);
}

#[tokio::test]
async fn failed_placement_rolls_back_earlier_items() {
    let (system, _) = start(ShopConfig::default());
    let a = product(&system, 1_000, 5).await;
    let b = product(&system, 2_000, 1).await;

    let result = system
        .placement
        .place(
            &Requester::customer("alice"),
            &[CartItem::new(a, 2), CartItem::new(b, 3)],
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(ShopError::InsufficientStock { product, .. }) if product == b
    ));
    assert_eq!(stock(&system, a).await, 5);
    assert_eq!(stock(&system, b).await, 1);
    assert!(system.order_client.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn without_compensation_partial_reservations_remain() {
    let config = ShopConfig {
        compensate_partial_reservations: false,
        ..ShopConfig::default()
    };
    let (system, _) = start(config);
    let a = product(&system, 1_000, 5).await;
    let b = product(&system, 2_000, 1).await;

    let result = system
        .placement
        .place(
            &Requester::customer("alice"),
            &[CartItem::new(a, 2), CartItem::new(b, 3)],
            None,
        )
        .await;

    assert!(result.is_err());
    assert_eq!(stock(&system, a).await, 3);
}

/// `sess_123` confirmed twice yields one order and the same id both times.
#[tokio::test]
async fn confirming_a_session_twice_yields_one_order() {
    let (system, provider) = start(ShopConfig::default());
    provider.insert_session(paid_session("sess_123", "alice", None));

    let first = system.reconciler.confirm("sess_123").await.expect("first confirm");
    let second = system.reconciler.confirm("sess_123").await.expect("second confirm");

    assert_eq!(first.id, second.id);
    assert_eq!(first.external_session_id.as_deref(), Some("sess_123"));
    assert_eq!(first.total_cents, 25_000);
    let orders = system
        .order_client
        .find_by_user(&UserId::new("alice"))
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirmations_agree_on_one_order() {
    let (system, provider) = start(ShopConfig::default());
    provider.insert_session(paid_session("sess_race", "alice", None));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let reconciler = system.reconciler.clone();
        tasks.push(tokio::spawn(async move {
            reconciler.confirm("sess_race").await
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.expect("task panicked").expect("confirm").id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(system.order_client.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unpaid_session_is_not_an_order() {
    let (system, provider) = start(ShopConfig::default());
    let mut session = paid_session("sess_unpaid", "alice", None);
    session.paid = false;
    provider.insert_session(session);

    let result = system.reconciler.confirm("sess_unpaid").await;
    assert_eq!(
        result,
        Err(ShopError::PaymentNotCompleted("sess_unpaid".into()))
    );
    assert_eq!(result.unwrap_err().status_code(), 400);
    assert!(system.order_client.find_all().await.unwrap().is_empty());
}

/// A big purchase earns a gift coupon; spending it discounts the next checkout and
/// reconciliation marks it used.
#[tokio::test]
async fn gift_coupon_is_earned_spent_and_deactivated() {
    let (system, provider) = start(ShopConfig::default());
    let tv = product(&system, 12_000, 5).await;
    let lamp = product(&system, 5_000, 5).await;
    let alice = Requester::customer("alice");

    let big = system
        .checkout
        .start(&alice, &[CartItem::new(tv, 2)], None)
        .await
        .expect("checkout opens");
    let gift = big.gift_coupon.expect("gift issued at 240.00");
    provider.mark_paid(&big.session_id);
    let first_order = system.reconciler.confirm(&big.session_id).await.unwrap();
    assert_eq!(first_order.total_cents, 24_000);

    let small = system
        .checkout
        .start(&alice, &[CartItem::new(lamp, 1)], Some(&gift.code))
        .await
        .expect("checkout opens");
    assert_eq!(small.discount_cents, 500);
    assert_eq!(small.total_cents, 4_500);
    assert!(small.gift_coupon.is_none());

    provider.mark_paid(&small.session_id);
    let order = system.reconciler.confirm(&small.session_id).await.unwrap();
    assert_eq!(order.total_cents, 4_500);

    let used = system
        .coupon_client
        .find_by_code(&gift.code)
        .await
        .unwrap()
        .expect("coupon kept");
    assert!(!used.active);

    let reuse = system
        .checkout
        .start(&alice, &[CartItem::new(lamp, 1)], Some(&gift.code))
        .await
        .unwrap();
    assert_eq!(reuse.discount_cents, 0);
}
