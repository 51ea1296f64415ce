//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG` (default `info`). Module paths are hidden; actor events carry an
//! `entity_type` field (`Product`, `Order`, `Coupon`) instead.
//!
//! ```bash
//! # Placement, reconciliation and status changes
//! RUST_LOG=info cargo run
//!
//! # Every actor request with its payload
//! RUST_LOG=debug cargo run
//!
//! # Only the checkout module
//! RUST_LOG=storefront::checkout=debug cargo run
//! ```
//!
//! A placed-then-cancelled order at `info` looks like:
//!
//! ```text
//! INFO Action ok entity_type="Product" id=product_1
//! INFO Created entity_type="Order" id=order_1 size=1
//! INFO place: Order placed order_id=order_1 total_cents=2500
//! INFO Updated entity_type="Order" id=order_1
//! INFO Action ok entity_type="Product" id=product_1
//! INFO cancel_own: Status changed order_id=order_1 from=PROCESSING to=CANCELLED
//! ```
//!
//! Failures worth an operator's attention (a rollback release that failed, a partial
//! reservation left in place with compensation off) are logged at `error`.

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
