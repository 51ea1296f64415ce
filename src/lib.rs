//! # Storefront Order Core
//!
//! > **Stock, orders and checkout that stay consistent under concurrent requests.**
//!
//! The crate keeps three invariants of an online shop:
//!
//! - product stock never goes negative, however many orders race for it;
//! - a paid checkout session turns into exactly one order, however often it is confirmed;
//! - cancelling an order gives back exactly the stock it held, once.
//!
//! ## 🏗️ Design
//!
//! Every resource type (products, orders, coupons) is owned by one
//! [`ResourceActor`](framework::ResourceActor) running in its own Tokio task. An actor
//! processes one message at a time, so anything that happens inside a single handler is
//! atomic:
//!
//! - **Reserve** checks and decrements stock in one `Action` on the product actor.
//! - **Order create** checks the session-id index and inserts in one `Create` on the order
//!   actor; the loser of a race gets `DuplicateSession` and reads the winner's order.
//! - **Cancel** claims the order's `stock_reserved` flag in one `Update` before releasing.
//!
//! Flows that span several resources (placing a multi-item order, cancelling, reconciling a
//! payment) live in [`services`] and [`checkout`] and only talk to actors through their
//! clients.
//!
//! ### Error Handling
//! Each actor has its own `thiserror` enum (`ProductError`, `OrderError`, `CouponError`).
//! Entity errors cross the actor boundary boxed in
//! [`FrameworkError`](framework::FrameworkError) and are downcast back by the clients.
//! Services return [`ShopError`], which knows its HTTP status and whether it is retryable.
//!
//! ### Observability
//! `tracing` everywhere: actors log with an `entity_type` field, client methods are
//! `#[instrument]`ed. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! - [`framework`]: the generic actor, its client, and the mock utilities for tests.
//! - [`model`]: products, orders, coupons, ids and the order status machine.
//! - [`product_actor`], [`order_actor`], [`coupon_actor`]: the `ActorEntity` impls.
//! - [`clients`]: typed wrappers such as [`ProductClient::reserve_stock`](clients::ProductClient::reserve_stock).
//! - [`services`]: [`OrderPlacement`](services::OrderPlacement) and
//!   [`OrderLifecycleManager`](services::OrderLifecycleManager).
//! - [`checkout`]: payment providers, session creation, reconciliation and webhooks.
//! - [`lifecycle`]: [`ShopConfig`](lifecycle::ShopConfig), [`ShopSystem`](lifecycle::ShopSystem)
//!   and tracing setup.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Demo with the in-memory payment provider
//! RUST_LOG=info cargo run
//!
//! cargo test
//! ```

pub mod checkout;
pub mod clients;
pub mod coupon_actor;
pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod product_actor;
pub mod services;

pub use error::ShopError;
