//! # Checkout
//!
//! Hosted-payment checkout in two halves:
//!
//! 1. [`CheckoutService::start`] prices the cart, applies a coupon and opens a provider
//!    session carrying the order's line items as metadata.
//! 2. [`CheckoutReconciler::confirm`] (called by the storefront after redirect, or from the
//!    `checkout.session.completed` webhook) turns the paid session into exactly one order.

pub mod error;
pub mod memory;
pub mod metadata;
pub mod provider;
pub mod reconciler;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use error::CheckoutError;
pub use memory::InMemoryPaymentProvider;
pub use metadata::{MetadataProduct, SessionMetadata};
pub use provider::{CheckoutLine, CheckoutRequest, PaymentProvider, ProviderSession};
pub use reconciler::{CheckoutReconciler, WebhookOutcome};
pub use service::{CheckoutService, CheckoutStarted, CheckoutUrls, GiftPolicy};
pub use stripe::StripeProvider;
pub use webhook::{parse_event, sign_payload, verify_webhook_signature, WebhookEvent};
