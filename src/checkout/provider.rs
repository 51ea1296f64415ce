//! # Payment Provider
//!
//! The seam between checkout and whoever takes the money. [`StripeProvider`] talks to the
//! real API; [`InMemoryPaymentProvider`] is deterministic and used by tests and the demo.
//!
//! [`StripeProvider`]: super::StripeProvider
//! [`InMemoryPaymentProvider`]: super::InMemoryPaymentProvider

use super::error::CheckoutError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One priced line of a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount_cents: u64,
    pub quantity: u32,
}

/// Everything needed to open a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub lines: Vec<CheckoutLine>,
    /// Percentage taken off the whole session, applied by the provider.
    pub discount_percent: Option<u8>,
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub id: String,
    pub paid: bool,
    /// What the provider actually charged, after discounts. Authoritative for order totals.
    pub amount_total_cents: u64,
    pub metadata: HashMap<String, String>,
    /// Hosted payment page, when the provider has one.
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest)
        -> Result<ProviderSession, CheckoutError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, CheckoutError>;
}
