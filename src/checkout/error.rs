//! Error types for the checkout module.

use crate::error::ShopError;
use thiserror::Error;

/// Failures talking to the payment provider or decoding what it sent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    /// The request never got a usable answer (connect error, timeout, bad body).
    #[error("Payment provider request failed: {0}")]
    Http(String),

    /// The provider answered with an error status.
    #[error("Payment provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    /// The provider's payload is missing fields we rely on.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Session metadata could not be encoded or decoded.
    #[error("Invalid session metadata: {0}")]
    Metadata(String),

    /// A webhook did not carry a valid signature for our secret.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
}

impl From<reqwest::Error> for CheckoutError {
    fn from(e: reqwest::Error) -> Self {
        CheckoutError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(e: serde_json::Error) -> Self {
        CheckoutError::Metadata(e.to_string())
    }
}

impl From<CheckoutError> for ShopError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::SessionNotFound(id) => ShopError::NotFound(format!("session {id}")),
            CheckoutError::InvalidSignature(_) => ShopError::Validation(e.to_string()),
            CheckoutError::Http(_)
            | CheckoutError::Api { .. }
            | CheckoutError::MalformedResponse(_)
            | CheckoutError::Metadata(_) => ShopError::Payment(e.to_string()),
        }
    }
}
