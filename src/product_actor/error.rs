//! Error types for the Product actor.

use crate::framework::FrameworkError;
use crate::model::ProductId;
use thiserror::Error;

/// Errors that can occur during product and stock operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    /// The requested product was not found.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The requested quantity exceeds the available stock.
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u32,
        available: u32,
    },

    /// Zero-quantity reservations and releases are rejected.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// A release would push stock past `u32::MAX`.
    #[error("Stock overflow for {product}: {stock} + {released}")]
    StockOverflow {
        product: ProductId,
        stock: u32,
        released: u32,
    },

    /// The product payload is invalid.
    #[error("Product validation error: {0}")]
    ValidationError(String),

    /// The product actor did not answer (closed, dropped or timed out).
    #[error("Product store unavailable: {0}")]
    Unavailable(String),

    /// Any other failure communicating with the actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for ProductError {
    fn from(e: FrameworkError) -> Self {
        match e.downcast::<ProductError>() {
            Ok(own) => own,
            Err(FrameworkError::NotFound(id)) => ProductError::NotFound(id),
            Err(e) if e.is_unavailable() => ProductError::Unavailable(e.to_string()),
            Err(e) => ProductError::ActorCommunicationError(e.to_string()),
        }
    }
}
