//! # Boundary Errors
//!
//! [`ShopError`] is what services hand to the (external) HTTP layer. Actor-level errors are
//! folded into it here; raw storage and channel failures become `StorageUnavailable` and
//! never leak further. `DuplicateSession` has no variant: the reconciler consumes it.

use crate::coupon_actor::CouponError;
use crate::model::{OrderStatus, ProductId};
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShopError {
    /// Bad input shape. The caller must fix the request.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u32,
        available: u32,
    },

    /// The payment session exists but has not been paid.
    #[error("Payment not completed for session {0}")]
    PaymentNotCompleted(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A store did not answer. Safe to retry with backoff.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The payment provider failed or returned something unusable.
    #[error("Payment provider error: {0}")]
    Payment(String),
}

impl ShopError {
    /// HTTP status the routing layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Validation(_)
            | ShopError::PaymentNotCompleted(_)
            | ShopError::InvalidTransition { .. } => 400,
            ShopError::Forbidden(_) => 403,
            ShopError::NotFound(_) => 404,
            ShopError::InsufficientStock { .. } | ShopError::Conflict(_) => 409,
            ShopError::StorageUnavailable(_) | ShopError::Payment(_) => 500,
        }
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::StorageUnavailable(_) | ShopError::Payment(_)
        )
    }
}

impl From<ProductError> for ShopError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(id) => ShopError::NotFound(format!("product {id}")),
            ProductError::InsufficientStock {
                product,
                requested,
                available,
            } => ShopError::InsufficientStock {
                product,
                requested,
                available,
            },
            ProductError::InvalidQuantity(_) | ProductError::ValidationError(_) => {
                ShopError::Validation(e.to_string())
            }
            ProductError::StockOverflow { .. } => ShopError::Conflict(e.to_string()),
            ProductError::Unavailable(_) | ProductError::ActorCommunicationError(_) => {
                ShopError::StorageUnavailable(e.to_string())
            }
        }
    }
}

impl From<OrderError> for ShopError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => ShopError::NotFound(format!("order {id}")),
            OrderError::ValidationError(msg) => ShopError::Validation(msg),
            OrderError::DuplicateSession(session) => {
                ShopError::Conflict(format!("session {session} already has an order"))
            }
            OrderError::StaleState(_) => ShopError::Conflict(e.to_string()),
            OrderError::Unavailable(_) | OrderError::ActorCommunicationError(_) => {
                ShopError::StorageUnavailable(e.to_string())
            }
        }
    }
}

impl From<CouponError> for ShopError {
    fn from(e: CouponError) -> Self {
        match e {
            CouponError::NotFound(code) => ShopError::NotFound(format!("coupon {code}")),
            CouponError::Expired(_) | CouponError::ValidationError(_) => {
                ShopError::Validation(e.to_string())
            }
            CouponError::CodeCollision(_) => ShopError::Conflict(e.to_string()),
            CouponError::Unavailable(_) | CouponError::ActorCommunicationError(_) => {
                ShopError::StorageUnavailable(e.to_string())
            }
        }
    }
}
