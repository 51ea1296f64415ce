//! # Product Actor (inventory ledger)
//!
//! Owns every product's `stock` count. Stock only moves through two actions:
//!
//! - [`ProductAction::Reserve`]: atomic check-and-decrement, fails with
//!   [`ProductError::InsufficientStock`] and never drives stock negative.
//! - [`ProductAction::Release`]: unconditional increment, used on cancellation.
//!
//! Reservations for a multi-item order are separate messages. All-or-nothing behaviour
//! across items is the job of [`OrderPlacement`](crate::services::OrderPlacement).

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::Product;
use crate::framework::{ResourceActor, ResourceClient};

/// Creates a new Product actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Product>, ResourceClient<Product>) {
    ResourceActor::new(buffer_size)
}
