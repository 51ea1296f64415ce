//! # Coupon Actor
//!
//! Stores per-user discount coupons keyed by code. Coupons are single use: checkout
//! reconciliation deactivates the one it redeemed.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::framework::{ResourceActor, ResourceClient};
use crate::model::Coupon;

/// Creates a new Coupon actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Coupon>, ResourceClient<Coupon>) {
    ResourceActor::new(buffer_size)
}
