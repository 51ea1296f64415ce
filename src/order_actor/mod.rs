//! # Order Actor (order store)
//!
//! Persists orders and answers queries over them. It does not judge whether a status change
//! is legal; that is [`OrderLifecycleManager`](crate::services::OrderLifecycleManager)'s job.

pub mod entity;
pub mod error;

pub use error::*;

use crate::framework::{ResourceActor, ResourceClient};
use crate::model::Order;

/// Creates a new Order actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, ResourceClient<Order>) {
    ResourceActor::new(buffer_size)
}
