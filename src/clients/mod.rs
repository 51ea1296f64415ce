//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient).
//!
//! Each client maps [`FrameworkError`](crate::framework::FrameworkError) back into its
//! actor's own error enum, so callers match on `ProductError::InsufficientStock` rather than
//! on boxed errors.

pub mod coupon_client;
pub mod order_client;
pub mod product_client;

pub use coupon_client::*;
pub use order_client::*;
pub use product_client::*;
