//! Runtime orchestration: configuration, tracing setup, and the actor system itself.
//!
//! # Main Components
//!
//! - [`ShopConfig`] - settings read from the environment
//! - [`ShopSystem`] - starts, wires and shuts down the actors and services
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod config;
pub mod shop_system;
pub mod tracing;

pub use self::config::*;
pub use self::shop_system::*;
pub use self::tracing::*;
