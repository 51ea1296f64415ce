//! Order-level services built on top of the actor clients.
//!
//! - [`OrderPlacement`]: cart to order, with all-or-nothing stock reservation.
//! - [`OrderLifecycleManager`]: authorised status changes and stock release on cancel.

pub mod lifecycle_manager;
pub mod placement;

pub use lifecycle_manager::*;
pub use placement::*;
