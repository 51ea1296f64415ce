//! Pure data structures: the entities owned by the resource actors and the payloads used to
//! create and change them.
//!
//! Money is carried as integer minor units (cents) everywhere, matching the payment
//! provider's `amount_total`.

pub mod coupon;
pub mod order;
pub mod product;
pub mod user;

pub use coupon::*;
pub use order::*;
pub use product::*;
pub use user::*;
