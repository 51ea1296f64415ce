//! Custom actions for the Coupon actor.

/// Operations on one coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponAction {
    /// Marks the coupon inactive. Deactivating an inactive coupon is not an error.
    Deactivate,
}

/// Results from CouponActions - variants match 1:1 with CouponAction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponActionResult {
    /// `true` if this call flipped the coupon from active to inactive.
    Deactivated(bool),
}
