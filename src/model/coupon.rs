use crate::model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Coupons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CouponId(pub u32);

impl From<u32> for CouponId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for CouponId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "coupon_{}", self.0)
    }
}

/// A single-use percentage discount bound to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub user_id: UserId,
    pub discount_percent: u8,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

impl Coupon {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Discount on `amount_cents`, rounded half away from zero.
    pub fn discount_on(&self, amount_cents: u64) -> u64 {
        let scaled = u128::from(amount_cents) * u128::from(self.discount_percent);
        let rounded = (scaled + 50) / 100;
        u64::try_from(rounded).unwrap_or(u64::MAX).min(amount_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponCreate {
    pub code: String,
    pub user_id: UserId,
    pub discount_percent: u8,
    pub expires_at: DateTime<Utc>,
}
