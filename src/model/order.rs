//! A customer order.
//!
//! Line items are fixed at creation. Afterwards only `status` and the fields derived from
//! it (`stock_reserved`, `updated_at`) change, and only through the order actor.

use crate::model::{ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u32);

impl From<u32> for OrderId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order_{}", self.0)
    }
}

/// One product + quantity + captured unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price_cents: u64,
}

impl LineItem {
    pub fn new(product_id: ProductId, quantity: u32, unit_price_cents: u64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price_cents,
        }
    }

    /// `quantity * unit price`, or `None` on overflow.
    pub fn subtotal_cents(&self) -> Option<u64> {
        self.unit_price_cents.checked_mul(u64::from(self.quantity))
    }
}

/// Sum of line subtotals, or `None` on overflow.
pub fn total_cents(items: &[LineItem]) -> Option<u64> {
    items
        .iter()
        .try_fold(0u64, |acc, item| acc.checked_add(item.subtotal_cents()?))
}

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Approved,
    OnShipping,
    Shipped,
    Completed,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Processing,
        OrderStatus::Approved,
        OrderStatus::OnShipping,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::OnShipping => "ON_SHIPPING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
        }
    }

    /// The regular forward flow. Admins may step outside it; owners never can.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Processing, Approved)
                | (Processing, Cancelled)
                | (Approved, OnShipping)
                | (OnShipping, Shipped)
                | (Shipped, Completed)
                | (Completed, Returned)
        )
    }

    /// No transition is defined out of this state.
    pub fn is_terminal(&self) -> bool {
        *self == OrderStatus::Cancelled
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status: {0}")]
pub struct InvalidStatus(pub String);

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub line_items: Vec<LineItem>,
    pub total_cents: u64,
    pub external_session_id: Option<String>,
    pub status: OrderStatus,
    /// Whether line item quantities are currently held out of product stock.
    pub stock_reserved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user_id == user
    }
}

/// Payload for persisting a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreate {
    pub user_id: UserId,
    pub line_items: Vec<LineItem>,
    pub total_cents: u64,
    pub external_session_id: Option<String>,
    pub status: OrderStatus,
    pub stock_reserved: bool,
}

impl OrderCreate {
    /// A PROCESSING order for `items` with the total computed from them.
    ///
    /// Returns `None` if the total overflows.
    pub fn from_items(user_id: UserId, line_items: Vec<LineItem>) -> Option<Self> {
        let total_cents = total_cents(&line_items)?;
        Some(Self {
            user_id,
            line_items,
            total_cents,
            external_session_id: None,
            status: OrderStatus::Processing,
            stock_reserved: false,
        })
    }
}

/// Changes the order actor accepts after creation.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderUpdate {
    /// Moves the order to `status` if it is still in `expected_status`. Entering CANCELLED
    /// clears `stock_reserved`; no other status sets it again.
    Status {
        expected_status: OrderStatus,
        status: OrderStatus,
    },
    /// Clears `stock_reserved`, but only if it is set and the order is still in
    /// `expected_status`. Whoever wins this claim is the one caller that releases the stock.
    ClaimReservation { expected_status: OrderStatus },
}
