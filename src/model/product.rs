//! A catalog product as far as the order core cares: its price and stock count.
//!
//! Only the inventory ledger (the product actor) writes `stock`.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u32);

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "product_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price_cents: u64,
    pub stock: u32,
}

impl Product {
    /// Creates a new Product instance.
    ///
    /// # Arguments
    /// * `id` - Unique identifier (set by the actor system)
    /// * `name` - Display name
    /// * `price_cents` - Unit price in minor units
    /// * `stock` - Units available for reservation
    pub fn new(id: ProductId, name: impl Into<String>, price_cents: u64, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price_cents,
            stock,
        }
    }
}

/// Payload for adding a product to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price_cents: u64,
    pub stock: u32,
}

/// Catalog edits. Stock is deliberately absent: it only moves through reserve/release.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price_cents: Option<u64>,
}
