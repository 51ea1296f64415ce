//! Order data carried through the payment provider.
//!
//! The session's metadata is the only record of what was bought when a payment is later
//! confirmed, so it captures product, quantity and unit price at session creation. Products
//! travel as a JSON string under `products`, since provider metadata values are flat strings.

use super::error::CheckoutError;
use crate::model::{LineItem, ProductId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const USER_ID: &str = "userId";
const COUPON_CODE: &str = "couponCode";
const PRODUCTS: &str = "products";

/// One purchased product. `price` is the unit price in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataProduct {
    pub id: ProductId,
    pub quantity: u32,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub user_id: UserId,
    pub coupon_code: Option<String>,
    pub products: Vec<MetadataProduct>,
}

impl SessionMetadata {
    pub fn from_line_items(
        user_id: UserId,
        coupon_code: Option<String>,
        items: &[LineItem],
    ) -> Self {
        let products = items
            .iter()
            .map(|item| MetadataProduct {
                id: item.product_id,
                quantity: item.quantity,
                price: item.unit_price_cents,
            })
            .collect();
        Self {
            user_id,
            coupon_code,
            products,
        }
    }

    pub fn to_provider(&self) -> Result<HashMap<String, String>, CheckoutError> {
        let mut map = HashMap::new();
        map.insert(USER_ID.to_string(), self.user_id.to_string());
        map.insert(
            COUPON_CODE.to_string(),
            self.coupon_code.clone().unwrap_or_default(),
        );
        map.insert(PRODUCTS.to_string(), serde_json::to_string(&self.products)?);
        Ok(map)
    }

    pub fn from_provider(map: &HashMap<String, String>) -> Result<Self, CheckoutError> {
        let user_id = map
            .get(USER_ID)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CheckoutError::Metadata(format!("missing {USER_ID}")))?;
        let products_json = map
            .get(PRODUCTS)
            .ok_or_else(|| CheckoutError::Metadata(format!("missing {PRODUCTS}")))?;
        let products: Vec<MetadataProduct> = serde_json::from_str(products_json)?;
        let coupon_code = map.get(COUPON_CODE).filter(|c| !c.is_empty()).cloned();

        Ok(Self {
            user_id: UserId::new(user_id.as_str()),
            coupon_code,
            products,
        })
    }

    pub fn line_items(&self) -> Vec<LineItem> {
        self.products
            .iter()
            .map(|p| LineItem::new(p.id, p.quantity, p.price))
            .collect()
    }
}
