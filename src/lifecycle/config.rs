//! # Configuration
//!
//! Settings come from the process environment, optionally seeded from a `.env` file.
//! Every numeric setting has a default; a value that does not parse falls back to it with
//! a warning rather than refusing to start.
//!
//! | Variable | Default |
//! |---|---|
//! | `SHOP_CHANNEL_BUFFER` | 32 |
//! | `SHOP_REQUEST_TIMEOUT_MS` | 5000 |
//! | `SHOP_COMPENSATE_RESERVATIONS` | true |
//! | `SHOP_GIFT_THRESHOLD_CENTS` | 20000 |
//! | `SHOP_GIFT_DISCOUNT_PERCENT` | 10 |
//! | `SHOP_GIFT_VALID_DAYS` | 30 |
//! | `STRIPE_SECRET_KEY` | unset |
//! | `STRIPE_WEBHOOK_SECRET` | unset |
//! | `CLIENT_URL` | `http://localhost:5173` |

use crate::checkout::{CheckoutUrls, GiftPolicy};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CHANNEL_BUFFER: usize = 32;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";

#[derive(Clone, Debug, PartialEq)]
pub struct ShopConfig {
    /// Capacity of each actor's request channel.
    pub channel_buffer: usize,
    /// Bound on every actor round trip and every payment provider request.
    pub request_timeout: Duration,
    /// Undo earlier reservations when a later line item of the same order fails.
    pub compensate_partial_reservations: bool,
    pub gift: GiftPolicy,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub client_url: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            compensate_partial_reservations: true,
            gift: GiftPolicy::default(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            client_url: DEFAULT_CLIENT_URL.to_string(),
        }
    }
}

impl ShopConfig {
    /// Loads `.env` if present, then reads the environment.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, ".env could not be read");
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let gift_days: i64 = parse_or(&lookup, "SHOP_GIFT_VALID_DAYS", 30);

        Self {
            channel_buffer: parse_or(&lookup, "SHOP_CHANNEL_BUFFER", defaults.channel_buffer)
                .max(1),
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "SHOP_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            compensate_partial_reservations: parse_bool_or(
                &lookup,
                "SHOP_COMPENSATE_RESERVATIONS",
                defaults.compensate_partial_reservations,
            ),
            gift: GiftPolicy {
                threshold_cents: parse_or(
                    &lookup,
                    "SHOP_GIFT_THRESHOLD_CENTS",
                    defaults.gift.threshold_cents,
                ),
                discount_percent: parse_or(
                    &lookup,
                    "SHOP_GIFT_DISCOUNT_PERCENT",
                    defaults.gift.discount_percent,
                )
                .clamp(1, 100),
                valid_for: chrono::Duration::days(gift_days.clamp(1, 3_650)),
            },
            stripe_secret_key: non_empty(&lookup, "STRIPE_SECRET_KEY"),
            stripe_webhook_secret: non_empty(&lookup, "STRIPE_WEBHOOK_SECRET"),
            client_url: non_empty(&lookup, "CLIENT_URL").unwrap_or(defaults.client_url),
        }
    }

    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls::for_client(&self.client_url)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match non_empty(lookup, key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "Unparseable setting, using default");
            default
        }),
        None => default,
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) => {
            warn!(key, value = %v, default, "Unparseable flag, using default");
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ShopConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ShopConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config(&[]), ShopConfig::default());
    }

    #[test]
    fn values_are_read() {
        let c = config(&[
            ("SHOP_CHANNEL_BUFFER", "64"),
            ("SHOP_REQUEST_TIMEOUT_MS", "250"),
            ("SHOP_COMPENSATE_RESERVATIONS", "off"),
            ("SHOP_GIFT_THRESHOLD_CENTS", "5000"),
            ("SHOP_GIFT_DISCOUNT_PERCENT", "15"),
            ("SHOP_GIFT_VALID_DAYS", "7"),
            ("STRIPE_SECRET_KEY", "sk_test_1"),
            ("CLIENT_URL", "https://shop.example"),
        ]);
        assert_eq!(c.channel_buffer, 64);
        assert_eq!(c.request_timeout, Duration::from_millis(250));
        assert!(!c.compensate_partial_reservations);
        assert_eq!(c.gift.threshold_cents, 5_000);
        assert_eq!(c.gift.discount_percent, 15);
        assert_eq!(c.gift.valid_for, chrono::Duration::days(7));
        assert_eq!(c.stripe_secret_key.as_deref(), Some("sk_test_1"));
        assert_eq!(c.stripe_webhook_secret, None);
        assert_eq!(
            c.checkout_urls().cancel_url,
            "https://shop.example/purchase-cancel"
        );
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let c = config(&[
            ("SHOP_CHANNEL_BUFFER", "lots"),
            ("SHOP_COMPENSATE_RESERVATIONS", "maybe"),
            ("SHOP_GIFT_DISCOUNT_PERCENT", "-3"),
            ("STRIPE_SECRET_KEY", "   "),
        ]);
        assert_eq!(c.channel_buffer, DEFAULT_CHANNEL_BUFFER);
        assert!(c.compensate_partial_reservations);
        assert_eq!(c.gift.discount_percent, 10);
        assert_eq!(c.stripe_secret_key, None);
    }
}
