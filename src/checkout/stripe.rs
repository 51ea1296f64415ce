//! Stripe Checkout over the REST API.
//!
//! Requests are form-encoded with basic auth, responses read as loose JSON. Only the fields
//! the order core needs are extracted.

use super::error::CheckoutError;
use super::provider::{CheckoutRequest, PaymentProvider, ProviderSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeProvider {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeProvider {
    /// Builds a provider whose every request gives up after `timeout`.
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Result<Self, CheckoutError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            secret_key: secret_key.into(),
            base_url: STRIPE_API_BASE.to_string(),
        })
    }

    /// Points the provider at another host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Single-use percentage coupon on the Stripe side.
    async fn create_coupon(&self, percent_off: u8) -> Result<String, CheckoutError> {
        let percent = percent_off.to_string();
        let resp = self
            .http
            .post(format!("{}/v1/coupons", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("percent_off", percent.as_str()), ("duration", "once")])
            .send()
            .await?;
        let body = read_json(resp, "coupon").await?;
        body["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| CheckoutError::MalformedResponse(format!("coupon without id: {body}")))
    }
}

/// Flattens a checkout request into Stripe's bracketed form fields.
pub(crate) fn session_form(
    request: &CheckoutRequest,
    stripe_coupon: Option<&str>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), "usd".to_string()));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            line.unit_amount_cents.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
    }
    if let Some(coupon) = stripe_coupon {
        form.push(("discounts[0][coupon]".to_string(), coupon.to_string()));
    }
    let mut keys: Vec<&String> = request.metadata.keys().collect();
    keys.sort();
    for key in keys {
        form.push((format!("metadata[{key}]"), request.metadata[key].clone()));
    }
    form
}

/// Reads a provider JSON body, turning error statuses into `CheckoutError`.
async fn read_json(resp: reqwest::Response, what: &str) -> Result<serde_json::Value, CheckoutError> {
    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;
    if status.is_success() {
        return Ok(body);
    }
    let message = body["error"]["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_string();
    Err(CheckoutError::Api {
        status: status.as_u16(),
        message: format!("{what}: {message}"),
    })
}

/// Payment statuses after which the order may be fulfilled. A fully discounted session
/// never collects money and reports `no_payment_required`.
const SETTLED_PAYMENT_STATUSES: [&str; 2] = ["paid", "no_payment_required"];

/// Extracts the fields of a Checkout Session object.
pub(crate) fn parse_session(body: &serde_json::Value) -> Result<ProviderSession, CheckoutError> {
    let id = body["id"]
        .as_str()
        .ok_or_else(|| CheckoutError::MalformedResponse(format!("session without id: {body}")))?;
    let amount_total_cents = body["amount_total"].as_u64().ok_or_else(|| {
        CheckoutError::MalformedResponse(format!("session {id} without amount_total"))
    })?;
    let paid = body["payment_status"]
        .as_str()
        .is_some_and(|status| SETTLED_PAYMENT_STATUSES.contains(&status));
    let metadata: HashMap<String, String> = body["metadata"]
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(ProviderSession {
        id: id.to_string(),
        paid,
        amount_total_cents,
        metadata,
        url: body["url"].as_str().map(String::from),
    })
}

/// Stripe ids are ASCII alphanumerics and underscores; anything else is refused before it
/// reaches a URL path.
fn is_session_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<ProviderSession, CheckoutError> {
        let coupon = match request.discount_percent {
            Some(percent) => Some(self.create_coupon(percent).await?),
            None => None,
        };
        let form = session_form(&request, coupon.as_deref());
        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;
        let body = read_json(resp, "create checkout session").await?;
        let session = parse_session(&body)?;
        debug!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, CheckoutError> {
        if !is_session_id(session_id) {
            return Err(CheckoutError::SessionNotFound(session_id.to_string()));
        }
        let resp = self
            .http
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CheckoutError::SessionNotFound(session_id.to_string()));
        }
        let body = read_json(resp, "retrieve checkout session").await?;
        parse_session(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::provider::CheckoutLine;
    use serde_json::json;

    #[test]
    fn session_objects_are_parsed_leniently() {
        let body = json!({
            "id": "cs_test_1",
            "payment_status": "paid",
            "amount_total": 18000,
            "url": null,
            "metadata": { "userId": "u1", "products": "[]", "ignored": 7 }
        });
        let session = parse_session(&body).unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert!(session.paid);
        assert_eq!(session.amount_total_cents, 18_000);
        assert_eq!(session.metadata.len(), 2);
        assert_eq!(session.url, None);
    }

    #[test]
    fn unpaid_and_idless_sessions() {
        let unpaid = parse_session(&json!({
            "id": "cs_2",
            "payment_status": "unpaid",
            "amount_total": 500
        }))
        .unwrap();
        assert!(!unpaid.paid);
        assert!(parse_session(&json!({ "payment_status": "paid", "amount_total": 500 })).is_err());
    }

    #[test]
    fn missing_amount_is_malformed() {
        let result = parse_session(&json!({ "id": "cs_1", "payment_status": "paid" }));
        assert!(matches!(result, Err(CheckoutError::MalformedResponse(m)) if m.contains("cs_1")));
    }

    #[test]
    fn fully_discounted_sessions_count_as_paid() {
        let free = parse_session(&json!({
            "id": "cs_3",
            "payment_status": "no_payment_required",
            "amount_total": 0
        }))
        .unwrap();
        assert!(free.paid);
        assert_eq!(free.amount_total_cents, 0);
    }

    #[test]
    fn session_ids_are_checked_before_use() {
        assert!(is_session_id("cs_test_a1B2c3"));
        assert!(!is_session_id(""));
        assert!(!is_session_id("cs_1/../../v1/customers"));
        assert!(!is_session_id("cs_1?expand=x"));
    }

    #[tokio::test]
    async fn path_like_session_ids_never_leave_the_process() {
        let provider = StripeProvider::new("sk_test", Duration::from_millis(100))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let result = provider.retrieve_session("../v1/customers").await;
        assert_eq!(
            result.map(|s| s.id),
            Err(CheckoutError::SessionNotFound("../v1/customers".into()))
        );
    }

    #[test]
    fn form_carries_lines_discount_and_metadata() {
        let request = CheckoutRequest {
            lines: vec![CheckoutLine {
                name: "Widget".into(),
                unit_amount_cents: 1_250,
                quantity: 2,
            }],
            discount_percent: Some(10),
            metadata: HashMap::from([("userId".to_string(), "u1".to_string())]),
            success_url: "http://shop/ok".into(),
            cancel_url: "http://shop/cancel".into(),
        };
        let form = session_form(&request, Some("co_1"));

        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("1250"));
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(get("discounts[0][coupon]"), Some("co_1"));
        assert_eq!(get("metadata[userId]"), Some("u1"));
        assert_eq!(get("mode"), Some("payment"));
    }
}
