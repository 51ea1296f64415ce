//! Webhook signature checking and event decoding.
//!
//! The signature header has the form `t=<unix seconds>,v1=<hex hmac>`; the MAC is
//! HMAC-SHA256 over `"<t>.<raw body>"` keyed with the endpoint secret. Events older or newer
//! than [`SIGNATURE_TOLERANCE_SECS`] are rejected to stop replays.

use super::error::CheckoutError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Checks `header` against `payload` and `secret` at time `now`.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), CheckoutError> {
    let mut timestamp = "";
    let mut signature = "";
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }
    if timestamp.is_empty() || signature.is_empty() {
        return Err(CheckoutError::InvalidSignature("malformed header".into()));
    }

    let body = std::str::from_utf8(payload)
        .map_err(|_| CheckoutError::InvalidSignature("payload is not UTF-8".into()))?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| CheckoutError::InvalidSignature("unusable secret".into()))?;
    mac.update(format!("{timestamp}.{body}").as_bytes());

    let expected = hex::decode(signature)
        .map_err(|_| CheckoutError::InvalidSignature("signature is not hex".into()))?;
    mac.verify_slice(&expected)
        .map_err(|_| CheckoutError::InvalidSignature("signature mismatch".into()))?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| CheckoutError::InvalidSignature("bad timestamp".into()))?;
    if (now.timestamp() - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(CheckoutError::InvalidSignature(
            "timestamp outside tolerance".into(),
        ));
    }
    Ok(())
}

/// The parts of a webhook event the reconciler looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event_type: String,
    /// `data.object.id`; the session id for checkout events.
    pub object_id: Option<String>,
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, CheckoutError> {
    let body: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| CheckoutError::MalformedResponse(format!("webhook body: {e}")))?;
    let event_type = body["type"]
        .as_str()
        .ok_or_else(|| CheckoutError::MalformedResponse("webhook without type".into()))?;
    Ok(WebhookEvent {
        event_type: event_type.to_string(),
        object_id: body["data"]["object"]["id"].as_str().map(String::from),
    })
}

/// Builds a valid header for `payload`. Used to drive the webhook path in tests and demos.
pub fn sign_payload(payload: &[u8], secret: &str, at: DateTime<Utc>) -> Result<String, CheckoutError> {
    let timestamp = at.timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| CheckoutError::InvalidSignature("unusable secret".into()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}
