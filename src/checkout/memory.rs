//! A payment provider that lives in process memory.
//!
//! Sessions start unpaid; tests and the demo flip them with [`InMemoryPaymentProvider::mark_paid`].
//! A session with nothing left to charge is settled from the start, like a hosted session
//! reporting `no_payment_required`.
//! The amount charged is computed the way the hosted provider would: line totals, less the
//! session discount.

use super::error::CheckoutError;
use super::provider::{CheckoutRequest, PaymentProvider, ProviderSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct State {
    sessions: HashMap<String, ProviderSession>,
    next_id: u32,
    create_calls: usize,
    retrieve_calls: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryPaymentProvider {
    state: Arc<Mutex<State>>,
}

impl InMemoryPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the session paid. Returns `false` for an unknown id.
    pub fn mark_paid(&self, session_id: &str) -> bool {
        match self.state().sessions.get_mut(session_id) {
            Some(session) => {
                session.paid = true;
                true
            }
            None => false,
        }
    }

    /// Stores a session as-is, replacing any with the same id.
    pub fn insert_session(&self, session: ProviderSession) {
        self.state().sessions.insert(session.id.clone(), session);
    }

    pub fn session(&self, session_id: &str) -> Option<ProviderSession> {
        self.state().sessions.get(session_id).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn retrieve_calls(&self) -> usize {
        self.state().retrieve_calls
    }
}

fn charged_amount(request: &CheckoutRequest) -> Result<u64, CheckoutError> {
    let gross = request
        .lines
        .iter()
        .try_fold(0u64, |acc, line| {
            line.unit_amount_cents
                .checked_mul(u64::from(line.quantity))
                .and_then(|sub| acc.checked_add(sub))
        })
        .ok_or_else(|| CheckoutError::Api {
            status: 400,
            message: "amount overflows".into(),
        })?;
    let discount = match request.discount_percent {
        Some(percent) => {
            let scaled = u128::from(gross) * u128::from(percent);
            u64::try_from((scaled + 50) / 100).unwrap_or(gross).min(gross)
        }
        None => 0,
    };
    Ok(gross - discount)
}

#[async_trait]
impl PaymentProvider for InMemoryPaymentProvider {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<ProviderSession, CheckoutError> {
        let amount_total_cents = charged_amount(&request)?;
        let mut state = self.state();
        state.create_calls += 1;
        state.next_id += 1;
        let id = format!("cs_test_{}", state.next_id);
        let session = ProviderSession {
            id: id.clone(),
            paid: amount_total_cents == 0,
            amount_total_cents,
            metadata: request.metadata,
            url: Some(format!("https://checkout.invalid/pay/{id}")),
        };
        state.sessions.insert(id, session.clone());
        debug!(session_id = %session.id, amount_total_cents, "In-memory session created");
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, CheckoutError> {
        let mut state = self.state();
        state.retrieve_calls += 1;
        state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| CheckoutError::SessionNotFound(session_id.to_string()))
    }
}
