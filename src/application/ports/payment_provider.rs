use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

/// Charge initiation forwarded to the provider. Amounts are minor units;
/// adapters convert to whatever the provider's wire format wants.
#[derive(Debug, Clone)]
pub struct ChargeRequest<'a> {
    pub tx_ref: &'a str,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub mobile_number: &'a str,
    pub network: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargeInitiation {
    /// Hosted payment page, when the provider redirects.
    pub payment_url: Option<String>,
    /// Provider-side identifier for the charge, when one is returned.
    pub provider_charge_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Successful,
    Pending,
    Failed,
}

/// Provider's answer for a transaction reference. This is the only input the
/// activation state machine trusts; webhook payloads are re-verified through
/// this call before any state changes.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeVerification {
    pub tx_ref: String,
    pub status: ChargeStatus,
    pub amount_cents: i64,
    pub currency: String,
}

/// Payment provider port. Implementations map these domain-level actions to
/// the provider API and translate transport failures into
/// `PaymentVerificationUnavailable` so callers can signal "retry later".
#[async_trait]
pub trait PaymentProviderPort: Send + Sync {
    async fn initiate_charge(&self, request: &ChargeRequest<'_>) -> AppResult<ChargeInitiation>;

    async fn verify_charge(&self, tx_ref: &str) -> AppResult<ChargeVerification>;
}
