use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{
        ChargeInitiation, ChargeRequest, ChargeStatus, ChargeVerification, PaymentProviderPort,
    },
};
use secrecy::ExposeSecret;

/// PayChangu mobile-money client. The provider API works in major currency
/// units; this adapter converts from/to the minor units used internally.
#[derive(Clone)]
pub struct PayChanguClient {
    client: Client,
    base_url: String,
    secret_key: secrecy::SecretString,
}

impl PayChanguClient {
    pub fn new(base_url: String, secret_key: secrecy::SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url,
            secret_key,
        }
    }

    /// Checks the `Signature` header of a webhook delivery: hex-encoded
    /// HMAC-SHA256 of the raw body under the shared webhook secret.
    pub fn verify_webhook_signature(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
    ) -> AppResult<()> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("HMAC error".into()))?;
        mac.update(payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if constant_time_compare(signature_header.trim(), &expected) {
            Ok(())
        } else {
            Err(AppError::InvalidInput("Invalid webhook signature".into()))
        }
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

#[derive(Serialize)]
struct InitializeReq<'a> {
    charge_id: &'a str,
    amount: f64,
    currency: &'a str,
    mobile: &'a str,
    network: &'a str,
}

#[derive(Deserialize)]
struct InitializeResp {
    data: Option<InitializeData>,
}

#[derive(Deserialize)]
struct InitializeData {
    checkout_url: Option<String>,
    charge_id: Option<String>,
}

#[derive(Deserialize)]
struct VerifyResp {
    data: Option<VerifyData>,
}

#[derive(Deserialize)]
struct VerifyData {
    status: Option<String>,
    amount: Option<f64>,
    currency: Option<String>,
}

fn parse_charge_status(s: &str) -> ChargeStatus {
    match s {
        "success" | "successful" => ChargeStatus::Successful,
        "pending" | "processing" => ChargeStatus::Pending,
        _ => ChargeStatus::Failed,
    }
}

#[async_trait]
impl PaymentProviderPort for PayChanguClient {
    async fn initiate_charge(&self, request: &ChargeRequest<'_>) -> AppResult<ChargeInitiation> {
        let body = InitializeReq {
            charge_id: request.tx_ref,
            amount: request.amount_cents as f64 / 100.0,
            currency: request.currency,
            mobile: request.mobile_number,
            network: request.network,
        };

        let response = self
            .client
            .post(format!(
                "{}/mobile-money/payments/initialize",
                self.base_url
            ))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "PayChangu initiation request failed");
                AppError::PaymentVerificationUnavailable
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, detail, "PayChangu rejected charge initiation");
            return Err(AppError::InvalidInput("Payment initiation failed".into()));
        }

        let parsed: InitializeResp = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid PayChangu response: {e}")))?;
        let data = parsed.data.unwrap_or(InitializeData {
            checkout_url: None,
            charge_id: None,
        });

        Ok(ChargeInitiation {
            payment_url: data.checkout_url,
            provider_charge_id: data.charge_id,
        })
    }

    async fn verify_charge(&self, tx_ref: &str) -> AppResult<ChargeVerification> {
        let response = self
            .client
            .get(format!("{}/verify-payment/{}", self.base_url, tx_ref))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, tx_ref, "PayChangu verification request failed");
                AppError::PaymentVerificationUnavailable
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::InvalidTransactionReference);
        }
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), tx_ref, "PayChangu verification returned an error");
            return Err(AppError::PaymentVerificationUnavailable);
        }

        let parsed: VerifyResp = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid PayChangu response: {e}")))?;
        let data = parsed
            .data
            .ok_or_else(|| AppError::Internal("PayChangu response missing data".into()))?;

        Ok(ChargeVerification {
            tx_ref: tx_ref.to_string(),
            status: data
                .status
                .as_deref()
                .map(parse_charge_status)
                .unwrap_or(ChargeStatus::Failed),
            amount_cents: (data.amount.unwrap_or(0.0) * 100.0).round() as i64,
            currency: data.currency.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    #[test]
    fn webhook_signature_roundtrip() {
        let body = r#"{"tx_ref":"sub-abc","status":"successful"}"#;
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").unwrap();
        mac.update(body.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(PayChanguClient::verify_webhook_signature(body, &signature, "whsec_test").is_ok());
        assert!(
            PayChanguClient::verify_webhook_signature(body, &signature, "other-secret").is_err()
        );
        assert!(
            PayChanguClient::verify_webhook_signature("tampered", &signature, "whsec_test")
                .is_err()
        );
    }

    #[test]
    fn charge_status_parsing() {
        assert_eq!(parse_charge_status("successful"), ChargeStatus::Successful);
        assert_eq!(parse_charge_status("success"), ChargeStatus::Successful);
        assert_eq!(parse_charge_status("pending"), ChargeStatus::Pending);
        assert_eq!(parse_charge_status("failed"), ChargeStatus::Failed);
        assert_eq!(parse_charge_status("whatever"), ChargeStatus::Failed);
    }
}
