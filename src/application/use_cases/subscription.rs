use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{ChargeRequest, ChargeStatus, PaymentProviderPort},
    application::use_cases::auth::UserRepo,
    domain::entities::{
        payment::{PaymentProfile, PaymentStatus},
        subscription_plan::SubscriptionPlanProfile,
        user::UserProfile,
    },
};

#[derive(Debug, Clone)]
pub struct NewPlanInput {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub duration_days: i32,
    pub is_active: bool,
}

#[async_trait]
pub trait SubscriptionPlanRepo: Send + Sync {
    async fn create(&self, input: NewPlanInput) -> AppResult<SubscriptionPlanProfile>;
    /// Ordered by price, cheapest first.
    async fn list(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlanProfile>>;
    async fn get_by_id(&self, plan_id: Uuid) -> AppResult<Option<SubscriptionPlanProfile>>;
}

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn create_pending(
        &self,
        tx_ref: &str,
        user_id: Uuid,
        plan_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> AppResult<PaymentProfile>;

    async fn get_by_tx_ref(&self, tx_ref: &str) -> AppResult<Option<PaymentProfile>>;

    /// Atomically flips the payment `pending -> applied` and extends the
    /// owning user's subscription by `duration_days`, both in one store
    /// transaction. The new expiry is `max(now, current_expiry) + duration`,
    /// so renewing early never forfeits paid-for time.
    ///
    /// Returns `None` when the payment was not in `pending` state (the
    /// replay / concurrent-delivery case). Exactly one caller ever observes
    /// `Some`, which is what makes activation idempotent per tx_ref.
    async fn apply_successful_payment(
        &self,
        tx_ref: &str,
        duration_days: i32,
    ) -> AppResult<Option<NaiveDateTime>>;

    async fn latest_applied_for_user(&self, user_id: Uuid) -> AppResult<Option<PaymentProfile>>;
}

#[derive(Debug, Clone)]
pub struct InitiatePaymentInput {
    pub plan_id: Uuid,
    pub phone_number: String,
    pub network: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentInitiated {
    pub payment_url: Option<String>,
    pub transaction_reference: String,
    pub verification_url: String,
    pub plan_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PaymentVerified {
    pub status: &'static str,
    pub amount_cents: i64,
    pub currency: String,
    pub transaction_reference: String,
    pub payment_date: NaiveDateTime,
    pub plan_id: Uuid,
    pub expiry_date: Option<NaiveDateTime>,
}

/// Provider callback body. Fields are optional because the payload is
/// provider-controlled and must never fail deserialization into a 4xx that
/// would trigger a retry storm.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub tx_ref: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserSubscriptionStatus {
    pub is_subscribed: bool,
    pub subscription_expiry: Option<NaiveDateTime>,
    pub is_active: bool,
    pub current_plan: Option<SubscriptionPlanProfile>,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    plans: Arc<dyn SubscriptionPlanRepo>,
    payments: Arc<dyn PaymentRepo>,
    users: Arc<dyn UserRepo>,
    provider: Arc<dyn PaymentProviderPort>,
}

impl SubscriptionUseCases {
    pub fn new(
        plans: Arc<dyn SubscriptionPlanRepo>,
        payments: Arc<dyn PaymentRepo>,
        users: Arc<dyn UserRepo>,
        provider: Arc<dyn PaymentProviderPort>,
    ) -> Self {
        Self {
            plans,
            payments,
            users,
            provider,
        }
    }

    #[instrument(skip(self, requester, input), fields(requester_id = %requester.id))]
    pub async fn create_plan(
        &self,
        requester: &UserProfile,
        input: NewPlanInput,
    ) -> AppResult<SubscriptionPlanProfile> {
        if !requester.is_admin {
            return Err(AppError::Forbidden);
        }
        if input.duration_days <= 0 {
            return Err(AppError::InvalidInput("duration_days must be positive".into()));
        }
        if input.price_cents < 0 {
            return Err(AppError::InvalidInput("price must not be negative".into()));
        }
        self.plans.create(input).await
    }

    pub async fn list_plans(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlanProfile>> {
        self.plans.list(active_only).await
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> AppResult<SubscriptionPlanProfile> {
        self.plans
            .get_by_id(plan_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Records a pending payment keyed by a fresh transaction reference and
    /// asks the provider to start the charge. Nothing about the user's
    /// subscription changes here.
    #[instrument(skip(self, user, input), fields(user_id = %user.id, plan_id = %input.plan_id))]
    pub async fn initiate_payment(
        &self,
        user: &UserProfile,
        input: InitiatePaymentInput,
    ) -> AppResult<PaymentInitiated> {
        let plan = self
            .plans
            .get_by_id(input.plan_id)
            .await?
            .filter(|plan| plan.is_active)
            .ok_or(AppError::NotFound)?;

        let tx_ref = format!("sub-{}-{}", user.id, Uuid::new_v4());
        self.payments
            .create_pending(&tx_ref, user.id, plan.id, plan.price_cents, &plan.currency)
            .await?;

        let initiation = self
            .provider
            .initiate_charge(&ChargeRequest {
                tx_ref: &tx_ref,
                amount_cents: plan.price_cents,
                currency: &plan.currency,
                mobile_number: &input.phone_number,
                network: &input.network,
            })
            .await?;

        Ok(PaymentInitiated {
            payment_url: initiation.payment_url,
            verification_url: format!("/api/subscriptions/verify-payment/{tx_ref}"),
            transaction_reference: tx_ref,
            plan_id: plan.id,
        })
    }

    /// Client-driven verification of a transaction reference. On provider
    /// success the activation applies exactly once; replays report the
    /// settled state without extending again.
    #[instrument(skip(self))]
    pub async fn verify_payment(&self, tx_ref: &str) -> AppResult<PaymentVerified> {
        let payment = self
            .payments
            .get_by_tx_ref(tx_ref)
            .await?
            .ok_or(AppError::InvalidTransactionReference)?;
        let plan = self
            .plans
            .get_by_id(payment.plan_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if payment.status == PaymentStatus::Applied {
            let expiry = self.current_expiry(payment.user_id).await?;
            return Ok(PaymentVerified {
                status: "success",
                amount_cents: payment.amount_cents,
                currency: payment.currency.clone(),
                transaction_reference: payment.tx_ref,
                payment_date: payment.paid_at.unwrap_or_else(|| Utc::now().naive_utc()),
                plan_id: plan.id,
                expiry_date: expiry,
            });
        }

        let verification = self.provider.verify_charge(tx_ref).await?;
        if verification.status != ChargeStatus::Successful {
            return Err(AppError::PaymentNotCompleted);
        }

        let expiry = match self
            .payments
            .apply_successful_payment(tx_ref, plan.duration_days)
            .await?
        {
            Some(expiry) => Some(expiry),
            // A concurrent webhook won the conditional flip; report the
            // settled state.
            None => self.current_expiry(payment.user_id).await?,
        };

        Ok(PaymentVerified {
            status: "success",
            amount_cents: verification.amount_cents,
            currency: verification.currency,
            transaction_reference: payment.tx_ref,
            payment_date: Utc::now().naive_utc(),
            plan_id: plan.id,
            expiry_date: expiry,
        })
    }

    /// Provider callback. Expected conditions (unknown reference, not yet
    /// successful, already applied) are logged and swallowed so the handler
    /// acks and the provider stops retrying; only transient errors propagate
    /// into a 5xx that invites a retry.
    #[instrument(skip(self, payload))]
    pub async fn process_webhook(&self, payload: &WebhookPayload) -> AppResult<()> {
        let Some(tx_ref) = payload.tx_ref.as_deref() else {
            tracing::warn!("webhook payload without tx_ref");
            return Ok(());
        };
        if payload.status.as_deref() != Some("successful") {
            tracing::debug!(tx_ref, status = ?payload.status, "ignoring non-successful webhook");
            return Ok(());
        }

        let Some(payment) = self.payments.get_by_tx_ref(tx_ref).await? else {
            tracing::warn!(tx_ref, "webhook for unknown transaction reference");
            return Ok(());
        };
        if payment.status == PaymentStatus::Applied {
            return Ok(());
        }

        // The payload itself is untrusted; only the provider's verification
        // answer moves the state machine.
        let verification = self.provider.verify_charge(tx_ref).await?;
        if verification.status != ChargeStatus::Successful {
            tracing::warn!(tx_ref, "webhook claimed success but verification disagreed");
            return Ok(());
        }

        let plan = self
            .plans
            .get_by_id(payment.plan_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if self
            .payments
            .apply_successful_payment(tx_ref, plan.duration_days)
            .await?
            .is_some()
        {
            tracing::info!(tx_ref, user_id = %payment.user_id, "subscription activated");
        }
        Ok(())
    }

    pub async fn subscription_status(
        &self,
        user: &UserProfile,
    ) -> AppResult<UserSubscriptionStatus> {
        let current_plan = match self.payments.latest_applied_for_user(user.id).await? {
            Some(payment) => self.plans.get_by_id(payment.plan_id).await?,
            None => None,
        };
        Ok(UserSubscriptionStatus {
            is_subscribed: user.is_subscribed,
            subscription_expiry: user.subscription_expiry,
            is_active: user.has_active_subscription(Utc::now().naive_utc()),
            current_plan,
        })
    }

    async fn current_expiry(&self, user_id: Uuid) -> AppResult<Option<NaiveDateTime>> {
        Ok(self
            .users
            .get_by_id(user_id)
            .await?
            .and_then(|user| user.subscription_expiry))
    }
}
