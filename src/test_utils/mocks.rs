//! In-memory mock implementations for the repository and port traits.
//! Semantics mirror the Postgres adapters, including the conditional
//! `pending -> applied` flip that makes payment activation idempotent.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        email::EmailSender,
        payment_provider::{
            ChargeInitiation, ChargeRequest, ChargeStatus, ChargeVerification, PaymentProviderPort,
        },
    },
    application::use_cases::{
        auth::{NewUser, UserRepo},
        subscription::{NewPlanInput, PaymentRepo, SubscriptionPlanRepo},
        videos::VideoRepo,
    },
    domain::entities::{
        payment::{PaymentProfile, PaymentStatus},
        subscription_plan::SubscriptionPlanProfile,
        user::UserProfile,
        video::VideoProfile,
    },
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, UserProfile>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserProfile>) -> Self {
        let map = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Mutex::new(map),
        }
    }

    pub fn get(&self, user_id: Uuid) -> Option<UserProfile> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    pub fn remove(&self, user_id: Uuid) {
        self.users.lock().unwrap().remove(&user_id);
    }

    pub fn update(&self, user_id: Uuid, f: impl FnOnce(&mut UserProfile)) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            f(user);
        }
    }

    /// The mock counterpart of the expiry extension the Postgres adapter
    /// performs inside its activation transaction.
    pub fn extend_subscription(
        &self,
        user_id: Uuid,
        duration_days: i32,
    ) -> Option<NaiveDateTime> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id)?;
        let now = Utc::now().naive_utc();
        let base = user.subscription_expiry.filter(|expiry| *expiry > now).unwrap_or(now);
        let expiry = base + chrono::Duration::days(duration_days as i64);
        user.is_subscribed = true;
        user.subscription_expiry = Some(expiry);
        Some(expiry)
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn create(&self, input: NewUser) -> AppResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == input.username) {
            return Err(AppError::DuplicateIdentity(
                "Username already registered".into(),
            ));
        }
        if users.values().any(|u| u.email == input.email) {
            return Err(AppError::DuplicateIdentity("Email already registered".into()));
        }
        let user = UserProfile {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            is_admin: false,
            is_subscribed: false,
            subscription_expiry: None,
            avatar_url: None,
            created_at: Some(Utc::now().naive_utc()),
            hashed_password: input.hashed_password,
            reset_token: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserProfile>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_reset_token(&self, user_id: Uuid, token: Option<&str>) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.reset_token = token.map(str::to_owned);
        Ok(())
    }

    async fn set_password(&self, user_id: Uuid, hashed_password: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.hashed_password = hashed_password.to_string();
        user.reset_token = None;
        Ok(())
    }
}

// ============================================================================
// InMemoryPlanRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryPlanRepo {
    pub plans: Mutex<HashMap<Uuid, SubscriptionPlanProfile>>,
}

impl InMemoryPlanRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<SubscriptionPlanProfile>) -> Self {
        let map = plans.into_iter().map(|p| (p.id, p)).collect();
        Self {
            plans: Mutex::new(map),
        }
    }
}

#[async_trait]
impl SubscriptionPlanRepo for InMemoryPlanRepo {
    async fn create(&self, input: NewPlanInput) -> AppResult<SubscriptionPlanProfile> {
        let now = Utc::now().naive_utc();
        let plan = SubscriptionPlanProfile {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            currency: input.currency,
            duration_days: input.duration_days,
            is_active: input.is_active,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.plans.lock().unwrap().insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlanProfile>> {
        let mut plans: Vec<_> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.price_cents);
        Ok(plans)
    }

    async fn get_by_id(&self, plan_id: Uuid) -> AppResult<Option<SubscriptionPlanProfile>> {
        Ok(self.plans.lock().unwrap().get(&plan_id).cloned())
    }
}

// ============================================================================
// InMemoryPaymentRepo
// ============================================================================

pub struct InMemoryPaymentRepo {
    pub payments: Mutex<HashMap<String, PaymentProfile>>,
    users: Arc<InMemoryUserRepo>,
}

impl InMemoryPaymentRepo {
    pub fn new(users: Arc<InMemoryUserRepo>) -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
            users,
        }
    }
}

#[async_trait]
impl PaymentRepo for InMemoryPaymentRepo {
    async fn create_pending(
        &self,
        tx_ref: &str,
        user_id: Uuid,
        plan_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> AppResult<PaymentProfile> {
        let mut payments = self.payments.lock().unwrap();
        if payments.contains_key(tx_ref) {
            return Err(AppError::DuplicateIdentity(
                "A record with this value already exists".into(),
            ));
        }
        let payment = PaymentProfile {
            tx_ref: tx_ref.to_string(),
            user_id,
            plan_id,
            amount_cents,
            currency: currency.to_string(),
            status: PaymentStatus::Pending,
            created_at: Some(Utc::now().naive_utc()),
            paid_at: None,
        };
        payments.insert(payment.tx_ref.clone(), payment.clone());
        Ok(payment)
    }

    async fn get_by_tx_ref(&self, tx_ref: &str) -> AppResult<Option<PaymentProfile>> {
        Ok(self.payments.lock().unwrap().get(tx_ref).cloned())
    }

    async fn apply_successful_payment(
        &self,
        tx_ref: &str,
        duration_days: i32,
    ) -> AppResult<Option<NaiveDateTime>> {
        {
            let mut payments = self.payments.lock().unwrap();
            match payments.get_mut(tx_ref) {
                Some(payment) if payment.status == PaymentStatus::Pending => {
                    payment.status = PaymentStatus::Applied;
                    payment.paid_at = Some(Utc::now().naive_utc());
                }
                // Already applied (or failed): the conditional flip loses.
                Some(_) | None => return Ok(None),
            }
        }
        let user_id = self
            .payments
            .lock()
            .unwrap()
            .get(tx_ref)
            .map(|p| p.user_id)
            .ok_or(AppError::NotFound)?;
        let expiry = self
            .users
            .extend_subscription(user_id, duration_days)
            .ok_or(AppError::NotFound)?;
        Ok(Some(expiry))
    }

    async fn latest_applied_for_user(&self, user_id: Uuid) -> AppResult<Option<PaymentProfile>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.user_id == user_id && p.status == PaymentStatus::Applied)
            .max_by_key(|p| p.paid_at)
            .cloned())
    }
}

// ============================================================================
// InMemoryVideoRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryVideoRepo {
    pub videos: Mutex<HashMap<Uuid, VideoProfile>>,
}

impl InMemoryVideoRepo {
    pub fn with_videos(videos: Vec<VideoProfile>) -> Self {
        let map = videos.into_iter().map(|v| (v.id, v)).collect();
        Self {
            videos: Mutex::new(map),
        }
    }
}

#[async_trait]
impl VideoRepo for InMemoryVideoRepo {
    async fn list(&self, limit: i64) -> AppResult<Vec<VideoProfile>> {
        let mut videos: Vec<_> = self.videos.lock().unwrap().values().cloned().collect();
        videos.sort_by_key(|v| std::cmp::Reverse(v.created_date));
        videos.truncate(limit.max(0) as usize);
        Ok(videos)
    }

    async fn get_by_id(&self, video_id: Uuid) -> AppResult<Option<VideoProfile>> {
        Ok(self.videos.lock().unwrap().get(&video_id).cloned())
    }
}

// ============================================================================
// MockPaymentProvider
// ============================================================================

#[derive(Default)]
pub struct MockPaymentProvider {
    verifications: Mutex<HashMap<String, ChargeVerification>>,
    unavailable: Mutex<bool>,
    pub initiated: Mutex<Vec<String>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_successful(&self, tx_ref: &str, amount_cents: i64, currency: &str) {
        self.verifications.lock().unwrap().insert(
            tx_ref.to_string(),
            ChargeVerification {
                tx_ref: tx_ref.to_string(),
                status: ChargeStatus::Successful,
                amount_cents,
                currency: currency.to_string(),
            },
        );
    }

    pub fn set_status(&self, tx_ref: &str, status: ChargeStatus) {
        let mut verifications = self.verifications.lock().unwrap();
        verifications
            .entry(tx_ref.to_string())
            .and_modify(|v| v.status = status)
            .or_insert_with(|| ChargeVerification {
                tx_ref: tx_ref.to_string(),
                status,
                amount_cents: 0,
                currency: "MWK".to_string(),
            });
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl PaymentProviderPort for MockPaymentProvider {
    async fn initiate_charge(&self, request: &ChargeRequest<'_>) -> AppResult<ChargeInitiation> {
        if *self.unavailable.lock().unwrap() {
            return Err(AppError::PaymentVerificationUnavailable);
        }
        self.initiated
            .lock()
            .unwrap()
            .push(request.tx_ref.to_string());
        Ok(ChargeInitiation {
            payment_url: Some(format!("https://checkout.test/{}", request.tx_ref)),
            provider_charge_id: Some(request.tx_ref.to_string()),
        })
    }

    async fn verify_charge(&self, tx_ref: &str) -> AppResult<ChargeVerification> {
        if *self.unavailable.lock().unwrap() {
            return Err(AppError::PaymentVerificationUnavailable);
        }
        self.verifications
            .lock()
            .unwrap()
            .get(tx_ref)
            .cloned()
            .ok_or(AppError::InvalidTransactionReference)
    }
}

// ============================================================================
// RecordingEmailSender
// ============================================================================

#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_body(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, _, body)| body.clone())
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}
