//! Builds a fully wired `AppState` over in-memory mocks for HTTP-level tests.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        auth::AuthUseCases, password_reset::PasswordResetUseCases,
        subscription::SubscriptionUseCases,
    },
    domain::entities::{
        subscription_plan::SubscriptionPlanProfile, user::UserProfile, video::VideoProfile,
    },
    infra::config::AppConfig,
    test_utils::mocks::{
        InMemoryPaymentRepo, InMemoryPlanRepo, InMemoryUserRepo, InMemoryVideoRepo,
        MockPaymentProvider, RecordingEmailSender,
    },
};

pub struct TestAppState {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepo>,
    pub plans: Arc<InMemoryPlanRepo>,
    pub payments: Arc<InMemoryPaymentRepo>,
    pub provider: Arc<MockPaymentProvider>,
    pub email: Arc<RecordingEmailSender>,
}

#[derive(Default)]
pub struct TestAppStateBuilder {
    users: Vec<UserProfile>,
    plans: Vec<SubscriptionPlanProfile>,
    videos: Vec<VideoProfile>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_plan(mut self, plan: SubscriptionPlanProfile) -> Self {
        self.plans.push(plan);
        self
    }

    pub fn with_video(mut self, video: VideoProfile) -> Self {
        self.videos.push(video);
        self
    }

    pub fn build(self) -> TestAppState {
        let config = Arc::new(test_config());

        let users = Arc::new(InMemoryUserRepo::with_users(self.users));
        let plans = Arc::new(InMemoryPlanRepo::with_plans(self.plans));
        let payments = Arc::new(InMemoryPaymentRepo::new(users.clone()));
        let videos = Arc::new(InMemoryVideoRepo::with_videos(self.videos));
        let provider = Arc::new(MockPaymentProvider::new());
        let email = Arc::new(RecordingEmailSender::new());

        let auth_use_cases = Arc::new(AuthUseCases::new(
            users.clone(),
            config.jwt_secret.clone(),
            config.access_token_ttl,
            config.refresh_token_ttl,
        ));
        let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
            plans.clone(),
            payments.clone(),
            users.clone(),
            provider.clone(),
        ));
        let password_reset_use_cases = Arc::new(PasswordResetUseCases::new(
            users.clone(),
            email.clone(),
            config.jwt_secret.clone(),
            config.reset_token_ttl,
        ));

        let state = AppState {
            config,
            auth_use_cases,
            subscription_use_cases,
            password_reset_use_cases,
            videos,
        };

        TestAppState {
            state,
            users,
            plans,
            payments,
            provider,
            email,
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::from("http-test-signing-secret"),
        access_token_ttl: Duration::hours(2),
        refresh_token_ttl: Duration::days(7),
        reset_token_ttl: Duration::minutes(30),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        resend_api_key: SecretString::from("re_test_key"),
        email_from: "VidStream <no-reply@example.com>".to_string(),
        paychangu_secret_key: SecretString::from("sec_test_key"),
        paychangu_webhook_secret: SecretString::from("whsec_test"),
        paychangu_base_url: "http://127.0.0.1:0".to_string(),
    }
}
