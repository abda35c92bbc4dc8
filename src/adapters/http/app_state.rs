use std::sync::Arc;

use crate::{
    application::use_cases::{
        auth::AuthUseCases, password_reset::PasswordResetUseCases,
        subscription::SubscriptionUseCases, videos::VideoRepo,
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub password_reset_use_cases: Arc<PasswordResetUseCases>,
    pub videos: Arc<dyn VideoRepo>,
}
