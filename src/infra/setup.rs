use crate::{
    adapters::{
        email::resend::ResendEmailSender, http::app_state::AppState,
        persistence::PostgresPersistence,
    },
    application::ports::{email::EmailSender, payment_provider::PaymentProviderPort},
    infra::{config::AppConfig, db::init_db, paychangu::PayChanguClient},
    use_cases::{
        auth::{AuthUseCases, UserRepo},
        password_reset::PasswordResetUseCases,
        subscription::{PaymentRepo, SubscriptionPlanRepo, SubscriptionUseCases},
        videos::VideoRepo,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(PostgresPersistence::new(init_db(&config.database_url).await?));

    let email = Arc::new(ResendEmailSender::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
    )) as Arc<dyn EmailSender>;

    let provider = Arc::new(PayChanguClient::new(
        config.paychangu_base_url.clone(),
        config.paychangu_secret_key.clone(),
    )) as Arc<dyn PaymentProviderPort>;

    let user_repo = postgres_arc.clone() as Arc<dyn UserRepo>;
    let plan_repo = postgres_arc.clone() as Arc<dyn SubscriptionPlanRepo>;
    let payment_repo = postgres_arc.clone() as Arc<dyn PaymentRepo>;
    let video_repo = postgres_arc.clone() as Arc<dyn VideoRepo>;

    let auth_use_cases = AuthUseCases::new(
        user_repo.clone(),
        config.jwt_secret.clone(),
        config.access_token_ttl,
        config.refresh_token_ttl,
    );

    let subscription_use_cases =
        SubscriptionUseCases::new(plan_repo, payment_repo, user_repo.clone(), provider);

    let password_reset_use_cases = PasswordResetUseCases::new(
        user_repo,
        email,
        config.jwt_secret.clone(),
        config.reset_token_ttl,
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
        password_reset_use_cases: Arc::new(password_reset_use_cases),
        videos: video_repo,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vidstream_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
