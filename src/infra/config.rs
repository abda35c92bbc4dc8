use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cors_origin: HeaderValue,
    /// Public origin of the frontend; used in outbound emails.
    pub app_origin: Url,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub paychangu_secret_key: SecretString,
    /// Shared secret the provider uses to sign webhook deliveries.
    pub paychangu_webhook_secret: SecretString,
    /// Overridable for test/staging environments pointed at a sandbox.
    pub paychangu_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());

        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 7_200);
        let refresh_token_ttl_days: i64 = get_env_default("REFRESH_TOKEN_TTL_DAYS", 7);
        let reset_token_ttl_minutes: i64 = get_env_default("RESET_TOKEN_TTL_MINUTES", 30);

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let app_origin: Url = get_env("APP_ORIGIN");

        let resend_api_key: SecretString =
            SecretString::new(get_env::<String>("RESEND_API_KEY").into());
        let email_from: String = get_env("EMAIL_FROM");

        let paychangu_secret_key: SecretString =
            SecretString::new(get_env::<String>("PAYCHANGU_SECRET_KEY").into());
        let paychangu_webhook_secret: SecretString =
            SecretString::new(get_env::<String>("PAYCHANGU_WEBHOOK_SECRET").into());
        let paychangu_base_url: String =
            get_env_default("PAYCHANGU_BASE_URL", "https://api.paychangu.com".to_string());

        Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            refresh_token_ttl: Duration::days(refresh_token_ttl_days),
            reset_token_ttl: Duration::minutes(reset_token_ttl_minutes),
            bind_addr,
            database_url,
            cors_origin,
            app_origin,
            resend_api_key,
            email_from,
            paychangu_secret_key,
            paychangu_webhook_secret,
            paychangu_base_url,
        }
    }
}
