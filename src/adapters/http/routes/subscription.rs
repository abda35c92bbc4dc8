use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, extract::CurrentUser},
    app_error::{AppError, AppResult},
    infra::paychangu::PayChanguClient,
    use_cases::subscription::{InitiatePaymentInput, NewPlanInput, WebhookPayload},
};

#[derive(Deserialize)]
struct CreatePlanPayload {
    name: String,
    description: Option<String>,
    price_cents: i64,
    #[serde(default = "default_currency")]
    currency: String,
    duration_days: i32,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_currency() -> String {
    "MWK".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct PlansQuery {
    #[serde(default = "default_true")]
    active_only: bool,
}

#[derive(Deserialize)]
struct InitiatePaymentPayload {
    plan_id: Uuid,
    phone_number: String,
    network: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", post(create_plan).get(list_plans))
        .route("/plans/{plan_id}", get(get_plan))
        .route("/initiate-payment", post(initiate_payment))
        .route("/verify-payment/{tx_ref}", get(verify_payment))
        .route("/webhook", post(webhook))
        .route("/status", get(status))
}

async fn create_plan(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreatePlanPayload>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state
        .subscription_use_cases
        .create_plan(
            &user,
            NewPlanInput {
                name: payload.name,
                description: payload.description,
                price_cents: payload.price_cents,
                currency: payload.currency,
                duration_days: payload.duration_days,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(plan))
}

async fn list_plans(
    State(app_state): State<AppState>,
    Query(query): Query<PlansQuery>,
) -> AppResult<impl IntoResponse> {
    let plans = app_state
        .subscription_use_cases
        .list_plans(query.active_only)
        .await?;
    Ok(Json(plans))
}

async fn get_plan(
    State(app_state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.subscription_use_cases.get_plan(plan_id).await?;
    Ok(Json(plan))
}

async fn initiate_payment(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<InitiatePaymentPayload>,
) -> AppResult<impl IntoResponse> {
    let initiated = app_state
        .subscription_use_cases
        .initiate_payment(
            &user,
            InitiatePaymentInput {
                plan_id: payload.plan_id,
                phone_number: payload.phone_number,
                network: payload.network,
            },
        )
        .await?;
    Ok(Json(initiated))
}

async fn verify_payment(
    State(app_state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(tx_ref): Path<String>,
) -> AppResult<impl IntoResponse> {
    let verified = app_state
        .subscription_use_cases
        .verify_payment(&tx_ref)
        .await?;
    Ok(Json(verified))
}

/// Provider callback, authenticated by its HMAC signature over the raw
/// body. Expected conditions ack with 200 so the provider stops retrying;
/// only transient failures (store down) surface as 5xx and invite a retry.
async fn webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get("signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidInput("Missing webhook signature".into()))?;
    PayChanguClient::verify_webhook_signature(
        &body,
        signature,
        app_state.config.paychangu_webhook_secret.expose_secret(),
    )?;

    let payload: WebhookPayload = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;
    app_state
        .subscription_use_cases
        .process_webhook(&payload)
        .await?;
    Ok(Json(serde_json::json!({ "status": "success" })))
}

async fn status(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let status = app_state
        .subscription_use_cases
        .subscription_status(&user)
        .await?;
    Ok(Json(status))
}
