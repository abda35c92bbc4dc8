pub mod auth;
pub mod password_reset;
pub mod subscription;
pub mod videos;

use axum::{Json, Router, routing::get};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router())
        .nest("/subscriptions", subscription::router())
        .nest("/password", password_reset::router())
        .nest("/videos", videos::router())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        infra::app::create_app,
        test_utils::{
            app_state_builder::{TestAppState, TestAppStateBuilder},
            factories::{create_test_plan, create_test_video},
        },
    };

    fn server(test_state: &TestAppState) -> TestServer {
        TestServer::new(create_app(test_state.state.clone())).unwrap()
    }

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
    }

    fn sign_webhook(body: &str) -> String {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;
        // Matches the webhook secret in the test config.
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").unwrap();
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn post_webhook(server: &TestServer, payload: &Value) -> axum_test::TestResponse {
        let body = payload.to_string();
        let signature = sign_webhook(&body);
        server
            .post("/api/subscriptions/webhook")
            .add_header(
                HeaderName::from_static("signature"),
                HeaderValue::from_str(&signature).unwrap(),
            )
            .text(body)
            .await
    }

    async fn register(server: &TestServer, username: &str) -> Value {
        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "first_name": "Test",
                "last_name": "User",
                "phone_number": "+265991234567",
                "password": "Sufficient1",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn register_login_gate_activate_end_to_end() {
        let plan = create_test_plan(|p| p.duration_days = 30);
        let video = create_test_video(|_| {});
        let test_state = TestAppStateBuilder::new()
            .with_plan(plan.clone())
            .with_video(video.clone())
            .build();
        let server = server(&test_state);

        let tokens = register(&server, "marcus").await;
        let access = tokens["access_token"].as_str().unwrap().to_string();
        let (name, value) = bearer(&access);

        // Login with the same credentials also works.
        let login = server
            .post("/api/auth/login")
            .json(&json!({ "username": "marcus", "password": "Sufficient1" }))
            .await;
        assert_eq!(login.status_code(), StatusCode::OK);

        // Catalogue is visible to any session.
        let list = server
            .get("/api/videos")
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(list.status_code(), StatusCode::OK);
        assert_eq!(list.json::<Value>().as_array().unwrap().len(), 1);

        // Playback is gated: authenticated but unsubscribed gets 403.
        let gated = server
            .get(&format!("/api/videos/{}", video.id))
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(gated.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(gated.json::<Value>()["code"], "SUBSCRIPTION_REQUIRED");

        // Pay for the plan.
        let initiated = server
            .post("/api/subscriptions/initiate-payment")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "plan_id": plan.id,
                "phone_number": "+265991234567",
                "network": "airtel",
            }))
            .await;
        assert_eq!(initiated.status_code(), StatusCode::OK);
        let tx_ref = initiated.json::<Value>()["transaction_reference"]
            .as_str()
            .unwrap()
            .to_string();

        test_state
            .provider
            .set_successful(&tx_ref, plan.price_cents, "MWK");

        let verified = server
            .get(&format!("/api/subscriptions/verify-payment/{tx_ref}"))
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(verified.status_code(), StatusCode::OK);
        assert!(verified.json::<Value>()["expiry_date"].is_string());

        // The gate now opens without a new token: entitlement comes from the
        // live store record, not from claims.
        let playable = server
            .get(&format!("/api/videos/{}", video.id))
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(playable.status_code(), StatusCode::OK);

        let status = server
            .get("/api/subscriptions/status")
            .add_header(name, value)
            .await;
        assert_eq!(status.status_code(), StatusCode::OK);
        let status = status.json::<Value>();
        assert_eq!(status["is_active"], true);
        assert_eq!(status["current_plan"]["id"], json!(plan.id));
    }

    #[tokio::test]
    async fn login_failures_do_not_reveal_which_check_failed() {
        let test_state = TestAppStateBuilder::new().build();
        let server = server(&test_state);
        register(&server, "marcus").await;

        let unknown_user = server
            .post("/api/auth/login")
            .json(&json!({ "username": "nobody", "password": "Sufficient1" }))
            .await;
        let wrong_password = server
            .post("/api/auth/login")
            .json(&json!({ "username": "marcus", "password": "WrongPass1" }))
            .await;

        assert_eq!(unknown_user.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            unknown_user.json::<Value>(),
            wrong_password.json::<Value>()
        );
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_bad_request() {
        let test_state = TestAppStateBuilder::new().build();
        let server = server(&test_state);
        register(&server, "marcus").await;

        let duplicate = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "marcus",
                "email": "other@example.com",
                "first_name": "Test",
                "last_name": "User",
                "phone_number": "+265991234567",
                "password": "Sufficient1",
            }))
            .await;
        assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.json::<Value>()["code"], "DUPLICATE_IDENTITY");
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_and_refresh_tokens() {
        let test_state = TestAppStateBuilder::new().build();
        let server = server(&test_state);
        let tokens = register(&server, "marcus").await;

        let missing = server.get("/api/auth/user-details").await;
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

        // A refresh token is not an access token.
        let refresh_token = tokens["refresh_token"].as_str().unwrap();
        let (name, value) = bearer(refresh_token);
        let wrong_kind = server
            .get("/api/auth/user-details")
            .add_header(name, value)
            .await;
        assert_eq!(wrong_kind.status_code(), StatusCode::UNAUTHORIZED);

        // But it does mint a new access token at the refresh endpoint.
        let refreshed = server
            .post("/api/auth/refresh")
            .json(&json!({ "refresh_token": refresh_token }))
            .await;
        assert_eq!(refreshed.status_code(), StatusCode::OK);
        let access = refreshed.json::<Value>()["access_token"]
            .as_str()
            .unwrap()
            .to_string();
        let (name, value) = bearer(&access);
        let details = server
            .get("/api/auth/user-details")
            .add_header(name, value)
            .await;
        assert_eq!(details.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_always_acks_and_applies_at_most_once() {
        let plan = create_test_plan(|_| {});
        let test_state = TestAppStateBuilder::new().with_plan(plan.clone()).build();
        let server = server(&test_state);

        let tokens = register(&server, "marcus").await;
        let (name, value) = bearer(tokens["access_token"].as_str().unwrap());

        // A delivery without a valid signature is rejected outright.
        let forged = server
            .post("/api/subscriptions/webhook")
            .json(&json!({ "tx_ref": "sub-unknown", "status": "successful" }))
            .await;
        assert_eq!(forged.status_code(), StatusCode::BAD_REQUEST);

        // A signed delivery for an unknown reference still acks.
        let unknown = post_webhook(
            &server,
            &json!({ "tx_ref": "sub-unknown", "status": "successful" }),
        )
        .await;
        assert_eq!(unknown.status_code(), StatusCode::OK);

        let initiated = server
            .post("/api/subscriptions/initiate-payment")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "plan_id": plan.id,
                "phone_number": "+265991234567",
                "network": "tnm",
            }))
            .await;
        let tx_ref = initiated.json::<Value>()["transaction_reference"]
            .as_str()
            .unwrap()
            .to_string();
        test_state
            .provider
            .set_successful(&tx_ref, plan.price_cents, "MWK");

        let payload = json!({ "tx_ref": tx_ref, "status": "successful" });
        let first = post_webhook(&server, &payload).await;
        assert_eq!(first.status_code(), StatusCode::OK);

        let status_after_first = server
            .get("/api/subscriptions/status")
            .add_header(name.clone(), value.clone())
            .await
            .json::<Value>();

        let second = post_webhook(&server, &payload).await;
        assert_eq!(second.status_code(), StatusCode::OK);

        let status_after_second = server
            .get("/api/subscriptions/status")
            .add_header(name, value)
            .await
            .json::<Value>();

        assert_eq!(
            status_after_first["subscription_expiry"],
            status_after_second["subscription_expiry"]
        );
        assert_eq!(status_after_second["is_active"], true);
    }

    #[tokio::test]
    async fn plan_creation_requires_admin_over_http() {
        let test_state = TestAppStateBuilder::new().build();
        let server = server(&test_state);
        let tokens = register(&server, "marcus").await;
        let (name, value) = bearer(tokens["access_token"].as_str().unwrap());

        let response = server
            .post("/api/subscriptions/plans")
            .add_header(name, value)
            .json(&json!({
                "name": "Monthly",
                "price_cents": 500000,
                "duration_days": 30,
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(response.json::<Value>()["code"], "FORBIDDEN");
    }
}
