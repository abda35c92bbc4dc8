use axum::Json;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::app_error::AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log before the error collapses into a status response.
        tracing::error!(error = ?self, code = self.code().as_str(), "Request failed");

        let code = self.code().as_str();
        let body = |detail: String| Json(serde_json::json!({ "error": detail, "code": code }));

        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                body("Could not validate credentials".into()),
            )
                .into_response(),
            AppError::SubscriptionRequired => {
                (StatusCode::FORBIDDEN, body(self.to_string())).into_response()
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, body(self.to_string())).into_response(),
            AppError::DuplicateIdentity(msg) => {
                (StatusCode::BAD_REQUEST, body(msg)).into_response()
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, body(self.to_string())).into_response(),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, body(msg)).into_response(),
            AppError::PaymentNotCompleted => {
                (StatusCode::PAYMENT_REQUIRED, body(self.to_string())).into_response()
            }
            AppError::InvalidTransactionReference => {
                (StatusCode::BAD_REQUEST, body(self.to_string())).into_response()
            }
            AppError::PaymentVerificationUnavailable => {
                (StatusCode::BAD_GATEWAY, body(self.to_string())).into_response()
            }
            // Internal detail is logged above, never surfaced.
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("Database error".into()),
            )
                .into_response(),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("Internal error".into()),
            )
                .into_response(),
        }
    }
}
