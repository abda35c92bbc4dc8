use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::user::UserProfile;
use secrecy::ExposeSecret;

/// Discriminator baked into every token so one kind cannot stand in for
/// another (a refresh token is never a valid access token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::Reset => "reset",
        }
    }
}

/// Verification failures, kept distinct for callers; HTTP-facing code
/// collapses all of them to 401 via the `From<TokenError>` impl below.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("unexpected token kind")]
    KindMismatch,
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::InvalidCredentials
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub email: String,
    pub phone: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh claims are deliberately minimal: enough to re-identify the
/// subject, nothing a protected endpoint could be tempted to trust.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_access(
    user: &UserProfile,
    secret: &secrecy::SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = AccessClaims {
        sub: user.username.clone(),
        user_id: user.id,
        email: user.email.clone(),
        phone: user.phone_number.clone(),
        token_type: TokenKind::Access,
        iat: now,
        exp: now + ttl.whole_seconds(),
    };
    sign(&claims, secret)
}

pub fn issue_refresh(
    username: &str,
    secret: &secrecy::SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = RefreshClaims {
        sub: username.to_string(),
        token_type: TokenKind::Refresh,
        iat: now,
        exp: now + ttl.whole_seconds(),
    };
    sign(&claims, secret)
}

pub fn issue_reset(
    email: &str,
    secret: &secrecy::SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = ResetClaims {
        sub: email.to_string(),
        token_type: TokenKind::Reset,
        iat: now,
        exp: now + ttl.whole_seconds(),
    };
    sign(&claims, secret)
}

pub fn verify_access(
    token: &str,
    secret: &secrecy::SecretString,
) -> Result<AccessClaims, TokenError> {
    let claims: AccessClaims = verify(token, secret)?;
    if claims.token_type != TokenKind::Access {
        return Err(TokenError::KindMismatch);
    }
    Ok(claims)
}

pub fn verify_refresh(
    token: &str,
    secret: &secrecy::SecretString,
) -> Result<RefreshClaims, TokenError> {
    let claims: RefreshClaims = verify(token, secret)?;
    if claims.token_type != TokenKind::Refresh {
        return Err(TokenError::KindMismatch);
    }
    Ok(claims)
}

pub fn verify_reset(
    token: &str,
    secret: &secrecy::SecretString,
) -> Result<ResetClaims, TokenError> {
    let claims: ResetClaims = verify(token, secret)?;
    if claims.token_type != TokenKind::Reset {
        return Err(TokenError::KindMismatch);
    }
    Ok(claims)
}

fn sign<T: Serialize>(claims: &T, secret: &secrecy::SecretString) -> AppResult<String> {
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

fn verify<T: DeserializeOwned>(
    token: &str,
    secret: &secrecy::SecretString,
) -> Result<T, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::factories::create_test_user;
    use secrecy::SecretString;

    fn secret() -> SecretString {
        SecretString::from("unit-test-signing-secret")
    }

    #[test]
    fn access_token_roundtrip() {
        let user = create_test_user(|_| {});
        let token = issue_access(&user, &secret(), Duration::hours(2)).unwrap();

        let claims = verify_access(&token, &secret()).unwrap();
        assert_eq!(claims.sub, user.username);
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.token_type, TokenKind::Access);
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let user = create_test_user(|_| {});
        let token = issue_access(&user, &secret(), Duration::seconds(-120)).unwrap();

        assert_eq!(verify_access(&token, &secret()), Err(TokenError::Expired));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let token = issue_refresh("marcus", &secret(), Duration::days(7)).unwrap();

        // Refresh claims lack the access-only fields, so strict decoding
        // already refuses the payload before the kind check runs.
        assert_eq!(verify_access(&token, &secret()), Err(TokenError::Invalid));
        // And the kind survives the roundtrip for the legitimate caller.
        let claims = verify_refresh(&token, &secret()).unwrap();
        assert_eq!(claims.token_type, TokenKind::Refresh);
    }

    #[test]
    fn reset_token_is_not_a_refresh_token() {
        let token = issue_reset("user@example.com", &secret(), Duration::minutes(30)).unwrap();

        // Same shape as refresh claims, so this one is caught by the
        // discriminator rather than by deserialization.
        assert_eq!(
            verify_refresh(&token, &secret()),
            Err(TokenError::KindMismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = create_test_user(|_| {});
        let token = issue_access(&user, &secret(), Duration::hours(2)).unwrap();

        let other = SecretString::from("a-different-secret");
        assert_eq!(verify_access(&token, &other), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            verify_access("not.a.token", &secret()),
            Err(TokenError::Invalid)
        );
    }
}
