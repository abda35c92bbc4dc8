use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Subscription required to access this content. Please subscribe to continue.")]
    SubscriptionRequired,

    #[error("{0}")]
    DuplicateIdentity(String),

    #[error("Not authorized")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payment not completed or failed")]
    PaymentNotCompleted,

    #[error("Invalid transaction reference")]
    InvalidTransactionReference,

    #[error("Payment provider is unavailable. Please retry shortly.")]
    PaymentVerificationUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    SubscriptionRequired,
    DuplicateIdentity,
    Forbidden,
    NotFound,
    InvalidInput,
    PaymentNotCompleted,
    InvalidTransactionReference,
    PaymentVerificationUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
            ErrorCode::DuplicateIdentity => "DUPLICATE_IDENTITY",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::PaymentNotCompleted => "PAYMENT_NOT_COMPLETED",
            ErrorCode::InvalidTransactionReference => "INVALID_TRANSACTION_REFERENCE",
            ErrorCode::PaymentVerificationUnavailable => "PAYMENT_VERIFICATION_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::SubscriptionRequired => ErrorCode::SubscriptionRequired,
            AppError::DuplicateIdentity(_) => ErrorCode::DuplicateIdentity,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::PaymentNotCompleted => ErrorCode::PaymentNotCompleted,
            AppError::InvalidTransactionReference => ErrorCode::InvalidTransactionReference,
            AppError::PaymentVerificationUnavailable => ErrorCode::PaymentVerificationUnavailable,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
