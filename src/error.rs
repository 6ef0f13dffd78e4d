use crate::{
    apis::ApiError,
    auth::{provider::ProviderError, token::TokenError, SignInError},
    model::Status,
};

use axum::{http::StatusCode, BoxError};
use tracing::error;

/// Application error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Envy error: {0}")]
    Envy(#[from] envy::Error),
    #[error("token TTL must be between 1 and {max} minutes, got {value}")]
    TokenTtl { value: i64, max: i64 },
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),
}

/// Request error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Sign-in error
    #[error("sign-in error: {0}")]
    SignIn(#[from] SignInError),

    /// Session token error
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl axum::response::IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceError::SignIn(e) => e.into_response(),
            ServiceError::Token(e) => e.into_response(),
        }
    }
}

pub trait ErrorResponse
where
    Self: std::error::Error,
{
    type Response: axum::response::IntoResponse;

    fn status_code(&self) -> StatusCode;

    fn error_response(&self) -> Self::Response;
}

pub async fn handle_error(error: BoxError) -> Status {
    if error.is::<tower::timeout::error::Elapsed>() {
        return Status::new(StatusCode::REQUEST_TIMEOUT, "request timed out");
    }

    if error.is::<tower::load_shed::error::Overloaded>() {
        return Status::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "service is overloaded, try again later",
        );
    }

    error!(error = %error, "internal error");
    Status::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
