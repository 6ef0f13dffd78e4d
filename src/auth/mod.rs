pub mod github;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod token;

mod handler;
mod routes;

use crate::{error::ErrorResponse, model::Status};

use self::{resolver::IdentityResolutionError, token::TokenError};

use axum::http::StatusCode;

pub use routes::routes;

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("unknown auth provider \"{0}\"")]
    ProviderNotFound(String),
    #[error("{0}")]
    Rejected(#[from] IdentityResolutionError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl ErrorResponse for SignInError {
    type Response = Status;

    fn status_code(&self) -> StatusCode {
        match self {
            SignInError::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            SignInError::Rejected(_) => StatusCode::UNAUTHORIZED,
            SignInError::Token(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> Self::Response {
        match self {
            SignInError::Token(e) => e.error_response(),
            _ => Status::new(self.status_code(), self.to_string()),
        }
    }
}

impl axum::response::IntoResponse for SignInError {
    fn into_response(self) -> axum::response::Response {
        self.error_response().into_response()
    }
}
