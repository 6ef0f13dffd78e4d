use crate::{
    catalog::EntityRef,
    error::ErrorResponse,
    model::Status,
    state::AppState,
};

use std::{fmt, sync::Arc};

use axum::{extract::FromRef, http::StatusCode};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use jsonwebtoken::{
    errors::{Error as JwtError, ErrorKind},
    Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

/// Leeway for token validation in seconds.
/// This is used to account for clock skew.
pub const LEEWAY: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,
    #[error("token is not yet valid")]
    Immature,
    #[error("token is invalid")]
    Invalid,
    #[error("token subject is not a valid entity reference: {0}")]
    InvalidSubject(String),
    #[error("token could not be encoded: {0}")]
    Encoding(JwtError),
    #[error("token expiry is out of range")]
    Expiry,
}

impl From<JwtError> for TokenError {
    fn from(error: JwtError) -> Self {
        match *error.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::Immature,
            _ => {
                error!(error = %error, "jsonwebtoken error");
                Self::Invalid
            }
        }
    }
}

impl ErrorResponse for TokenError {
    type Response = Status;

    fn status_code(&self) -> StatusCode {
        match self {
            TokenError::Expired | TokenError::Immature | TokenError::Invalid => {
                StatusCode::UNAUTHORIZED
            }
            TokenError::InvalidSubject(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TokenError::Encoding(_) | TokenError::Expiry => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> Self::Response {
        let msg = match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %self, "internal error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        Status::new(self.status_code(), msg)
    }
}

impl axum::response::IntoResponse for TokenError {
    fn into_response(self) -> axum::response::Response {
        self.error_response().into_response()
    }
}

/// Claims a sign-in resolver asks the issuer to put into the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject, the user entity reference.
    pub sub: String,
    /// Ownership entity references.
    pub ent: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub claims: IdentityClaims,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub jti: Uuid,
    pub iss: String,
    pub aud: String,
    #[serde(with = "ts_seconds")]
    pub exp: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub nbf: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub iat: DateTime<Utc>,
    pub sub: String,
    pub ent: Vec<String>,
}

impl SessionClaims {
    pub const TYPE: &'static str = "session";

    const AUDIENCE: &'static str = "portal";

    fn new(issuer: &str, ttl: Duration, claims: IdentityClaims) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).ok_or(TokenError::Expiry)?;

        Ok(Self {
            jti: Uuid::new_v4(),
            iss: issuer.to_string(),
            aud: Self::AUDIENCE.into(),
            exp,
            nbf: now,
            iat: now,
            sub: claims.sub,
            ent: claims.ent,
        })
    }

    fn validation(alg: Algorithm, issuer: &str) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = LEEWAY;
        validation.set_required_spec_claims(&["jti", "exp", "nbf", "sub", "aud", "iat", "iss"]);
        validation.set_audience(&[Self::AUDIENCE]);
        validation.set_issuer(&[issuer]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation
    }
}

/// A minted session credential.
#[derive(Debug)]
pub struct SessionToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Capability to mint session tokens for a resolved identity.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, request: &TokenRequest) -> Result<SessionToken, TokenError>;

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;
}

pub type SharedTokenIssuer = Arc<dyn TokenIssuer>;

impl FromRef<AppState> for SharedTokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.token_issuer.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret is not valid base64url")]
    InvalidEncoding,
    #[error("secret must be at least {min} bytes, got {got}")]
    TooShort { min: usize, got: usize },
}

/// Symmetric signing secret, configured as an unpadded base64url string.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub const MIN_SIZE: usize = 256 / 8;

    pub fn from_base64url(encoded: &str) -> Result<Self, SecretError> {
        let bytes =
            Base64UrlUnpadded::decode_vec(encoded).map_err(|_| SecretError::InvalidEncoding)?;

        Self::try_from(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for SigningSecret {
    type Error = SecretError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() < Self::MIN_SIZE {
            return Err(SecretError::TooShort {
                min: Self::MIN_SIZE,
                got: bytes.len(),
            });
        }

        Ok(Self(bytes))
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

impl<'de> Deserialize<'de> for SigningSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64url(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Issues HMAC signed JWT session tokens.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    alg: Algorithm,
    issuer: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtTokenIssuer {
    pub const DEFAULT_TTL_MIN: i64 = 60;

    pub fn new<I>(issuer: I, secret: &SigningSecret, ttl: Duration) -> Self
    where
        I: Into<String>,
    {
        Self {
            alg: Algorithm::HS256,
            issuer: issuer.into(),
            ttl,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, request: &TokenRequest) -> Result<SessionToken, TokenError> {
        let subject = &request.claims.sub;
        subject
            .parse::<EntityRef>()
            .map_err(|_| TokenError::InvalidSubject(subject.clone()))?;

        let claims = SessionClaims::new(&self.issuer, self.ttl, request.claims.clone())?;

        let mut header = Header::new(self.alg);
        header.typ = Some(SessionClaims::TYPE.to_string());

        let token =
            jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(TokenError::Encoding)?;

        tracing::debug!(jti = %claims.jti, exp = %claims.exp, "session token issued");

        Ok(SessionToken { token, claims })
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let header = jsonwebtoken::decode_header(token)?;
        if header.typ.as_deref() != Some(SessionClaims::TYPE) {
            return Err(TokenError::Invalid);
        }

        let validation = SessionClaims::validation(self.alg, &self.issuer);
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)?;

        Ok(data.claims)
    }
}
