use crate::{
    extract::Json,
    model::{List, Response},
    ServiceResult,
};

use super::{
    profile::SignInInfo,
    provider::{ProviderInfo, ProviderRegistry},
    token::{SharedTokenIssuer, TokenError},
    SignInError,
};

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
};
use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    subject: String,
    ownership_entity_refs: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    token: String,
    identity: IdentityResponse,
    #[serde(with = "ts_seconds")]
    expires_at: DateTime<Utc>,
}

pub async fn sign_in(
    Path(provider_id): Path<String>,
    State(providers): State<Arc<ProviderRegistry>>,
    State(issuer): State<SharedTokenIssuer>,
    Json(info): Json<SignInInfo>,
) -> ServiceResult<Response<SignInResponse>> {
    let provider = providers
        .get(&provider_id)
        .ok_or_else(|| SignInError::ProviderNotFound(provider_id.clone()))?;

    let request = provider.sign_in(&info).map_err(|e| {
        tracing::warn!(provider_id = %provider_id, error = %e, "sign-in rejected");
        SignInError::from(e)
    })?;

    let session = issuer.issue(&request).map_err(SignInError::from)?;

    let response = SignInResponse {
        token: session.token,
        identity: IdentityResponse {
            subject: session.claims.sub,
            ownership_entity_refs: session.claims.ent,
        },
        expires_at: session.claims.exp,
    };

    Ok(Response::with_status(StatusCode::CREATED, response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    identity: IdentityResponse,
    issuer: String,
    #[serde(with = "ts_seconds")]
    issued_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    expires_at: DateTime<Utc>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

pub async fn session(
    State(issuer): State<SharedTokenIssuer>,
    headers: HeaderMap,
) -> ServiceResult<Response<SessionResponse>> {
    let token = bearer_token(&headers).ok_or(TokenError::Invalid)?;
    let claims = issuer.verify(token)?;

    let response = SessionResponse {
        identity: IdentityResponse {
            subject: claims.sub,
            ownership_entity_refs: claims.ent,
        },
        issuer: claims.iss,
        issued_at: claims.iat,
        expires_at: claims.exp,
    };

    Ok(Response::new(response))
}

pub async fn list_providers(
    State(providers): State<Arc<ProviderRegistry>>,
) -> ServiceResult<Response<List<ProviderInfo>>> {
    Ok(Response::new(List::new(providers.providers())))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn parse_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
