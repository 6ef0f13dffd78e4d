use crate::auth::provider::ProviderInfo;

use super::{config::ConfigReader, discovery::UrlPatternDiscovery, ApiError};

use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use url::Url;

pub type Scopes = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoginRequest {
    pub provider_id: &'static str,
    pub scopes: Scopes,
    pub start_url: Url,
    pub requested_at: DateTime<Utc>,
}

/// Queue of login requests waiting for the user to sign in with a provider.
///
/// Requests for the same provider are merged into one.
#[derive(Debug, Default)]
pub struct OAuthRequestManager {
    pending: Mutex<Vec<PendingLoginRequest>>,
}

impl OAuthRequestManager {
    pub async fn enqueue(&self, request: PendingLoginRequest) {
        let mut pending = self.pending.lock().await;

        match pending
            .iter_mut()
            .find(|p| p.provider_id == request.provider_id)
        {
            Some(existing) => {
                existing.scopes.extend(request.scopes);
                existing.start_url = with_scope_param(&request.start_url, &existing.scopes);
            }
            None => pending.push(request),
        }
    }

    /// Removes and returns the pending requests for a provider.
    pub async fn take_pending(&self, provider_id: &str) -> Vec<PendingLoginRequest> {
        let mut pending = self.pending.lock().await;
        let (taken, rest): (Vec<_>, Vec<_>) = pending
            .drain(..)
            .partition(|p| p.provider_id == provider_id);
        *pending = rest;

        taken
    }
}

fn scope_param(scopes: &Scopes) -> String {
    scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Replaces the `scope` query parameter, keeping the others in place.
fn with_scope_param(url: &Url, scopes: &Scopes) -> Url {
    let pairs = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "scope" {
                scope_param(scopes)
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect::<Vec<_>>();

    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

pub struct OAuth2Options {
    pub discovery: Arc<UrlPatternDiscovery>,
    pub oauth_request: Arc<OAuthRequestManager>,
    pub config: Arc<ConfigReader>,
    pub provider: ProviderInfo,
    pub default_scopes: &'static [&'static str],
}

/// Frontend OAuth2 client for a single provider.
#[derive(Debug)]
pub struct OAuth2 {
    provider: ProviderInfo,
    default_scopes: Scopes,
    environment: String,
    auth_base_url: Url,
    requests: Arc<OAuthRequestManager>,
}

impl OAuth2 {
    const DEFAULT_ENVIRONMENT: &'static str = "development";

    pub fn create(options: OAuth2Options) -> Result<Self, ApiError> {
        let environment = options
            .config
            .get_optional_string("auth.environment")?
            .unwrap_or_else(|| Self::DEFAULT_ENVIRONMENT.to_string());

        let provider_key = format!("auth.providers.{}", options.provider.id);
        if !options.config.has(&provider_key) {
            tracing::warn!(
                provider_id = options.provider.id,
                "no provider config found, sign-in will fail until it is added"
            );
        }

        Ok(Self {
            provider: options.provider,
            default_scopes: options
                .default_scopes
                .iter()
                .map(|s| s.to_string())
                .collect(),
            environment,
            auth_base_url: options.discovery.base_url("auth")?,
            requests: options.oauth_request,
        })
    }

    pub fn provider(&self) -> ProviderInfo {
        self.provider
    }

    /// Splits a scope string on whitespace and commas, merged with the default scopes.
    pub fn scopes(&self, requested: &str) -> Scopes {
        requested
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .chain(self.default_scopes.iter().cloned())
            .collect()
    }

    /// URL of the auth backend endpoint starting the provider's login flow.
    pub fn start_url(&self, scopes: &Scopes) -> Result<Url, ApiError> {
        let mut url = self.auth_base_url.clone();

        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.auth_base_url.to_string()))?
            .pop_if_empty()
            .push(self.provider.id)
            .push("start");

        url.query_pairs_mut()
            .append_pair("scope", &scope_param(scopes))
            .append_pair("env", &self.environment);

        Ok(url)
    }

    /// Queues a login request with the given additional scopes.
    pub async fn request_login(&self, scope: &str) -> Result<Url, ApiError> {
        let scopes = self.scopes(scope);
        let start_url = self.start_url(&scopes)?;

        self.requests
            .enqueue(PendingLoginRequest {
                provider_id: self.provider.id,
                scopes,
                start_url: start_url.clone(),
                requested_at: Utc::now(),
            })
            .await;

        Ok(start_url)
    }
}
