use crate::{
    auth::{
        resolver::SignInOptions,
        token::{JwtTokenIssuer, SigningSecret},
    },
    error::Error,
    utils::serde::deserialize_vec_from_string,
};

use std::net::{IpAddr, Ipv4Addr};

use axum::http::HeaderValue;
use chrono::Duration;
use serde::Deserialize;
use url::Url;

const fn default_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

const fn default_port() -> u16 {
    8080
}

const MAX_TOKEN_TTL_MIN: i64 = 7 * 24 * 60;

const fn default_token_ttl() -> i64 {
    JwtTokenIssuer::DEFAULT_TTL_MIN
}

fn default_token_issuer() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    // HTTP server
    #[serde(default = "default_addr")]
    pub server_addr: IpAddr,
    #[serde(default = "default_port")]
    pub server_port: u16,
    #[serde(default, deserialize_with = "deserialize_vec_from_string")]
    pub cors_allowed_origins: Vec<HeaderValue>,

    // Portal
    pub backend_base_url: Url,
    #[serde(default = "default_environment")]
    pub auth_environment: String,

    // Token
    pub token_secret: SigningSecret,
    #[serde(default = "default_token_issuer")]
    pub token_issuer: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_min: i64,

    // GitHub OAuth
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,

    // Integrations
    #[serde(default, deserialize_with = "deserialize_vec_from_string")]
    pub integrations_github_hosts: Vec<String>,

    // Logs raw provider payloads, which contain personal data
    #[serde(default)]
    pub log_sign_in_payloads: bool,
}

impl AppConfig {
    pub fn providers(&self) -> ProvidersConfig {
        ProvidersConfig {
            github: self
                .github_client_id
                .clone()
                .map(|client_id| OAuthClientConfig {
                    client_id,
                    client_secret: self.github_client_secret.clone(),
                }),
        }
    }

    /// Session token lifetime, at least one minute and at most a week.
    pub fn token_ttl(&self) -> crate::Result<Duration> {
        if !(1..=MAX_TOKEN_TTL_MIN).contains(&self.token_ttl_min) {
            return Err(Error::TokenTtl {
                value: self.token_ttl_min,
                max: MAX_TOKEN_TTL_MIN,
            });
        }

        Ok(Duration::minutes(self.token_ttl_min))
    }

    pub fn sign_in_options(&self) -> SignInOptions {
        SignInOptions {
            log_payloads: self.log_sign_in_payloads,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Configured auth providers, `auth.providers.*`.
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    pub github: Option<OAuthClientConfig>,
}
