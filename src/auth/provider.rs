use crate::{config::ProvidersConfig, state::AppState};

use super::{
    github::{self, GitHubAuthenticator},
    profile::SignInInfo,
    resolver::{GitHubSignInResolver, IdentityResolutionError, SignInOptions, SignInResolver},
    token::TokenRequest,
};

use std::{collections::BTreeMap, sync::Arc};

use axum::extract::FromRef;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider \"{0}\" is already registered")]
    AlreadyRegistered(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub default_scopes: &'static [&'static str],
}

pub trait Authenticator: Send + Sync {
    fn provider_info(&self) -> ProviderInfo;
}

/// OAuth provider contributed to the auth plugin, pairing an authenticator
/// with the resolver that maps its sign-in results to user identities.
pub struct OAuthProviderFactory {
    info: ProviderInfo,
    sign_in_resolver: Arc<dyn SignInResolver>,
}

impl OAuthProviderFactory {
    pub fn new<A>(authenticator: &A, sign_in_resolver: Arc<dyn SignInResolver>) -> Self
    where
        A: Authenticator,
    {
        Self {
            info: authenticator.provider_info(),
            sign_in_resolver,
        }
    }

    pub fn info(&self) -> ProviderInfo {
        self.info
    }

    pub fn sign_in(&self, info: &SignInInfo) -> Result<TokenRequest, IdentityResolutionError> {
        self.sign_in_resolver.resolve(info)
    }
}

/// Extension point auth modules register their providers with.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<OAuthProviderFactory>>,
}

impl ProviderRegistry {
    pub fn register_provider<I>(
        &mut self,
        provider_id: I,
        factory: OAuthProviderFactory,
    ) -> Result<(), ProviderError>
    where
        I: Into<String>,
    {
        let provider_id = provider_id.into();

        if self.providers.contains_key(&provider_id) {
            return Err(ProviderError::AlreadyRegistered(provider_id));
        }

        self.providers.insert(provider_id, Arc::new(factory));

        Ok(())
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<OAuthProviderFactory>> {
        self.providers.get(provider_id).cloned()
    }

    pub fn providers(&self) -> impl Iterator<Item = ProviderInfo> + '_ {
        self.providers.values().map(|p| p.info())
    }
}

impl FromRef<AppState> for Arc<ProviderRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.providers.clone()
    }
}

/// Backend module customizing the GitHub sign-in of the auth plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthModule {
    options: SignInOptions,
}

impl AuthModule {
    /// Plugin the module extends.
    pub const PLUGIN_ID: &'static str = "auth";
    pub const MODULE_ID: &'static str = "custom-github-auth";

    pub fn new(options: SignInOptions) -> Self {
        Self { options }
    }

    /// Registers the GitHub provider, if it is configured.
    pub fn register(
        &self,
        registry: &mut ProviderRegistry,
        config: &ProvidersConfig,
    ) -> Result<(), ProviderError> {
        if config.github.is_none() {
            tracing::warn!(
                plugin_id = Self::PLUGIN_ID,
                module_id = Self::MODULE_ID,
                provider_id = github::PROVIDER_ID,
                "provider is not configured, skipping registration"
            );
            return Ok(());
        }

        let resolver = Arc::new(GitHubSignInResolver::new(self.options));
        let factory = OAuthProviderFactory::new(&GitHubAuthenticator, resolver);

        registry.register_provider(github::PROVIDER_ID, factory)?;

        tracing::info!(
            plugin_id = Self::PLUGIN_ID,
            module_id = Self::MODULE_ID,
            provider_id = github::PROVIDER_ID,
            "auth provider registered"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::OAuthClientConfig;

    fn github_config() -> ProvidersConfig {
        ProvidersConfig {
            github: Some(OAuthClientConfig {
                client_id: "client-id".into(),
                client_secret: Some("client-secret".into()),
            }),
        }
    }

    #[test]
    fn register_github_provider() {
        let mut registry = ProviderRegistry::default();
        AuthModule::default()
            .register(&mut registry, &github_config())
            .unwrap();

        let provider = registry.get("github").unwrap();
        assert_eq!(provider.info().title, "GitHub");
        assert_eq!(provider.info().default_scopes, ["read:user", "user:email"]);

        let info: SignInInfo = serde_json::from_str(r#"{"profile": {"login": "alice"}}"#).unwrap();
        let request = provider.sign_in(&info).unwrap();
        assert_eq!(request.claims.sub, "user:default/alice");
    }

    #[test]
    fn skip_unconfigured_provider() {
        let mut registry = ProviderRegistry::default();
        AuthModule::default()
            .register(&mut registry, &ProvidersConfig::default())
            .unwrap();

        assert!(registry.get("github").is_none());
        assert_eq!(registry.providers().count(), 0);
    }

    #[test]
    fn reject_duplicate_provider() {
        let mut registry = ProviderRegistry::default();
        let module = AuthModule::default();
        module.register(&mut registry, &github_config()).unwrap();

        assert_eq!(
            module.register(&mut registry, &github_config()),
            Err(ProviderError::AlreadyRegistered("github".into()))
        );
    }
}
