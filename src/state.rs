use crate::{
    apis::{self, config::ConfigReader, ApiHolder},
    auth::{
        provider::{AuthModule, ProviderRegistry},
        token::{JwtTokenIssuer, SharedTokenIssuer},
    },
    config::AppConfig,
};

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<ProviderRegistry>,
    pub token_issuer: SharedTokenIssuer,
    pub apis: Arc<ApiHolder>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let token_issuer = JwtTokenIssuer::new(
            config.token_issuer.clone(),
            &config.token_secret,
            config.token_ttl()?,
        );

        let mut providers = ProviderRegistry::default();
        AuthModule::new(config.sign_in_options()).register(&mut providers, &config.providers())?;

        let apis = apis::registry(ConfigReader::from(config))?.build()?;

        tracing::info!(
            providers = providers.providers().count(),
            apis = apis.bindings().len(),
            "application state initialized"
        );

        Ok(Self {
            providers: Arc::new(providers),
            token_issuer: Arc::new(token_issuer),
            apis: Arc::new(apis),
        })
    }
}
