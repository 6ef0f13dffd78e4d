use super::{config::ConfigReader, ApiError};

use url::Url;

/// Resolves plugin base URLs from a pattern containing `{{pluginId}}`.
#[derive(Debug, Clone)]
pub struct UrlPatternDiscovery {
    pattern: String,
}

impl UrlPatternDiscovery {
    const PLACEHOLDER: &'static str = "{{pluginId}}";

    pub fn compile<P>(pattern: P) -> Result<Self, ApiError>
    where
        P: Into<String>,
    {
        let pattern = pattern.into();

        if !pattern.contains(Self::PLACEHOLDER) {
            return Err(ApiError::InvalidUrl(pattern));
        }

        // Validate once with a dummy plugin id
        let discovery = Self { pattern };
        discovery.base_url("plugin")?;

        Ok(discovery)
    }

    /// Discovery for plugins mounted at `{backend.baseUrl}/api/{pluginId}`.
    pub fn from_config(config: &ConfigReader) -> Result<Self, ApiError> {
        let base_url = config.get_string("backend.baseUrl")?;

        Self::compile(format!(
            "{}/api/{}",
            base_url.trim_end_matches('/'),
            Self::PLACEHOLDER
        ))
    }

    pub fn base_url(&self, plugin_id: &str) -> Result<Url, ApiError> {
        let url = self.pattern.replace(Self::PLACEHOLDER, plugin_id);

        Url::parse(&url).map_err(|_| ApiError::InvalidUrl(url))
    }
}
