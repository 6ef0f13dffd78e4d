use super::{
    config::ConfigReader,
    oauth::{OAuth2, Scopes},
    ApiError, ApiFactory, GITHUB_AUTH_API, SCM_AUTH_API,
};

use std::sync::Arc;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubIntegration {
    pub host: String,
    pub api_base_url: Url,
}

impl GithubIntegration {
    const DEFAULT_HOST: &'static str = "github.com";

    fn new(host: String, api_base_url: Option<&str>) -> Result<Self, ApiError> {
        let api_base_url = match api_base_url {
            Some(url) => url.to_string(),
            None if host == Self::DEFAULT_HOST => "https://api.github.com".to_string(),
            None => format!("https://{host}/api/v3"),
        };
        let api_base_url =
            Url::parse(&api_base_url).map_err(|_| ApiError::InvalidUrl(api_base_url))?;

        Ok(Self { host, api_base_url })
    }

    fn from_config(config: &ConfigReader) -> Result<Self, ApiError> {
        let host = config.get_string("host")?;
        let api_base_url = config.get_optional_string("apiBaseUrl")?;

        Self::new(host, api_base_url.as_deref())
    }
}

/// SCM integrations read from `integrations.github`.
#[derive(Debug, Clone)]
pub struct ScmIntegrations {
    github: Vec<GithubIntegration>,
}

impl ScmIntegrations {
    /// Reads the configured integrations; public GitHub is always available.
    pub fn from_config(config: &ConfigReader) -> Result<Self, ApiError> {
        let mut github = config
            .get_optional_config_array("integrations.github")?
            .iter()
            .map(GithubIntegration::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        if !github.iter().any(|i| i.host == GithubIntegration::DEFAULT_HOST) {
            github.push(GithubIntegration::new(
                GithubIntegration::DEFAULT_HOST.to_string(),
                None,
            )?);
        }

        Ok(Self { github })
    }

    pub fn github(&self) -> &[GithubIntegration] {
        &self.github
    }

    pub fn by_host(&self, host: &str) -> Option<&GithubIntegration> {
        self.github.iter().find(|i| i.host.eq_ignore_ascii_case(host))
    }

    pub fn by_url(&self, url: &str) -> Option<&GithubIntegration> {
        let url = Url::parse(url).ok()?;
        self.by_host(url.host_str()?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScmAuthOptions {
    /// Request write access to the repository.
    pub repo_write: bool,
    pub additional_scope: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmCredentialsRequest {
    pub host: String,
    pub provider_id: &'static str,
    pub scopes: Scopes,
    pub login_url: Url,
}

struct ScopeMapping {
    default: &'static [&'static str],
    repo_write: &'static [&'static str],
}

const GITHUB_SCOPES: ScopeMapping = ScopeMapping {
    default: &["repo", "read:org", "read:user"],
    repo_write: &["gist"],
};

struct ScmAuthProvider {
    host: String,
    api: Arc<OAuth2>,
    scopes: ScopeMapping,
}

/// Picks the OAuth client and scopes needed to access a repository URL.
pub struct ScmAuth {
    providers: Vec<ScmAuthProvider>,
}

impl ScmAuth {
    pub fn for_github(api: Arc<OAuth2>, host: Option<&str>) -> Self {
        Self {
            providers: vec![ScmAuthProvider {
                host: host.unwrap_or(GithubIntegration::DEFAULT_HOST).to_string(),
                api,
                scopes: GITHUB_SCOPES,
            }],
        }
    }

    pub fn merge<I>(auths: I) -> Self
    where
        I: IntoIterator<Item = ScmAuth>,
    {
        Self {
            providers: auths.into_iter().flat_map(|a| a.providers).collect(),
        }
    }

    /// Default binding using the GitHub OAuth client for github.com.
    pub fn create_default_api_factory() -> ApiFactory {
        ApiFactory::new(SCM_AUTH_API, [GITHUB_AUTH_API], |deps| {
            let github = deps.get::<OAuth2>(GITHUB_AUTH_API)?;
            Ok(ScmAuth::merge([ScmAuth::for_github(github, None)]))
        })
    }

    fn provider_for(&self, url: &str) -> Option<&ScmAuthProvider> {
        let url = Url::parse(url).ok()?;
        let host = url.host_str()?;

        self.providers
            .iter()
            .find(|p| p.host.eq_ignore_ascii_case(host))
    }

    pub fn is_url_supported(&self, url: &str) -> bool {
        self.provider_for(url).is_some()
    }

    /// Queues a login with the provider responsible for `url` and returns its request.
    pub async fn credentials_request(
        &self,
        url: &str,
        options: ScmAuthOptions,
    ) -> Result<ScmCredentialsRequest, ApiError> {
        let provider = self
            .provider_for(url)
            .ok_or_else(|| ApiError::UnsupportedUrl(url.to_string()))?;

        let mut scopes = provider.scopes.default.to_vec();
        if options.repo_write {
            scopes.extend_from_slice(provider.scopes.repo_write);
        }
        let mut scope = scopes.join(" ");
        for extra in &options.additional_scope {
            scope.push(' ');
            scope.push_str(extra);
        }

        let login_url = provider.api.request_login(&scope).await?;

        Ok(ScmCredentialsRequest {
            host: provider.host.clone(),
            provider_id: provider.api.provider().id,
            scopes: provider.api.scopes(&scope),
            login_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::apis::oauth::{tests::github_auth, OAuthRequestManager};

    use serde_json::json;

    #[test]
    fn integrations_from_config() {
        let config = ConfigReader::new(json!({
            "integrations": { "github": [{ "host": "ghe.example.com" }] }
        }));
        let integrations = ScmIntegrations::from_config(&config).unwrap();

        assert_eq!(integrations.github().len(), 2);
        assert_eq!(
            integrations
                .by_host("ghe.example.com")
                .unwrap()
                .api_base_url
                .as_str(),
            "https://ghe.example.com/api/v3"
        );
        assert_eq!(
            integrations
                .by_url("https://GitHub.com/backstage/backstage")
                .unwrap()
                .api_base_url
                .as_str(),
            "https://api.github.com/"
        );
        assert!(integrations.by_url("https://gitlab.com/group/repo").is_none());
        assert!(integrations.by_url("not a url").is_none());
    }

    #[test]
    fn integrations_without_config() {
        let integrations = ScmIntegrations::from_config(&ConfigReader::default()).unwrap();

        assert_eq!(integrations.github().len(), 1);
        assert_eq!(integrations.github()[0].host, "github.com");
    }

    #[tokio::test]
    async fn github_credentials_request() {
        let requests = Arc::new(OAuthRequestManager::default());
        let auth = ScmAuth::for_github(Arc::new(github_auth(requests.clone())), None);

        assert!(auth.is_url_supported("https://github.com/backstage/backstage"));
        assert!(!auth.is_url_supported("https://ghe.example.com/org/repo"));

        let request = auth
            .credentials_request(
                "https://github.com/backstage/backstage",
                ScmAuthOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(request.provider_id, "github");
        assert_eq!(request.host, "github.com");
        assert!(request.scopes.contains("repo"));
        assert!(request.scopes.contains("read:org"));
        assert!(!request.scopes.contains("gist"));

        let request = auth
            .credentials_request(
                "https://github.com/backstage/backstage",
                ScmAuthOptions {
                    repo_write: true,
                    additional_scope: vec!["workflow".into()],
                },
            )
            .await
            .unwrap();
        assert!(request.scopes.contains("gist"));
        assert!(request.scopes.contains("workflow"));

        assert_eq!(requests.take_pending("github").await.len(), 1);
    }

    #[tokio::test]
    async fn reject_unsupported_url() {
        let auth = ScmAuth::for_github(Arc::new(github_auth(Arc::default())), None);

        let res = auth
            .credentials_request("https://gitlab.com/group/repo", ScmAuthOptions::default())
            .await;

        assert!(matches!(res, Err(ApiError::UnsupportedUrl(_))));
    }
}
