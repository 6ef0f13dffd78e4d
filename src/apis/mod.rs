//! Frontend API bindings.
//!
//! Each API is identified by an [`ApiRef`] and built by an [`ApiFactory`] from
//! the APIs it declares as dependencies. [`ApiRegistry::build`] resolves the
//! whole graph once and hands out an [`ApiHolder`].

pub mod config;
pub mod discovery;
pub mod oauth;
pub mod scm;

mod routes;

use crate::{
    auth::github,
    state::AppState,
};

use self::{
    config::{ConfigError, ConfigReader},
    discovery::UrlPatternDiscovery,
    oauth::{OAuth2, OAuth2Options, OAuthRequestManager},
    scm::{ScmAuth, ScmIntegrations},
};

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use axum::extract::FromRef;
use serde::Serialize;

pub use routes::routes;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no implementation available for {0}")]
    MissingApi(ApiRef),
    #[error("circular dependency: {0}")]
    Cycle(String),
    #[error("{0} is not of the requested type")]
    TypeMismatch(ApiRef),
    #[error("failed to instantiate {api}: {source}")]
    Factory {
        api: ApiRef,
        #[source]
        source: Box<ApiError>,
    },
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no auth provider available for {0}")]
    UnsupportedUrl(String),
}

/// Identifier of an API binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiRef(&'static str);

impl ApiRef {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ApiRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "apiRef{{{}}}", self.0)
    }
}

pub const CONFIG_API: ApiRef = ApiRef::new("core.config");
pub const DISCOVERY_API: ApiRef = ApiRef::new("core.discovery");
pub const OAUTH_REQUEST_API: ApiRef = ApiRef::new("core.oauthrequest");
pub const SCM_INTEGRATIONS_API: ApiRef = ApiRef::new("integration.scmintegrations");
pub const GITHUB_AUTH_API: ApiRef = ApiRef::new("core.auth.github");
pub const SCM_AUTH_API: ApiRef = ApiRef::new("integration.scmauth");

type AnyApi = Arc<dyn Any + Send + Sync>;

type FactoryFn = Box<dyn Fn(&ApiHolder) -> Result<AnyApi, ApiError> + Send + Sync>;

pub struct ApiFactory {
    api: ApiRef,
    deps: Vec<ApiRef>,
    factory: FactoryFn,
}

impl ApiFactory {
    pub fn new<T, D, F>(api: ApiRef, deps: D, factory: F) -> Self
    where
        T: Any + Send + Sync,
        D: IntoIterator<Item = ApiRef>,
        F: Fn(&ApiHolder) -> Result<T, ApiError> + Send + Sync + 'static,
    {
        Self {
            api,
            deps: deps.into_iter().collect(),
            factory: Box::new(move |deps: &ApiHolder| factory(deps).map(|api| Arc::new(api) as AnyApi)),
        }
    }

    pub fn api(&self) -> ApiRef {
        self.api
    }

    pub fn deps(&self) -> &[ApiRef] {
        &self.deps
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBinding {
    pub id: &'static str,
    pub deps: Vec<&'static str>,
}

/// Built APIs, looked up by reference and type.
#[derive(Default)]
pub struct ApiHolder {
    apis: HashMap<ApiRef, AnyApi>,
    bindings: Vec<ApiBinding>,
}

impl ApiHolder {
    pub fn get<T>(&self, api: ApiRef) -> Result<Arc<T>, ApiError>
    where
        T: Any + Send + Sync,
    {
        let instance = self
            .apis
            .get(&api)
            .cloned()
            .ok_or(ApiError::MissingApi(api))?;

        instance
            .downcast::<T>()
            .map_err(|_| ApiError::TypeMismatch(api))
    }

    pub fn bindings(&self) -> &[ApiBinding] {
        &self.bindings
    }
}

impl FromRef<AppState> for Arc<ApiHolder> {
    fn from_ref(state: &AppState) -> Self {
        state.apis.clone()
    }
}

/// Collects API factories and ready-made instances.
///
/// The latest registration of an API wins, whether factory or instance.
#[derive(Default)]
pub struct ApiRegistry {
    factories: HashMap<ApiRef, ApiFactory>,
    order: Vec<ApiRef>,
    instances: HashMap<ApiRef, AnyApi>,
}

impl ApiRegistry {
    pub fn register(&mut self, factory: ApiFactory) -> &mut Self {
        let api = factory.api();

        if self.instances.remove(&api).is_some() {
            tracing::debug!(api = %api, "replacing api instance with factory");
        }

        if self.factories.insert(api, factory).is_some() {
            tracing::debug!(api = %api, "replacing api factory");
        } else {
            self.order.push(api);
        }

        self
    }

    pub fn register_all<I>(&mut self, factories: I) -> &mut Self
    where
        I: IntoIterator<Item = ApiFactory>,
    {
        for factory in factories {
            self.register(factory);
        }

        self
    }

    pub fn with_instance<T>(&mut self, api: ApiRef, instance: T) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        if self.factories.remove(&api).is_some() {
            tracing::debug!(api = %api, "replacing api factory with instance");
            self.order.retain(|a| *a != api);
        }

        self.instances.insert(api, Arc::new(instance));
        self
    }

    /// Instantiates every registered factory along with its dependencies.
    pub fn build(&self) -> Result<ApiHolder, ApiError> {
        let mut built = self.instances.clone();
        let mut visiting = Vec::new();

        for api in &self.order {
            self.instantiate(*api, &mut built, &mut visiting)?;
        }

        let mut bindings = self
            .instances
            .keys()
            .map(|api| ApiBinding {
                id: api.id(),
                deps: Vec::new(),
            })
            .chain(self.order.iter().map(|api| ApiBinding {
                id: api.id(),
                deps: self.factories[api].deps().iter().map(ApiRef::id).collect(),
            }))
            .collect::<Vec<_>>();
        bindings.sort_by_key(|b| b.id);

        Ok(ApiHolder {
            apis: built,
            bindings,
        })
    }

    fn instantiate(
        &self,
        api: ApiRef,
        built: &mut HashMap<ApiRef, AnyApi>,
        visiting: &mut Vec<ApiRef>,
    ) -> Result<AnyApi, ApiError> {
        if let Some(instance) = built.get(&api) {
            return Ok(instance.clone());
        }

        let factory = self.factories.get(&api).ok_or(ApiError::MissingApi(api))?;

        if visiting.contains(&api) {
            let path = visiting
                .iter()
                .chain(std::iter::once(&api))
                .map(|a| a.id())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ApiError::Cycle(path));
        }

        visiting.push(api);
        let mut deps = ApiHolder::default();
        for dep in &factory.deps {
            let instance = self.instantiate(*dep, built, visiting)?;
            deps.apis.insert(*dep, instance);
        }
        visiting.pop();

        let instance = (factory.factory)(&deps).map_err(|e| ApiError::Factory {
            api,
            source: Box::new(e),
        })?;

        tracing::debug!(api = %api, "api instantiated");
        built.insert(api, instance.clone());

        Ok(instance)
    }
}

/// API bindings of the portal frontend.
pub fn apis() -> Vec<ApiFactory> {
    vec![
        ApiFactory::new(SCM_INTEGRATIONS_API, [CONFIG_API], |deps| {
            let config = deps.get::<ConfigReader>(CONFIG_API)?;
            ScmIntegrations::from_config(&config)
        }),
        ApiFactory::new(
            GITHUB_AUTH_API,
            [DISCOVERY_API, OAUTH_REQUEST_API, CONFIG_API],
            |deps| {
                OAuth2::create(OAuth2Options {
                    discovery: deps.get::<UrlPatternDiscovery>(DISCOVERY_API)?,
                    oauth_request: deps.get::<OAuthRequestManager>(OAUTH_REQUEST_API)?,
                    config: deps.get::<ConfigReader>(CONFIG_API)?,
                    provider: github::provider_info(),
                    default_scopes: github::DEFAULT_SCOPES,
                })
            },
        ),
        ScmAuth::create_default_api_factory(),
    ]
}

/// Registry with the core APIs provided by the host and the portal bindings.
pub fn registry(config: ConfigReader) -> Result<ApiRegistry, ApiError> {
    let discovery = UrlPatternDiscovery::from_config(&config)?;

    let mut registry = ApiRegistry::default();
    registry
        .with_instance(CONFIG_API, config)
        .with_instance(DISCOVERY_API, discovery)
        .with_instance(OAUTH_REQUEST_API, OAuthRequestManager::default())
        .register_all(apis());

    Ok(registry)
}
