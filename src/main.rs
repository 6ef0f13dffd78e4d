mod apis;
mod auth;
mod catalog;
mod config;
mod error;
mod extract;
mod model;
mod routes;
mod state;
mod utils;

use crate::{
    config::AppConfig,
    error::handle_error,
    routes::RouteConfig,
    state::AppState,
};

use std::{iter::once, net::SocketAddr, time::Duration};

use axum::{error_handling::HandleErrorLayer, http::header::AUTHORIZATION, Router, Server};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    sensitive_headers::SetSensitiveHeadersLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub type Result<T> = std::result::Result<T, error::Error>;

pub(crate) type ServiceResult<T> = std::result::Result<T, error::ServiceError>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let prefix = envy::prefixed("PORTAL_");

    let app_config: AppConfig = if dotenv::dotenv().is_ok() {
        prefix.from_iter(dotenv::vars())?
    } else {
        prefix.from_env()?
    };

    if app_config.log_sign_in_payloads {
        tracing::warn!("sign-in payload logging is enabled, logs will contain personal data");
    }

    let state = AppState::from_config(&app_config)?;

    let route_config = RouteConfig {
        cors: CorsLayer::new().allow_origin(AllowOrigin::list(
            app_config.cors_allowed_origins.clone(),
        )),
    };

    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_error))
        .load_shed()
        .concurrency_limit(1024)
        .timeout(Duration::from_secs(60))
        .layer(SetSensitiveHeadersLayer::new(once(AUTHORIZATION)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(
                    DefaultOnResponse::new()
                        .include_headers(true)
                        .latency_unit(LatencyUnit::Micros),
                ),
        );

    let routes = Router::new()
        .nest("/v1", routes::routes(state, route_config))
        .layer(middleware.into_inner());

    let addr = SocketAddr::from((app_config.server_addr, app_config.server_port));
    let server = Server::bind(&addr)
        .serve(routes.into_make_service())
        .with_graceful_shutdown(utils::shutdown_signal());

    tracing::debug!(
        ipAddress =? addr.ip(),
        port =? addr.port(),
        "HTTP server started"
    );

    server.await?;

    Ok(())
}
