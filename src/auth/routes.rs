use crate::{routes::RouteConfig, state::AppState};

use super::handler;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};

/// Auth routes
pub fn routes(config: RouteConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/providers",
            get(handler::list_providers)
                .options(|| async { StatusCode::NO_CONTENT })
                .route_layer(
                    config
                        .cors
                        .clone()
                        .allow_methods([Method::GET, Method::OPTIONS]),
                ),
        )
        .route(
            "/session",
            get(handler::session)
                .options(|| async { StatusCode::NO_CONTENT })
                .route_layer(
                    config
                        .cors
                        .clone()
                        .allow_methods([Method::GET, Method::OPTIONS])
                        .allow_headers([header::AUTHORIZATION]),
                ),
        )
        .route(
            "/:provider/sign-in",
            post(handler::sign_in)
                .options(|| async { StatusCode::NO_CONTENT })
                .route_layer(
                    config
                        .cors
                        .allow_methods([Method::POST, Method::OPTIONS])
                        .allow_headers([header::CONTENT_TYPE]),
                ),
        )
}
