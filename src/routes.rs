use crate::{apis, auth, state::AppState};

use axum::Router;
use tower_http::cors::CorsLayer;

/// Service routes
pub fn routes(state: AppState, config: RouteConfig) -> Router<()> {
    Router::new()
        .nest("/auth", auth::routes(config.clone()))
        .nest("/apis", apis::routes(config))
        .with_state(state)
}

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub cors: CorsLayer,
}
