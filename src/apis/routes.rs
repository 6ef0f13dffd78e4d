use crate::{
    model::{List, Response},
    routes::RouteConfig,
    state::AppState,
    ServiceResult,
};

use super::{ApiBinding, ApiHolder};

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::get,
    Router,
};

/// API binding routes
pub fn routes(config: RouteConfig) -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_bindings)
            .options(|| async { StatusCode::NO_CONTENT })
            .route_layer(config.cors.allow_methods([Method::GET, Method::OPTIONS])),
    )
}

async fn list_bindings(
    State(apis): State<Arc<ApiHolder>>,
) -> ServiceResult<Response<List<ApiBinding>>> {
    Ok(Response::new(List::new(apis.bindings().iter().cloned())))
}
