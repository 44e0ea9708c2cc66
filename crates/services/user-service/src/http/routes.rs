//! Route configuration.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::ServiceConfig;

use crate::http::handlers::{health_routes, user_routes};
use crate::http::middleware;
use crate::http::openapi::ApiDoc;
use crate::http::state::AppState;

/// Create the main router with all routes and layers.
pub fn create_router(state: AppState, config: &ServiceConfig) -> Router {
    let router = Router::new()
        .merge(health_routes())
        .merge(user_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    middleware::apply(router, config.request_timeout())
}
