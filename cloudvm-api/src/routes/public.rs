// Public routes: banner, health check, API docs
use crate::app::AppState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs;
use crate::handlers::system;

/// Create public routes router
pub fn create_public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api_docs::ApiDoc::openapi()),
        )
        .route("/", get(system::root))
        .route("/health", get(system::health))
}
