//! Shopfront Server: the HTTP surface over the commerce and account
//! services.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode, header};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod config;
pub mod error;
pub mod extract;
pub mod mail;
pub mod response;
pub mod routes;
pub mod state;
pub mod upload;

use error::ApiError;
use state::AppState;

/// JSON body ceiling outside the upload routes.
pub const JSON_BODY_LIMIT: usize = 16 * 1024;

fn cors(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(origin = %origin, "Ignoring invalid CORS origin");
            layer
        }
    }
}

async fn route_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let origin = state.web.cors_origin.clone();
    Router::new()
        .nest("/api/v1", routes::api())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors(&origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `app` plus static serving of uploaded media under `/media`.
pub fn app_with_media(state: AppState, media_root: &std::path::Path) -> Router {
    app(state).nest_service("/media", ServeDir::new(media_root))
}
