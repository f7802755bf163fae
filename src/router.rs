use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

/// API routes, plus the frontend bundle when `static_dir` is given.
pub fn build_router(state: AppState, static_dir: Option<&str>) -> Router {
    let api = Router::new()
        .route("/api/analyze", post(handlers::analyze_email))
        .route("/api/send", post(handlers::send_email))
        .route("/api/health", get(handlers::health_check))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => {
            tracing::info!("Serving frontend from '{}'", dir);
            api.fallback_service(ServeDir::new(dir))
        }
        None => api,
    };

    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
