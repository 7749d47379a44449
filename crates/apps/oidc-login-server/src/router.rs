use crate::auth;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Where a completed login lands
pub const SUCCESS_PATH: &str = "/success";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route("/auth/{provider}", get(auth::begin_auth))
        .route("/auth/{provider}/callback", get(auth::complete_auth))
        .route(SUCCESS_PATH, get(auth::show_success))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
