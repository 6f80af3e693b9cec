pub mod health;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};

use crate::analysis::handlers::{handle_analyze, handle_home, handle_work};
use crate::auth::handlers::{
    handle_login, handle_login_page, handle_logout, handle_register, handle_register_page,
};
use crate::auth::middleware::require_session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_mb * 1024 * 1024;

    let public_routes = Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(handle_login_page))
        .route("/login", get(handle_login_page).post(handle_login))
        .route("/register", get(handle_register_page).post(handle_register))
        .route("/logout", get(handle_logout));

    // Session-gated: no live session means a redirect to /login.
    let protected_routes = Router::new()
        .route("/home", get(handle_home).post(handle_analyze))
        .route("/work", get(handle_work))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
