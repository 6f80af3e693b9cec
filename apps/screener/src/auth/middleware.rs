//! Session gate for protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::auth::session::token_from_headers;
use crate::state::AppState;

/// Username of the authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct SessionUser(pub String);

/// Resolves the session cookie to a `SessionUser`.
/// Requests without a live session are redirected to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = token_from_headers(req.headers()) else {
        return Redirect::to("/login").into_response();
    };

    match state.sessions.resolve(&state.db, &token).await {
        Ok(username) => {
            req.extensions_mut().insert(SessionUser(username));
            next.run(req).await
        }
        Err(e) => {
            debug!("Rejected session: {e}");
            Redirect::to("/login").into_response()
        }
    }
}
