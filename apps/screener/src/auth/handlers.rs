//! Login, registration and logout routes.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::auth::credentials::{register, verify};
use crate::auth::session::token_from_headers;
use crate::errors::AppError;
use crate::state::AppState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// GET / and GET /login
pub async fn handle_login_page() -> Html<String> {
    Html(views::login_page())
}

/// GET /register
pub async fn handle_register_page() -> Html<String> {
    Html(views::register_page())
}

/// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    register(
        &state.db,
        form.username.trim(),
        form.email.trim(),
        &form.password,
        state.bcrypt_cost,
    )
    .await?;
    Ok(Redirect::to("/login"))
}

/// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let user = verify(&state.db, form.username.trim(), &form.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state
        .sessions
        .create(&state.db, &user.username)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [(header::SET_COOKIE, state.sessions.cookie(&token))],
        Redirect::to("/home"),
    ))
}

/// GET /logout
///
/// Always clears the cookie and lands on the login page, even without a session.
pub async fn handle_logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers) {
        if let Err(e) = state.sessions.destroy(&state.db, &token).await {
            warn!("Failed to end session on logout: {e}");
        }
    }

    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Redirect::to("/login"),
    )
}
