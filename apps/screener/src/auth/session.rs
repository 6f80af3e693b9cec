//! Server-side sessions.
//!
//! Each login inserts a row into `sessions` mapping a random id to a username.
//! The browser only holds a signed token naming that id, so a session ends as
//! soon as its row is deleted, whatever the token says.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::models::session::SessionRow;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("session not found or expired")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sid: String,
    exp: i64,
}

/// Issues, resolves and revokes login sessions. Built once from `Config`.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionManager {
    pub fn new(config: &Config) -> Self {
        let secret = config.session_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::hours(config.session_ttl_hours),
            secure_cookies: config.secure_cookies,
        }
    }

    /// Starts a session for `username` and returns the signed cookie token.
    pub async fn create(&self, pool: &SqlitePool, username: &str) -> Result<String, SessionError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let purged = purge_expired(pool, now).await?;
        if purged > 0 {
            info!("Purged {purged} expired session(s)");
        }

        sqlx::query("INSERT INTO sessions (id, username, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(username)
            .bind(now)
            .bind(expires_at)
            .execute(pool)
            .await?;

        let claims = SessionClaims {
            sid: id,
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;

        info!("Session started for '{username}'");
        Ok(token)
    }

    /// Returns the username behind a cookie token.
    pub async fn resolve(&self, pool: &SqlitePool, token: &str) -> Result<String, SessionError> {
        let claims = self.decode(token)?;

        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = ?")
            .bind(&claims.sid)
            .fetch_optional(pool)
            .await?
            .ok_or(SessionError::NotFound)?;

        if row.expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(&row.id)
                .execute(pool)
                .await?;
            return Err(SessionError::NotFound);
        }

        Ok(row.username)
    }

    /// Deletes the session row behind `token`. Unknown sessions are not an error.
    pub async fn destroy(&self, pool: &SqlitePool, token: &str) -> Result<(), SessionError> {
        let claims = self.decode(token)?;
        let deleted = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(&claims.sid)
            .execute(pool)
            .await?
            .rows_affected();

        if deleted > 0 {
            info!("Session {} ended", claims.sid);
        }
        Ok(())
    }

    pub fn cookie(&self, token: &str) -> String {
        self.cookie_with(token, self.ttl.num_seconds())
    }

    pub fn clear_cookie(&self) -> String {
        self.cookie_with("", 0)
    }

    fn cookie_with(&self, value: &str, max_age: i64) -> String {
        let secure = if self.secure_cookies { "; Secure" } else { "" };
        format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure}")
    }

    fn decode(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Deletes every session that expired at or before `now`.
async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Reads the session token from the `Cookie` header, if present and non-empty.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
