//! Credential store: bcrypt-hashed users keyed by unique username and email.

use anyhow::Context;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::User;

/// Creates a user. Uniqueness is left to the table constraints, so two racing
/// registrations cannot both succeed.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<(), AppError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username, email, and password are required".to_string(),
        ));
    }

    let password = password.to_owned();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt_cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            info!("Registered user '{username}'");
            Ok(())
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::DuplicateUser),
        Err(e) => Err(e.into()),
    }
}

/// Returns the user when `password` matches the stored hash.
/// Unknown usernames and wrong passwords are indistinguishable to the caller.
pub async fn verify(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    let Some(user) = user else {
        return Ok(None);
    };

    let password = password.to_owned();
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored_hash))
        .await
        .context("Password verification task failed")?
        // An unparsable stored hash can never match.
        .unwrap_or(false);

    Ok(matches.then_some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    const TEST_COST: u32 = 4;

    async fn user_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let pool = test_pool().await;
        register(&pool, "alice", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap();

        let user = verify(&pool, "alice", "pw123").await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plain_form() {
        let pool = test_pool().await;
        register(&pool, "alice", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap();

        let hash: String = sqlx::query_scalar("SELECT password_hash FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(hash, "pw123");
        assert!(hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_same_password_gets_different_salts() {
        let pool = test_pool().await;
        register(&pool, "alice", "a@x.com", "same", TEST_COST)
            .await
            .unwrap();
        register(&pool, "bob", "b@x.com", "same", TEST_COST)
            .await
            .unwrap();

        let hashes: Vec<String> = sqlx::query_scalar("SELECT password_hash FROM users")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_ne!(hashes[0], hashes[1]);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let pool = test_pool().await;
        register(&pool, "alice", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap();

        let err = register(&pool, "alice", "other@x.com", "pw456", TEST_COST)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let pool = test_pool().await;
        register(&pool, "alice", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap();

        let err = register(&pool, "alicia", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_never_matches() {
        let pool = test_pool().await;
        register(&pool, "alice", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap();

        for attempt in ["pw12", "pw1234", "PW123", "pw123 ", ""] {
            assert!(
                verify(&pool, "alice", attempt).await.unwrap().is_none(),
                "'{attempt}' should not match"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_none() {
        let pool = test_pool().await;
        assert!(verify(&pool, "ghost", "pw123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let pool = test_pool().await;
        let err = register(&pool, " ", "a@x.com", "pw123", TEST_COST)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(user_count(&pool).await, 0);
    }
}
