use anyhow::{bail, Context, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://screener.db?mode=rwc";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MIN_SESSION_SECRET_LEN: usize = 16;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout_secs: u64,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub max_upload_mb: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let session_secret = require_env("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes long");
        }

        Ok(Config {
            database_url: optional_env("DATABASE_URL", DEFAULT_DATABASE_URL),
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: optional_env("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            session_secret,
            session_ttl_hours: parse_env("SESSION_TTL_HOURS", 24)?,
            secure_cookies: parse_env("SECURE_COOKIES", false)?,
            max_upload_mb: parse_env("MAX_UPLOAD_MB", 20)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by router tests. Never read from the environment.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            llm_timeout_secs: 1,
            session_secret: "test-secret-that-is-long-enough".to_string(),
            session_ttl_hours: 1,
            secure_cookies: false,
            max_upload_mb: 5,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let port: u16 = parse_env("SCREENER_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("SCREENER_TEST_BAD_TIMEOUT", "soon");
        let result: Result<u64> = parse_env("SCREENER_TEST_BAD_TIMEOUT", 120);
        assert!(result.is_err());
        std::env::remove_var("SCREENER_TEST_BAD_TIMEOUT");
    }

    #[test]
    fn test_parse_env_reads_bool() {
        std::env::set_var("SCREENER_TEST_SECURE", "true");
        let secure: bool = parse_env("SCREENER_TEST_SECURE", false).unwrap();
        assert!(secure);
        std::env::remove_var("SCREENER_TEST_SECURE");
    }

    #[test]
    fn test_require_env_names_missing_key() {
        let err = require_env("SCREENER_TEST_DEFINITELY_MISSING").unwrap_err();
        assert!(err.to_string().contains("SCREENER_TEST_DEFINITELY_MISSING"));
    }
}
