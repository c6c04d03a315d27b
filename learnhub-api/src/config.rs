/// Configuration management for the API server
///
/// Configuration is read once at startup from environment variables (a `.env`
/// file is loaded first when present).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: `*`)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `RUN_MIGRATIONS`: Apply embedded migrations at startup (default: true)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: Session token lifetime, 1 to 8760 (default: 24)
/// - `RESET_TOKEN_TTL_MINUTES`: Password reset token lifetime, 1 to 10080 (default: 60)
/// - `DEMO_ACCOUNT_EMAIL`: Account that logs in with any password
///   (default: demo@tatasteel.com, empty disables)
/// - `MAIL_FROM`: Sender address for outgoing mail (default: no-reply@learnhub.local)
/// - `RUST_LOG` / `LOG_FORMAT`: see `main.rs`
///
/// # Example
///
/// ```no_run
/// use learnhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// One year
const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

/// One week
const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

/// Default demo account, kept for parity with the existing portal
pub const DEFAULT_DEMO_ACCOUNT_EMAIL: &str = "demo@tatasteel.com";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode adds HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Apply embedded migrations before serving
    pub run_migrations: bool,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub expiration_hours: i64,
}

/// Account and credential policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Account allowed to log in with any password, `None` when disabled
    pub demo_account_email: Option<String>,

    pub reset_token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub from: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - A numeric or boolean variable does not parse
    /// - A lifetime is not positive or exceeds its cap
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let demo_account_email = match env::var("DEMO_ACCOUNT_EMAIL") {
            Ok(value) => parse_demo_account(&value),
            Err(_) => Some(DEFAULT_DEMO_ACCOUNT_EMAIL.to_string()),
        };

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("API_PORT", 8080)?,
                cors_origins: parse_origins(
                    &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
                production: parse_bool("PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
                run_migrations: parse_bool("RUN_MIGRATIONS", true)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours: parse_bounded("JWT_EXPIRATION_HOURS", 24, MAX_JWT_EXPIRATION_HOURS)?,
            },
            auth: AuthConfig {
                demo_account_email,
                reset_token_ttl_minutes: parse_bounded(
                    "RESET_TOKEN_TTL_MINUTES",
                    60,
                    MAX_RESET_TOKEN_TTL_MINUTES,
                )?,
            },
            mail: MailConfig {
                from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@learnhub.local".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::hours(self.jwt.expiration_hours)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::minutes(self.auth.reset_token_ttl_minutes)
    }

    /// Whether `email` is the configured demo account
    pub fn is_demo_account(&self, email: &str) -> bool {
        self.auth
            .demo_account_email
            .as_deref()
            .map(|demo| demo.eq_ignore_ascii_case(email.trim()))
            .unwrap_or(false)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        Err(_) => Ok(default),
    }
}

/// Parses a lifetime in `1..=max`
fn parse_bounded(name: &str, default: i64, max: i64) -> anyhow::Result<i64> {
    let value = parse_var(name, default)?;
    if !(1..=max).contains(&value) {
        anyhow::bail!("{} must be between 1 and {}, got {}", name, max, value);
    }
    Ok(value)
}

fn parse_bool(name: &str, default: bool) -> anyhow::Result<bool> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("{} is not a boolean: {}", name, other),
        },
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_demo_account(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
                run_migrations: false,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiration_hours: 24,
            },
            auth: AuthConfig {
                demo_account_email: Some(DEFAULT_DEMO_ACCOUNT_EMAIL.to_string()),
                reset_token_ttl_minutes: 60,
            },
            mail: MailConfig {
                from: "no-reply@learnhub.local".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_durations() {
        let config = test_config();
        assert_eq!(config.token_lifetime(), Duration::hours(24));
        assert_eq!(config.reset_token_ttl(), Duration::minutes(60));
    }

    #[test]
    fn test_is_demo_account_ignores_case() {
        let config = test_config();
        assert!(config.is_demo_account("demo@tatasteel.com"));
        assert!(config.is_demo_account(" Demo@TataSteel.com "));
        assert!(!config.is_demo_account("ravi@tatasteel.com"));
    }

    #[test]
    fn test_demo_account_disabled() {
        let mut config = test_config();
        config.auth.demo_account_email = parse_demo_account("  ");
        assert!(!config.is_demo_account("demo@tatasteel.com"));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://learn.example.com, https://admin.example.com,"),
            vec!["https://learn.example.com", "https://admin.example.com"]
        );
        assert_eq!(parse_origins("*"), vec!["*"]);
    }

    #[test]
    fn test_parse_bounded_uses_default_when_unset() {
        assert_eq!(parse_bounded("LEARNHUB_TEST_BOUNDED_UNSET", 24, 48).unwrap(), 24);
    }

    #[test]
    fn test_parse_bounded_rejects_out_of_range() {
        for (name, raw) in [
            ("LEARNHUB_TEST_BOUNDED_NEGATIVE", "-5"),
            ("LEARNHUB_TEST_BOUNDED_ZERO", "0"),
            ("LEARNHUB_TEST_BOUNDED_HUGE", "9223372036854775807"),
        ] {
            env::set_var(name, raw);
            assert!(parse_bounded(name, 24, MAX_JWT_EXPIRATION_HOURS).is_err(), "{} accepted", raw);
        }

        env::set_var("LEARNHUB_TEST_BOUNDED_OK", "168");
        assert_eq!(
            parse_bounded("LEARNHUB_TEST_BOUNDED_OK", 24, MAX_JWT_EXPIRATION_HOURS).unwrap(),
            168
        );
    }
}
