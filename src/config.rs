use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Default token lifetime when `JWT_EXPIRE` is not set.
pub const DEFAULT_TOKEN_EXPIRY: &str = "7d";
/// Default session cookie lifetime in days.
pub const DEFAULT_COOKIE_EXPIRE_DAYS: i64 = 7;
/// Default timeout for the identity lookup done by the auth middleware.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5000;

/// The mode the server runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Test,
    Production,
}

impl RunMode {
    /// Parses `APP_ENV`. Unknown values fall back to development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => RunMode::Production,
            "test" => RunMode::Test,
            _ => RunMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == RunMode::Production
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Development => "development",
            RunMode::Test => "test",
            RunMode::Production => "production",
        };
        f.write_str(name)
    }
}

/// The application's configuration.
///
/// Built once at startup and handed to the rest of the service through
/// [`crate::state::AppState`]. Nothing reads the environment after that.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// The secret used to sign session tokens.
    pub jwt_secret: Zeroizing<String>,
    /// How long an issued token stays valid.
    pub token_ttl: chrono::Duration,
    /// The lifetime of the `token` cookie in days.
    pub cookie_expire_days: i64,
    /// Upper bound for one identity lookup during authentication.
    pub lookup_timeout: Duration,
    /// Development, test or production.
    pub run_mode: RunMode,
    /// The address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// The origin allowed by CORS.
    pub frontend_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("cookie_expire_days", &self.cookie_expire_days)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("run_mode", &self.run_mode)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("frontend_url", &self.frontend_url)
            .finish()
    }
}

impl Config {
    /// Creates a `Config` with the given signing secret and default settings.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            jwt_secret: Zeroizing::new(jwt_secret.into()),
            token_ttl: chrono::Duration::days(7),
            cookie_expire_days: DEFAULT_COOKIE_EXPIRE_DAYS,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            run_mode: RunMode::Development,
            host: "127.0.0.1".to_string(),
            port: 5000,
            frontend_url: "http://localhost:3000".to_string(),
        }
    }

    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_ttl = parse_expiry(
            &env::var("JWT_EXPIRE").unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRY.to_string()),
        )
        .context("Invalid JWT_EXPIRE")?;

        let cookie_expire_days: i64 = env::var("JWT_COOKIE_EXPIRE")
            .unwrap_or_else(|_| DEFAULT_COOKIE_EXPIRE_DAYS.to_string())
            .parse()
            .context("Invalid JWT_COOKIE_EXPIRE")?;
        if cookie_expire_days <= 0 || cookie_expire_days.checked_mul(86_400).is_none() {
            anyhow::bail!("JWT_COOKIE_EXPIRE must be a positive number of days");
        }

        let lookup_timeout_ms: u64 = env::var("AUTH_LOOKUP_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_LOOKUP_TIMEOUT_MS.to_string())
            .parse()
            .context("Invalid AUTH_LOOKUP_TIMEOUT_MS")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: Zeroizing::new(jwt_secret),
            token_ttl,
            cookie_expire_days,
            lookup_timeout: Duration::from_millis(lookup_timeout_ms),
            run_mode: RunMode::parse(
                &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            ),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid PORT")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}

/// Parses an expiry such as `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_expiry(value: &str) -> Result<chrono::Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);

    let amount: i64 = amount
        .parse()
        .with_context(|| format!("expiry '{}' does not start with a number", value))?;
    if amount <= 0 {
        anyhow::bail!("expiry '{}' must be positive", value);
    }

    let duration = match unit.trim() {
        "" | "s" => chrono::Duration::try_seconds(amount),
        "m" => chrono::Duration::try_minutes(amount),
        "h" => chrono::Duration::try_hours(amount),
        "d" => chrono::Duration::try_days(amount),
        "w" => chrono::Duration::try_weeks(amount),
        other => anyhow::bail!("unknown expiry unit '{}'", other),
    }
    .with_context(|| format!("expiry '{}' is out of range", value))?;

    // now + ttl must stay a representable time.
    if chrono::Utc::now().checked_add_signed(duration).is_none() {
        anyhow::bail!("expiry '{}' is out of range", value);
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_expiry_units() {
        assert_eq!(parse_expiry("7d").unwrap(), chrono::Duration::days(7));
        assert_eq!(parse_expiry("12h").unwrap(), chrono::Duration::hours(12));
        assert_eq!(parse_expiry("30m").unwrap(), chrono::Duration::minutes(30));
        assert_eq!(parse_expiry("3600").unwrap(), chrono::Duration::seconds(3600));
        assert_eq!(parse_expiry(" 2w ").unwrap(), chrono::Duration::weeks(2));
    }

    #[test]
    fn rejects_bad_expiry() {
        assert!(parse_expiry("").is_err());
        assert!(parse_expiry("d").is_err());
        assert!(parse_expiry("0d").is_err());
        assert!(parse_expiry("5y").is_err());
    }

    #[test]
    fn rejects_expiry_past_the_calendar() {
        assert!(parse_expiry("100000000d").is_err());
        assert!(parse_expiry("9223372036854775807w").is_err());
        assert!(parse_expiry("9223372036854775807").is_err());
        assert_eq!(parse_expiry("3650d").unwrap(), chrono::Duration::days(3650));
    }

    #[test]
    fn run_mode_defaults_to_development() {
        assert_eq!(RunMode::parse("production"), RunMode::Production);
        assert_eq!(RunMode::parse("TEST"), RunMode::Test);
        assert_eq!(RunMode::parse("staging"), RunMode::Development);
        assert!(!RunMode::Development.is_production());
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = Config::new("super-secret-value");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
    }
}
