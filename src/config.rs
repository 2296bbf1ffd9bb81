use crate::error::{env_error, DutyResult};
use crate::web::auth::AuthConfig;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Default zone the school runs in
pub const DEFAULT_TIMEZONE: &str = "Europe/Athens";

/// Default locale for user-visible notices
pub const DEFAULT_LOCALE: &str = "el";

/// Main configuration structure for the server
#[derive(Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,
    /// Bind port
    pub port: u16,
    /// Zone used to decide what "now" means for the roster
    pub school_timezone: Tz,
    /// Locale for error messages and page labels
    pub locale: String,
    /// Redis connection string; in-memory store when unset
    pub redis_url: Option<String>,
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in minutes
    pub token_expiration_minutes: i64,
    pub admin_username: String,
    pub admin_password: String,
    /// TOML roster loaded into an empty store
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the environment, honoring a `.env` file
    pub fn load() -> DutyResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> DutyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = match var("HOST") {
            Some(h) => h.trim().parse::<IpAddr>().map_err(|_| env_error("HOST"))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };

        let port = match var("PORT") {
            Some(p) => p.trim().parse::<u16>().map_err(|_| env_error("PORT"))?,
            None => 3000,
        };

        let school_timezone = var("SCHOOL_TIMEZONE")
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
            .trim()
            .parse::<Tz>()
            .map_err(|_| env_error("SCHOOL_TIMEZONE"))?;

        let token_expiration_minutes = match var("TOKEN_EXPIRATION_MINUTES") {
            Some(m) => m
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| env_error("TOKEN_EXPIRATION_MINUTES"))?,
            None => 12 * 60,
        };

        Ok(Config {
            host,
            port,
            school_timezone,
            locale: var("LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            redis_url: var("REDIS_URL"),
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| "change_me".to_string()),
            token_expiration_minutes,
            admin_username: var("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_password: var("ADMIN_PASSWORD").unwrap_or_else(|| "password".to_string()),
            seed_file: var("SEED_FILE").map(PathBuf::from),
        })
    }

    /// Address the server listens on
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Credentials and token settings for the access gate
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_expiration_minutes: self.token_expiration_minutes,
            admin_username: self.admin_username.clone(),
            admin_password: self.admin_password.clone(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("school_timezone", &self.school_timezone)
            .field("locale", &self.locale)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<set>"))
            .field("token_expiration_minutes", &self.token_expiration_minutes)
            .field("admin_username", &self.admin_username)
            .field("seed_file", &self.seed_file)
            .finish_non_exhaustive()
    }
}
