//! Administrator sessions: signed tokens carried in a cookie (browser) or a
//! bearer header (API clients), and the middleware that gates the directory.

use super::AppState;
use crate::error::{DutyResult, Error};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Cookie holding the session token
pub const AUTH_COOKIE: &str = "auth_token";

/// User credentials structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Role, always "admin" for now
    pub role: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret for signing/verifying tokens
    pub jwt_secret: String,
    /// Token expiration time in minutes
    pub token_expiration_minutes: i64,
    pub admin_username: String,
    pub admin_password: String,
}

/// Auth service for token operations
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Check credentials against the configured administrator and issue a token
    pub fn authenticate(&self, credentials: &Credentials) -> DutyResult<String> {
        if credentials.username == self.config.admin_username
            && credentials.password == self.config.admin_password
        {
            self.generate_token(&credentials.username, "admin")
        } else {
            warn!("Failed login attempt for user: {}", credentials.username);
            Err(Error::Unauthorized)
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, subject: &str, role: &str) -> DutyResult<String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.config.token_expiration_minutes);

        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("Failed to generate token: {}", e);
            Error::Config(format!("Failed to generate token: {}", e))
        })
    }

    /// Validate a JWT token
    pub fn validate_token(&self, token: &str) -> DutyResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| {
            debug!("JWT validation error: {:?}", e);
            Error::Unauthorized
        })
    }
}

/// Session token from the cookie, or failing that the bearer header
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Reject the request with `unauthorized` unless it carries a valid session
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_token(&jar, req.headers()).ok_or(Error::Unauthorized)?;
    let claims = state.auth.validate_token(&token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
