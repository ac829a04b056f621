#![cfg(feature = "web")]

//! Single-account login with signed, time-limited tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;
use crate::config::Config;
use crate::error::{ApiError, AuthError};

const TOKEN_COOKIE: &str = "token";

/// Claims carried by an issued token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token issuing and checking for the configured account.
#[derive(Clone)]
pub struct Authenticator {
    secret: Option<String>,
    email: Option<String>,
    password_hash: Option<String>,
    ttl_secs: i64,
}

impl Authenticator {
    pub fn from_config(config: &Config) -> Self {
        Authenticator {
            secret: config.jwt_secret.clone(),
            email: config.user_email.clone(),
            password_hash: config.user_password.clone(),
            ttl_secs: config.token_ttl_secs,
        }
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(AuthError::NotConfigured("JWT_SECRET is not set"))
    }

    /// Check the credential against the configured account and issue a token.
    pub fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let (Some(account), Some(hash)) = (&self.email, &self.password_hash) else {
            return Err(AuthError::NotConfigured("USER_EMAIL or USER_PASSWORD is not set"));
        };
        if email != account.as_str() || !verify_password(password, hash)? {
            return Err(AuthError::BadCredentials);
        }
        self.issue(email, Utc::now().timestamp())
    }

    /// Sign a token for `email` issued at `now` (unix seconds).
    pub fn issue(&self, email: &str, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret()?),
        )
        .map_err(|e| {
            log::error!("failed to sign token: {}", e);
            AuthError::NotConfigured("token signing failed")
        })
    }

    /// Check a token's signature and expiry. The account is not re-checked.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &DecodingKey::from_secret(self.secret()?), &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Token from the `Authorization: Bearer` header, else from the cookie.
    fn verify_request(&self, headers: &HeaderMap, jar: &CookieJar) -> Result<Claims, AuthError> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split_whitespace().nth(1))
            .map(str::to_string);
        let token = bearer
            .or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()))
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.verify(&token)
    }
}

/// Hash a password with Argon2id, for configuring `USER_PASSWORD`.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| "Password hashing failed".to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AuthError::NotConfigured("USER_PASSWORD is not a valid argon2 hash"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// `POST /api/login`
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(credentials), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let token = state
        .auth
        .login(&credentials.email, &credentials.password)?;
    log::info!("login successful for {}", credentials.email);

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok((
        jar.add(cookie),
        Json(json!({ "message": "Login successful", "token": token })),
    )
        .into_response())
}

/// `GET /api/protected`
pub async fn handle_protected(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<serde_json::Value>, AuthError> {
    state.auth.verify_request(&headers, &jar)?;
    Ok(Json(json!({ "message": "Access granted" })))
}

/// `POST /api/logout`
pub async fn handle_logout(jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((TOKEN_COOKIE, "")).path("/");
    (
        jar.remove(cookie),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// Middleware rejecting requests without a valid token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match state.auth.verify_request(request.headers(), &jar) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
