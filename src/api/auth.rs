//! Authentication: password hashing, token issuance and the route guards.
//!
//! Tokens are stateless HS256 JWTs carrying the user id and role. There is
//! no server-side session table; rotating the configured secret invalidates
//! every outstanding token at once.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::validate_email;
use crate::config::AuthConfig;
use crate::db::models::user::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Role, User,
};
use crate::AppState;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// JWT claims. `exp` is seconds since the epoch; `Validation::default()`
/// rejects expired tokens on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// The authenticated caller, inserted into request extensions by the
/// middleware below.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

/// Sign a token for `user_id` with the configured secret and TTL
pub fn issue_token(
    auth: &AuthConfig,
    user_id: &str,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(auth.token_ttl_hours)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.token_secret.as_bytes()),
    )
}

/// Decode and validate a token, checking signature and expiry
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Extract the bearer token from request headers
fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn authenticate(req: &Request, auth: &AuthConfig) -> Result<AuthUser, ApiError> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let claims = decode_token(token, &auth.token_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

/// Middleware guarding user-scoped routes. Inserts [`AuthUser`] into the
/// request extensions on success.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&req, &state.config.auth)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware guarding admin-only routes. Runs before any body parsing, so
/// unauthorized callers never get their upload read.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&req, &state.config.auth)?;
    if user.role != Role::Admin {
        tracing::warn!(user_id = %user.user_id, "Non-admin access attempt");
        return Err(ApiError::forbidden("Admin privileges required"));
    }
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Register endpoint
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let mut errors = ValidationErrorBuilder::new();
    if let Err(msg) = validate_email(&email) {
        errors.add("email", msg);
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.finish()?;

    // Pre-check for a friendly message; UNIQUE(email) closes the race
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let password_hash = hash_password(&password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let role = request.role.unwrap_or_default();
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .bind(&created_at)
    .execute(&state.db)
    .await?;

    tracing::info!("Registered {} account for {}", role, email);

    Ok(Json(RegisterResponse {
        message: "User created".to_string(),
        user_id: id,
        email,
    }))
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let mut errors = ValidationErrorBuilder::new();
    if email.is_empty() {
        errors.add("email", "Email is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.finish()?;

    // Find user by email
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    // Unknown email and wrong password must be indistinguishable
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = issue_token(&state.config.auth, &user.id, user.role)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        role: user.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            token_secret: "test-secret".to_string(),
            token_ttl_hours: 24,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = test_auth_config();
        let token = issue_token(&auth, "user-1", Role::Admin).unwrap();
        let claims = decode_token(&token, &auth.token_secret).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let auth = test_auth_config();
        let token = issue_token(&auth, "user-1", Role::User).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = test_auth_config();
        let token = issue_token(&auth, "user-1", Role::User).unwrap();
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);
        assert!(decode_token(&tampered, &auth.token_secret).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = AuthConfig {
            token_secret: "test-secret".to_string(),
            token_ttl_hours: -2,
        };
        let token = issue_token(&auth, "user-1", Role::User).unwrap();
        assert!(decode_token(&token, &auth.token_secret).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = axum::http::HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("Authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi"));

        headers.insert("Authorization", "Basic abc".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);
    }
}
