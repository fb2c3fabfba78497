//! services/api/src/web/auth.rs
//!
//! Credential checking, JWT issuance and the authentication endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::{AuthConfig, ConfigError};
use crate::web::state::AppState;
use habit_tracker_core::ports::{PortError, PortResult};

/// Id of the single configured account.
const ACCOUNT_ID: u64 = 1;

//=========================================================================================
// Token Claims and the Authenticator
//=========================================================================================

/// JWT claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: u64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verifies the configured account's password and signs/validates access tokens.
pub struct Authenticator {
    username: String,
    password_hash: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl Authenticator {
    /// `enforce_expiry` is off outside production, where expired tokens are still accepted.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        secret: &[u8],
        expires_in_secs: i64,
        enforce_expiry: bool,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = enforce_expiry;

        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expires_in: Duration::seconds(expires_in_secs),
        }
    }

    /// Builds the authenticator from configuration, hashing a plain password if needed.
    pub fn from_config(auth: &AuthConfig, production: bool) -> Result<Self, ConfigError> {
        let password_hash = match (&auth.password_hash, &auth.password) {
            (Some(hash), _) => {
                PasswordHash::new(hash).map_err(|e| {
                    ConfigError::InvalidValue("AUTH_PASSWORD_HASH".to_string(), e.to_string())
                })?;
                hash.clone()
            }
            (None, Some(password)) => hash_password(password)
                .map_err(|e| ConfigError::InvalidValue("AUTH_PASSWORD".to_string(), e))?,
            (None, None) => return Err(ConfigError::MissingVar("AUTH_PASSWORD_HASH".to_string())),
        };

        Ok(Self::new(
            auth.username.clone(),
            password_hash,
            auth.jwt_secret.as_bytes(),
            auth.jwt_expiration_secs,
            production,
        ))
    }

    /// Checks a username/password pair against the configured account.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        if username != self.username {
            return false;
        }
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                error!("Failed to parse password hash: {:?}", e);
                false
            }
        }
    }

    /// Signs a fresh access token for the configured account.
    pub fn issue_token(&self) -> PortResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: ACCOUNT_ID,
            username: self.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.expires_in).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign access token: {:?}", e);
            PortError::Unauthorized
        })
    }

    /// Validates a token's signature (and expiry, when enforced) and returns its claims.
    pub fn decode_token(&self, token: &str) -> PortResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Rejected access token: {}", e);
                PortError::Unauthorized
            })
    }
}

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| e.to_string())
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub id: u64,
    pub username: String,
    pub access_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: u64,
    pub username: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Json(req) = payload.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;

    // 1. Verify the credentials
    if !state.auth.verify_credentials(&req.username, &req.password) {
        warn!("Failed login attempt for '{}'.", req.username);
        return Err((StatusCode::UNAUTHORIZED, "Invalid username or password".to_string()));
    }

    // 2. Sign a token
    let access_token = state.auth.issue_token().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue access token".to_string(),
        )
    })?;

    info!("User '{}' logged in.", req.username);
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            id: ACCOUNT_ID,
            username: req.username,
            access_token,
        }),
    ))
}

/// GET /auth - Return the identity carried by the bearer token
#[utoipa::path(
    get,
    path = "/auth",
    responses(
        (status = 200, description = "The authenticated user", body = AuthenticatedUser),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(Extension(claims): Extension<Claims>) -> Json<AuthenticatedUser> {
    Json(AuthenticatedUser {
        id: claims.sub,
        username: claims.username,
    })
}
