//! Caller authorization.
//!
//! Dispatch is an administrative operation: every request must carry a
//! bearer token signed by the identity provider, and the token's role
//! claim must be `admin`. Verification happens in a typed extractor, so
//! an unauthorized call fails before any destination is contacted.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by caller bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Role granted by the identity provider
    pub role: String,
}

/// Verifies caller bearer tokens against the identity provider's public key.
///
/// ES256 only — symmetric algorithms are rejected to rule out
/// algorithm-confusion attacks. The key is loaded once at startup.
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
}

impl AuthVerifier {
    pub fn from_public_key_pem(pem: &str) -> Result<Self, AppError> {
        let decoding_key = DecodingKey::from_ec_pem(pem.as_bytes())
            .map_err(|e| AppError::Config(format!("invalid JWT public key: {e}")))?;
        Ok(Self { decoding_key })
    }

    /// Validate a bearer token and require the administrative role.
    pub fn verify_admin(&self, token: &str) -> Result<AdminIdentity, AppError> {
        let validation = Validation::new(Algorithm::ES256);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::warn!("JWT validation failed: {}", e);
                AppError::Unauthorized(format!("invalid token: {e}"))
            })?;

        if token_data.claims.role != ADMIN_ROLE {
            return Err(AppError::Forbidden(
                "administrative role required".to_string(),
            ));
        }

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid token: malformed subject".to_string()))?;

        Ok(AdminIdentity { user_id })
    }
}

/// The authenticated administrator issuing a dispatch.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity {
    pub user_id: Uuid,
}

impl FromRequest for AdminIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, AppError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_admin(req))
    }
}

fn extract_admin(req: &HttpRequest) -> Result<AdminIdentity, AppError> {
    let verifier = req
        .app_data::<web::Data<AuthVerifier>>()
        .ok_or_else(|| AppError::Internal("auth verifier not configured".to_string()))?;

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("invalid Authorization header format".to_string()))?;

    verifier.verify_admin(token)
}
