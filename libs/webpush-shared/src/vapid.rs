//! VAPID token signing (RFC 8292).
//!
//! Produces the compact three-segment bearer token a push service uses to
//! verify the sender: base64url(header).base64url(claims).base64url(signature),
//! signed with ECDSA P-256 / SHA-256 over the UTF-8 bytes of "header.claims".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use p256::ecdsa::{signature::Signer, Signature};
use serde::{Deserialize, Serialize};

use crate::errors::WebPushError;
use crate::keys::SenderIdentity;

/// Token lifetime ceiling recommended by the push-service ecosystem.
const TOKEN_LIFETIME_HOURS: i64 = 12;

/// Claims carried by a VAPID token.
///
/// One token is valid for exactly one audience; callers sign a fresh token
/// per destination push-service origin.
#[derive(Debug, Serialize, Deserialize)]
pub struct VapidClaims {
    /// Audience: scheme + host of the destination's push service.
    pub aud: String,
    /// Contact identifier of the sender (e.g. a mailto URI).
    pub sub: String,
    /// Expiry, Unix seconds; at most 12 hours from issuance.
    pub exp: i64,
}

/// Sign a VAPID token for one audience.
pub fn sign_token(identity: &SenderIdentity, audience: &str) -> Result<String, WebPushError> {
    let header = serde_json::json!({"typ": "JWT", "alg": "ES256"});
    let claims = VapidClaims {
        aud: audience.to_string(),
        sub: identity.subject().to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
    };

    let header_b64 = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&header).map_err(|e| WebPushError::JwtEncode(e.to_string()))?,
    );
    let claims_b64 = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&claims).map_err(|e| WebPushError::JwtEncode(e.to_string()))?,
    );
    let signing_input = format!("{header_b64}.{claims_b64}");

    // Fixed 64-byte r||s encoding, not DER
    let signature: Signature = identity.signing_key().sign(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}
