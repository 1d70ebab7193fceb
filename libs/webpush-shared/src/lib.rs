//! # Web Push Shared Library
//!
//! Unified Web Push client for delivering end-to-end-encrypted
//! notifications to registered browser endpoints.
//!
//! ## Modules
//! - `keys`: sender key material parsing (PKCS#8 PEM or raw base64url scalar)
//! - `vapid`: VAPID token signing (RFC 8292, ES256 over P-256)
//! - `kdf`: HKDF-SHA256 key derivation
//! - `encryption`: aes128gcm payload encryption (ECDH + HKDF + AES-128-GCM)
//! - `client`: per-destination HTTP delivery and response classification

pub mod client;
pub mod encryption;
pub mod errors;
pub mod kdf;
pub mod keys;
pub mod vapid;

pub use client::WebPushClient;
pub use encryption::EncryptedPayload;
pub use errors::WebPushError;
pub use keys::{KeyMaterial, SenderIdentity};
