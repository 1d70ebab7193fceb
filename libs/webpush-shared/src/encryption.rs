//! Payload encryption for the aes128gcm content-encoding profile.
//!
//! Each call performs an ephemeral ECDH agreement against the destination's
//! P-256 public key, derives a 16-byte content-encryption key and 12-byte
//! nonce via HKDF, and seals the two-byte-prefixed plaintext with
//! AES-128-GCM. Salt and the ephemeral key pair are single-use: reuse across
//! messages to the same destination would leak derivation material, so every
//! call mints fresh randomness.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use rand::{rngs::OsRng, RngCore};

use crate::errors::WebPushError;
use crate::kdf;

const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";
const SALT_LEN: usize = 16;
const CEK_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Output of one encryption call.
///
/// The receiver needs the salt and the sender's ephemeral public point to
/// redo the ECDH and key derivation; both travel in delivery headers.
pub struct EncryptedPayload {
    /// AES-128-GCM ciphertext with the 16-byte authentication tag appended.
    pub ciphertext: Vec<u8>,
    /// Fresh random salt used for key derivation.
    pub salt: [u8; SALT_LEN],
    /// Ephemeral sender public key, uncompressed point (65 bytes).
    pub local_public_key: Vec<u8>,
}

/// Encrypt a payload for one destination.
///
/// `destination_public_key` is the raw uncompressed P-256 point from the
/// subscription; `auth_secret` is the subscription's shared auth secret.
pub fn encrypt(
    plaintext: &[u8],
    destination_public_key: &[u8],
    auth_secret: &[u8],
) -> Result<EncryptedPayload, WebPushError> {
    if destination_public_key.len() != 65 || destination_public_key[0] != 0x04 {
        return Err(WebPushError::InvalidPublicKey(format!(
            "destination key must be a 65-byte uncompressed point, got {} bytes",
            destination_public_key.len()
        )));
    }
    let destination_key = PublicKey::from_sec1_bytes(destination_public_key)
        .map_err(|e| WebPushError::InvalidPublicKey(format!("not a P-256 point: {e}")))?;

    // Fresh ephemeral pair and salt, one per call
    let local_secret = EphemeralSecret::random(&mut OsRng);
    let local_public_key = local_secret
        .public_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec();
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let shared_secret = local_secret.diffie_hellman(&destination_key);

    // IKM = auth_secret || shared_secret
    let mut ikm = Vec::with_capacity(auth_secret.len() + 32);
    ikm.extend_from_slice(auth_secret);
    ikm.extend_from_slice(shared_secret.raw_secret_bytes().as_slice());

    let cek = kdf::derive(&salt, &ikm, CEK_INFO, CEK_LEN)?;
    let nonce_bytes = kdf::derive(&salt, &ikm, NONCE_INFO, NONCE_LEN)?;

    // Two-byte record header precedes the payload; no further padding
    let mut padded = Vec::with_capacity(plaintext.len() + 2);
    padded.extend_from_slice(&[0u8, 0u8]);
    padded.extend_from_slice(plaintext);

    let cipher = Aes128Gcm::new_from_slice(&cek)
        .map_err(|_| WebPushError::Encryption("invalid content-encryption key length".into()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), padded.as_slice())
        .map_err(|_| WebPushError::Encryption("AES-128-GCM sealing failed".into()))?;

    Ok(EncryptedPayload {
        ciphertext,
        salt,
        local_public_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::SecretKey;

    const TAG_LEN: usize = 16;

    fn test_subscription() -> (SecretKey, Vec<u8>, Vec<u8>) {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
        let mut auth = vec![0u8; 16];
        OsRng.fill_bytes(&mut auth);
        (secret, public, auth)
    }

    /// Reference decryption: the receiver side of the same profile.
    fn decrypt(
        destination_secret: &SecretKey,
        auth_secret: &[u8],
        payload: &EncryptedPayload,
    ) -> Vec<u8> {
        let local_public = PublicKey::from_sec1_bytes(&payload.local_public_key).unwrap();
        let shared = p256::ecdh::diffie_hellman(
            destination_secret.to_nonzero_scalar(),
            local_public.as_affine(),
        );

        let mut ikm = auth_secret.to_vec();
        ikm.extend_from_slice(shared.raw_secret_bytes().as_slice());

        let cek = kdf::derive(&payload.salt, &ikm, CEK_INFO, CEK_LEN).unwrap();
        let nonce = kdf::derive(&payload.salt, &ikm, NONCE_INFO, NONCE_LEN).unwrap();

        let cipher = Aes128Gcm::new_from_slice(&cek).unwrap();
        let padded = cipher
            .decrypt(Nonce::from_slice(&nonce), payload.ciphertext.as_slice())
            .expect("authenticated decryption");

        assert_eq!(&padded[..2], &[0u8, 0u8]);
        padded[2..].to_vec()
    }

    #[test]
    fn test_roundtrip_recovers_payload() {
        let (secret, public, auth) = test_subscription();
        let message = br#"{"title":"Hello","body":"World"}"#;

        let encrypted = encrypt(message, &public, &auth).expect("encrypt");
        let recovered = decrypt(&secret, &auth, &encrypted);

        assert_eq!(recovered, message);
    }

    #[test]
    fn test_output_shapes() {
        let (_, public, auth) = test_subscription();
        let message = b"ping";

        let encrypted = encrypt(message, &public, &auth).unwrap();

        assert_eq!(encrypted.salt.len(), SALT_LEN);
        assert_eq!(encrypted.local_public_key.len(), 65);
        assert_eq!(encrypted.local_public_key[0], 0x04);
        // 2-byte record header + plaintext + GCM tag
        assert_eq!(encrypted.ciphertext.len(), message.len() + 2 + TAG_LEN);
    }

    #[test]
    fn test_fresh_randomness_per_call() {
        let (_, public, auth) = test_subscription();
        let message = b"same message";

        let a = encrypt(message, &public, &auth).unwrap();
        let b = encrypt(message, &public, &auth).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.local_public_key, b.local_public_key);
    }

    #[test]
    fn test_rejects_malformed_destination_key() {
        let (_, _, auth) = test_subscription();

        let result = encrypt(b"x", &[0u8; 65], &auth);
        assert!(matches!(result, Err(WebPushError::InvalidPublicKey(_))));

        let result = encrypt(b"x", &[0x04; 33], &auth);
        assert!(matches!(result, Err(WebPushError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let (secret, public, auth) = test_subscription();
        let mut encrypted = encrypt(b"payload", &public, &auth).unwrap();
        let last = encrypted.ciphertext.len() - 1;
        encrypted.ciphertext[last] ^= 0x01;

        let local_public = PublicKey::from_sec1_bytes(&encrypted.local_public_key).unwrap();
        let shared = p256::ecdh::diffie_hellman(
            secret.to_nonzero_scalar(),
            local_public.as_affine(),
        );
        let mut ikm = auth.clone();
        ikm.extend_from_slice(shared.raw_secret_bytes().as_slice());
        let cek = kdf::derive(&encrypted.salt, &ikm, CEK_INFO, CEK_LEN).unwrap();
        let nonce = kdf::derive(&encrypted.salt, &ikm, NONCE_INFO, NONCE_LEN).unwrap();
        let cipher = Aes128Gcm::new_from_slice(&cek).unwrap();

        assert!(cipher
            .decrypt(Nonce::from_slice(&nonce), encrypted.ciphertext.as_slice())
            .is_err());
    }
}
