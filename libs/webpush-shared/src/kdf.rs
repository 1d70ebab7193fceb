//! HKDF-SHA256 key derivation (RFC 5869, push-encryption profile).

use hkdf::Hkdf;
use sha2::Sha256;

use crate::errors::WebPushError;

/// Derive `out_len` bytes from a shared secret.
///
/// Extract runs HMAC-SHA256 keyed by `salt` over `ikm`; expand iterates
/// HMAC blocks with a single counter byte starting at 1. Pure and stateless.
pub fn derive(
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
    out_len: usize,
) -> Result<Vec<u8>, WebPushError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; out_len];
    hk.expand(info, &mut okm).map_err(|_| {
        WebPushError::Encryption(format!("HKDF cannot produce {out_len} bytes"))
    })?;
    Ok(okm)
}
