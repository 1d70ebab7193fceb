use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::encryption;
use crate::errors::WebPushError;
use crate::keys::SenderIdentity;
use crate::vapid;

/// Best-effort retention requested from the push service, in seconds.
const TTL_SECONDS: u32 = 86_400;

/// Per-request network timeout; a stalled push service must not wedge a
/// delivery pipeline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Web Push Client
///
/// Delivers one encrypted message to one destination endpoint: signs a
/// VAPID token for the endpoint's origin, encrypts the payload for the
/// subscription keys, posts the ciphertext, and classifies the response.
pub struct WebPushClient {
    identity: Arc<SenderIdentity>,
    http_client: reqwest::Client,
}

impl WebPushClient {
    /// Create a new client around a sender identity.
    pub fn new(identity: SenderIdentity) -> Result<Self, WebPushError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WebPushError::Request(e.to_string()))?;
        Ok(Self {
            identity: Arc::new(identity),
            http_client,
        })
    }

    /// Base64url sender public key, handed to browsers as the
    /// `applicationServerKey` for subscribing.
    pub fn public_key_base64url(&self) -> &str {
        self.identity.public_key_base64url()
    }

    /// Send an encrypted push message to a single destination.
    ///
    /// `p256dh` and `auth` are the subscription's base64url key material.
    /// Returns `Ok(())` on 2xx; `DestinationGone` on 404/410 (the record
    /// should be evicted); `Delivery` on any other status.
    pub async fn send(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        payload: &[u8],
    ) -> Result<(), WebPushError> {
        let destination_key = URL_SAFE_NO_PAD
            .decode(p256dh)
            .map_err(|e| WebPushError::InvalidPublicKey(format!("invalid base64url p256dh: {e}")))?;
        let auth_secret = URL_SAFE_NO_PAD
            .decode(auth)
            .map_err(|e| WebPushError::Encryption(format!("invalid base64url auth secret: {e}")))?;

        let audience = audience_of(endpoint)?;
        let token = vapid::sign_token(&self.identity, &audience)?;
        let encrypted = encryption::encrypt(payload, &destination_key, &auth_secret)?;

        let response = self
            .http_client
            .post(endpoint)
            .header("Content-Encoding", "aes128gcm")
            .header("TTL", TTL_SECONDS.to_string())
            .header(
                "Authorization",
                format!("vapid t={}, k={}", token, self.identity.public_key_base64url()),
            )
            .header(
                "Crypto-Key",
                format!("dh={}", URL_SAFE_NO_PAD.encode(&encrypted.local_public_key)),
            )
            .header(
                "Encryption",
                format!("salt={}", URL_SAFE_NO_PAD.encode(encrypted.salt)),
            )
            .body(encrypted.ciphertext)
            .send()
            .await
            .map_err(|e| WebPushError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {
                tracing::debug!(endpoint, status, "push delivered");
                Ok(())
            }
            404 | 410 => {
                tracing::info!(endpoint, status, "destination no longer registered");
                Err(WebPushError::DestinationGone(status))
            }
            _ => {
                tracing::warn!(endpoint, status, "push service rejected delivery");
                Err(WebPushError::Delivery(status))
            }
        }
    }
}

/// Audience for a destination endpoint: scheme + host (+ explicit port).
pub fn audience_of(endpoint: &str) -> Result<String, WebPushError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| WebPushError::Request(format!("invalid endpoint URL: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| WebPushError::Request("endpoint URL has no host".to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;
    use p256::elliptic_curve::rand_core::OsRng;
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use rand::RngCore;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> WebPushClient {
        let signing_key = SigningKey::random(&mut OsRng);
        let point = signing_key.verifying_key().to_encoded_point(false);
        let identity = SenderIdentity::from_config(
            &URL_SAFE_NO_PAD.encode(signing_key.to_bytes()),
            &URL_SAFE_NO_PAD.encode(point.as_bytes()),
            "mailto:push@example.com".to_string(),
        )
        .unwrap();
        WebPushClient::new(identity).unwrap()
    }

    fn test_subscription_keys() -> (String, String) {
        let secret = p256::SecretKey::random(&mut OsRng);
        let point = secret.public_key().to_encoded_point(false);
        let mut auth = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut auth);
        (
            URL_SAFE_NO_PAD.encode(point.as_bytes()),
            URL_SAFE_NO_PAD.encode(auth),
        )
    }

    #[test]
    fn test_audience_strips_path_and_query() {
        assert_eq!(
            audience_of("https://fcm.googleapis.com/fcm/send/abc123?x=1").unwrap(),
            "https://fcm.googleapis.com"
        );
        assert_eq!(
            audience_of("http://localhost:8080/push/1").unwrap(),
            "http://localhost:8080"
        );
        assert!(audience_of("not a url").is_err());
    }

    #[tokio::test]
    async fn test_send_success_carries_push_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/push/1"))
            .and(header("Content-Encoding", "aes128gcm"))
            .and(header("TTL", "86400"))
            .and(header_exists("Authorization"))
            .and(header_exists("Crypto-Key"))
            .and(header_exists("Encryption"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client();
        let (p256dh, auth) = test_subscription_keys();
        let endpoint = format!("{}/push/1", server.uri());

        client
            .send(&endpoint, &p256dh, &auth, b"{\"title\":\"hi\"}")
            .await
            .expect("delivery succeeds");
    }

    #[tokio::test]
    async fn test_send_classifies_gone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let client = test_client();
        let (p256dh, auth) = test_subscription_keys();
        let endpoint = format!("{}/push/gone", server.uri());

        let result = client.send(&endpoint, &p256dh, &auth, b"x").await;
        assert!(matches!(result, Err(WebPushError::DestinationGone(410))));
    }

    #[tokio::test]
    async fn test_send_classifies_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client();
        let (p256dh, auth) = test_subscription_keys();
        let endpoint = format!("{}/push/busy", server.uri());

        let result = client.send(&endpoint, &p256dh, &auth, b"x").await;
        assert!(matches!(result, Err(WebPushError::Delivery(429))));
    }

    #[tokio::test]
    async fn test_send_rejects_bad_subscription_key_without_io() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client();
        let endpoint = format!("{}/push/1", server.uri());

        let result = client
            .send(&endpoint, "AAAA", "AAAAAAAAAAAAAAAAAAAAAA", b"x")
            .await;
        assert!(matches!(result, Err(WebPushError::InvalidPublicKey(_))));
    }
}
