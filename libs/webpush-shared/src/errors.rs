use thiserror::Error;

/// Web Push Client Error Types
#[derive(Error, Debug)]
pub enum WebPushError {
    #[error("Malformed sender key material: {0}")]
    KeyFormat(String),

    #[error("Invalid P-256 public key: {0}")]
    InvalidPublicKey(String),

    #[error("Failed to encode VAPID token: {0}")]
    JwtEncode(String),

    #[error("Payload encryption failed: {0}")]
    Encryption(String),

    #[error("Push request failed: {0}")]
    Request(String),

    #[error("Push service rejected delivery with status {0}")]
    Delivery(u16),

    #[error("Destination no longer registered (status {0})")]
    DestinationGone(u16),
}

impl WebPushError {
    /// Whether this error means the destination record should be evicted.
    pub fn is_gone(&self) -> bool {
        matches!(self, WebPushError::DestinationGone(_))
    }
}

impl From<WebPushError> for String {
    fn from(err: WebPushError) -> Self {
        err.to_string()
    }
}
