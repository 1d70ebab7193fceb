use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// One registered browser/device push endpoint.
///
/// Owned by the registration subsystem; this engine only reads it and
/// deletes it when the push service confirms it dead. The key material is
/// stored base64url-encoded exactly as the browser handed it over.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Destination {
    pub id: Uuid,

    /// Owning user ID
    pub user_id: Uuid,

    /// Opaque push service delivery URL
    pub endpoint: String,

    /// P-256 ECDH public key (base64url, uncompressed point)
    pub p256dh: String,

    /// Shared auth secret (base64url)
    pub auth: String,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Inbound dispatch request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPayload {
    pub title: String,
    pub body: String,

    /// Extra key/value data merged into the encrypted payload
    #[serde(default)]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,

    /// Restrict the send to the single destination of `test_user_id`
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub test_user_id: Option<Uuid>,
}

impl DispatchPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("body must not be empty".to_string()));
        }
        if self.is_test && self.test_user_id.is_none() {
            return Err(AppError::Validation(
                "test dispatch requires test_user_id".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON object encrypted into the push message.
    ///
    /// Data keys are merged in but cannot override title or body.
    pub fn to_push_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        if let Some(data) = &self.data {
            object.extend(data.clone());
        }
        object.insert("title".to_string(), self.title.clone().into());
        object.insert("body".to_string(), self.body.clone().into());
        serde_json::Value::Object(object)
    }
}

/// Outcome of one delivery pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryOutcome {
    /// Push service accepted the message (2xx)
    Delivered,
    /// Rejected, destination still valid (network error or other non-2xx)
    Rejected,
    /// Destination permanently gone (404/410); record scheduled for deletion
    Gone,
}

/// Result of one delivery pipeline, one per destination.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub destination_id: Uuid,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
}

/// Aggregate handed back to the caller after every pipeline has settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    pub deleted_destination_ids: Vec<Uuid>,
}

/// One row of the dispatch log, persisted per dispatch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub title: String,
    pub body: String,
    pub successful: i64,
    pub failed: i64,
    pub total: i64,
    pub sent_by: Uuid,
    pub is_test: bool,
    pub created_at: DateTime<Utc>,
}
