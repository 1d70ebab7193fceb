pub mod dispatch;

pub use dispatch::register_routes;

use std::sync::Arc;

use serde::Serialize;

use crate::services::Dispatcher;
use crate::storage::{DestinationStore, DispatchLog};

/// Shared handler state, built once in `main`.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub destinations: Arc<dyn DestinationStore>,
    pub dispatch_log: Arc<dyn DispatchLog>,
    /// Base64url VAPID public key handed to subscribing browsers.
    pub vapid_public_key: String,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}
