use crate::auth::AdminIdentity;
use crate::error::AppError;
use crate::handlers::{ApiResponse, AppState};
use crate::models::{DispatchPayload, DispatchRecord};
/// Push dispatch handlers
use actix_web::{web, HttpResponse};
use chrono::Utc;

/// Dispatch a push notification to every registered destination.
///
/// POST /api/v1/push/dispatch
pub async fn dispatch_push(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    req: web::Json<DispatchPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = req.into_inner();
    payload.validate()?;

    let destinations = if payload.is_test {
        // validate() guarantees the user id is present
        let user_id = payload
            .test_user_id
            .ok_or_else(|| AppError::Validation("test dispatch requires test_user_id".into()))?;
        state
            .destinations
            .find_for_user(user_id)
            .await?
            .into_iter()
            .collect()
    } else {
        state.destinations.list_all().await?
    };

    let body = serde_json::to_vec(&payload.to_push_json())?;
    let report = state.dispatcher.dispatch(&body, destinations).await;

    let record = DispatchRecord {
        title: payload.title,
        body: payload.body,
        successful: report.successful as i64,
        failed: report.failed as i64,
        total: report.total as i64,
        sent_by: admin.user_id,
        is_test: payload.is_test,
        created_at: Utc::now(),
    };
    if let Err(e) = state.dispatch_log.record(&record).await {
        tracing::warn!("failed to record dispatch outcome: {}", e);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(report)))
}

/// VAPID public key for browser subscriptions.
///
/// GET /api/v1/push/public-key
pub async fn public_key(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
        "public_key": state.vapid_public_key,
    })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/push")
            .route("/dispatch", web::post().to(dispatch_push))
            .route("/public-key", web::get().to(public_key)),
    );
}
