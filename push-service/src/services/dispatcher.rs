/// Delivery Dispatcher
///
/// Fans one encryption + delivery pipeline out per destination, lets every
/// pipeline settle independently, and aggregates the outcomes. One bad
/// destination never aborts its siblings: each pipeline yields exactly one
/// outcome, and the aggregate is produced only after all have settled.
/// Destinations confirmed gone (404/410) are evicted from the store once,
/// after the fan-in barrier.
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;
use webpush_shared::{WebPushClient, WebPushError};

use crate::models::{DeliveryOutcome, DeliveryResult, Destination, DispatchReport};
use crate::storage::DestinationStore;

pub struct Dispatcher {
    client: Arc<WebPushClient>,
    store: Arc<dyn DestinationStore>,
}

impl Dispatcher {
    pub fn new(client: Arc<WebPushClient>, store: Arc<dyn DestinationStore>) -> Self {
        Self { client, store }
    }

    /// Send one encrypted payload to every destination and settle all
    /// outcomes. Always returns an aggregate, even if every destination
    /// failed; only the surrounding call can abort a dispatch.
    pub async fn dispatch(
        &self,
        payload: &[u8],
        destinations: Vec<Destination>,
    ) -> DispatchReport {
        let total = destinations.len();
        info!(total, "dispatching push notifications");

        let mut tasks = Vec::with_capacity(total);
        for destination in destinations {
            let client = self.client.clone();
            let body = payload.to_vec();
            let destination_id = destination.id;
            let handle =
                tokio::spawn(async move { deliver_one(client, destination, body).await });
            tasks.push((destination_id, handle));
        }

        // Fan-in barrier: every pipeline yields exactly one result
        let mut results = Vec::with_capacity(total);
        for (destination_id, handle) in tasks {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(%destination_id, "delivery task failed: {}", e);
                    results.push(DeliveryResult {
                        destination_id,
                        outcome: DeliveryOutcome::Rejected,
                        error: Some(format!("delivery task failed: {e}")),
                    });
                }
            }
        }

        let successful = results
            .iter()
            .filter(|r| r.outcome == DeliveryOutcome::Delivered)
            .count();
        let gone_ids: Vec<Uuid> = results
            .iter()
            .filter(|r| r.outcome == DeliveryOutcome::Gone)
            .map(|r| r.destination_id)
            .collect();

        // Evictions apply only after all pipelines settled
        if !gone_ids.is_empty() {
            if let Err(e) = self.store.delete_by_ids(&gone_ids).await {
                warn!("failed to evict {} dead destinations: {}", gone_ids.len(), e);
            }
        }

        let report = DispatchReport {
            successful,
            failed: total - successful,
            total,
            deleted_destination_ids: gone_ids,
        };
        info!(
            successful = report.successful,
            failed = report.failed,
            deleted = report.deleted_destination_ids.len(),
            "dispatch complete"
        );
        report
    }
}

/// One delivery pipeline. Every error is settled into an outcome here —
/// nothing propagates past this boundary.
async fn deliver_one(
    client: Arc<WebPushClient>,
    destination: Destination,
    payload: Vec<u8>,
) -> DeliveryResult {
    match client
        .send(
            &destination.endpoint,
            &destination.p256dh,
            &destination.auth,
            &payload,
        )
        .await
    {
        Ok(()) => DeliveryResult {
            destination_id: destination.id,
            outcome: DeliveryOutcome::Delivered,
            error: None,
        },
        Err(err @ WebPushError::DestinationGone(_)) => {
            info!(destination_id = %destination.id, "destination gone, scheduling eviction");
            DeliveryResult {
                destination_id: destination.id,
                outcome: DeliveryOutcome::Gone,
                error: Some(err.to_string()),
            }
        }
        Err(err) => {
            warn!(destination_id = %destination.id, "push delivery failed: {}", err);
            DeliveryResult {
                destination_id: destination.id,
                outcome: DeliveryOutcome::Rejected,
                error: Some(err.to_string()),
            }
        }
    }
}
