use std::time::Instant;

use crate::error::Result;
use crate::push::PushGateway;
use crate::state::AppState;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::notification_dto::DispatchSummary;
use super::notification_models::ScheduledNotification;
use super::notification_repository::NotificationRepository;

/// Queue operations the dispatcher needs.
///
/// Write-backs carry the `claimed_at` stamp of the claim they settle and
/// report `false` when another invocation has re-claimed the row since.
#[async_trait]
pub trait DispatchQueue: Send + Sync {
    async fn claim_next(
        &self,
        due_before: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<ScheduledNotification>>;
    async fn mark_sent(&self, id: Uuid, claimed_at: DateTime<Utc>, sent_at: DateTime<Utc>) -> Result<bool>;
    async fn mark_failed(&self, id: Uuid, claimed_at: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
impl DispatchQueue for NotificationRepository {
    async fn claim_next(
        &self,
        due_before: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<ScheduledNotification>> {
        NotificationRepository::claim_next(self, due_before, claimed_at, stale_before).await
    }

    async fn mark_sent(&self, id: Uuid, claimed_at: DateTime<Utc>, sent_at: DateTime<Utc>) -> Result<bool> {
        NotificationRepository::mark_sent(self, id, claimed_at, sent_at).await
    }

    async fn mark_failed(&self, id: Uuid, claimed_at: DateTime<Utc>) -> Result<bool> {
        NotificationRepository::mark_failed(self, id, claimed_at).await
    }
}

/// Sends due queue rows to the push gateway and records each outcome.
///
/// Rows are claimed one at a time right before they are sent, so a claim
/// only has to outlive a single gateway call. `Config` rejects leases that
/// are not longer than the push timeout.
pub struct Dispatcher<Q, G> {
    queue: Q,
    gateway: G,
    batch_size: i64,
    claim_lease: Duration,
}

impl<Q: DispatchQueue, G: PushGateway> Dispatcher<Q, G> {
    pub fn new(queue: Q, gateway: G, batch_size: i64, claim_lease: Duration) -> Self {
        Self {
            queue,
            gateway,
            batch_size,
            claim_lease,
        }
    }

    /// One invocation: up to `batch_size` rows due at `now`, oldest first.
    pub async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<DispatchSummary> {
        let started = Instant::now();
        let mut summary = DispatchSummary::default();

        while (summary.processed as i64) < self.batch_size {
            let claimed_at = now + Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero());
            let claimed = self
                .queue
                .claim_next(now, claimed_at, claimed_at - self.claim_lease)
                .await?;

            let Some(notification) = claimed else {
                break;
            };

            summary.processed += 1;
            // The stored stamp is what later write-backs are matched against
            let claimed_at = notification.claimed_at.unwrap_or(claimed_at);
            self.deliver(&notification, claimed_at, &mut summary).await;
        }

        if summary.processed == 0 {
            debug!("No notifications due");
            return Ok(summary);
        }

        info!(
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            write_errors = summary.write_errors,
            lost_claims = summary.lost_claims,
            "Dispatched notifications"
        );

        Ok(summary)
    }

    async fn deliver(
        &self,
        notification: &ScheduledNotification,
        claimed_at: DateTime<Utc>,
        summary: &mut DispatchSummary,
    ) {
        let delivery = self
            .gateway
            .send(&notification.token, &notification.title, &notification.body)
            .await;
        let delivered = delivery.is_ok();

        let write_back = match delivery {
            Ok(()) => {
                self.queue
                    .mark_sent(notification.id, claimed_at, Utc::now())
                    .await
            }
            Err(e) => {
                warn!(
                    notification_id = %notification.id,
                    record_id = %notification.record_id,
                    "Push delivery failed: {}",
                    e
                );
                self.queue.mark_failed(notification.id, claimed_at).await
            }
        };

        match write_back {
            Ok(true) if delivered => summary.sent += 1,
            Ok(true) => summary.failed += 1,
            Ok(false) => {
                summary.lost_claims += 1;
                warn!(
                    notification_id = %notification.id,
                    "Notification was re-claimed by another invocation"
                );
            }
            Err(e) => {
                summary.write_errors += 1;
                error!(notification_id = %notification.id, "Failed to record delivery status: {:?}", e);
            }
        }
    }
}

pub async fn start_dispatcher_service(state: AppState) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let schedule = state.config.dispatch_cron.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _l| {
        let state = state.clone();

        Box::pin(async move {
            if let Err(e) = state.dispatcher.dispatch_due(Utc::now()).await {
                error!("Error dispatching notifications: {:?}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Notification dispatcher started ({})", schedule);
    Ok(scheduler)
}
