use std::collections::HashSet;

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use super::notification_models::{NewScheduledNotification, NotificationStatus, ScheduledNotification};

// 7 binds per row keeps each statement well under the 65535 parameter limit.
const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_scheduled_times(&self, record_id: Uuid) -> Result<HashSet<DateTime<Utc>>> {
        let times = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT scheduled_at FROM scheduled_notifications WHERE record_id = $1"
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(times.into_iter().collect())
    }

    /// Insert all rows in one transaction; rows already present are skipped.
    /// Returns the number of rows actually written.
    pub async fn insert_batch(&self, rows: &[NewScheduledNotification]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO scheduled_notifications
                    (user_id, record_id, token, title, body, scheduled_at, status) "
            );
            builder.push_values(chunk, |mut row, notification| {
                row.push_bind(notification.user_id)
                    .push_bind(notification.record_id)
                    .push_bind(&notification.token)
                    .push_bind(&notification.title)
                    .push_bind(&notification.body)
                    .push_bind(notification.scheduled_at)
                    .push_bind(NotificationStatus::Pending.as_str());
            });
            builder.push(" ON CONFLICT (record_id, token, scheduled_at) DO NOTHING");

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(inserted)
    }

    /// Claim the oldest due row, moving it to `sending` stamped with `claimed_at`.
    ///
    /// Rows left in `sending` by an invocation that never wrote back become
    /// claimable again once their `claimed_at` is older than `stale_before`.
    pub async fn claim_next(
        &self,
        due_before: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<ScheduledNotification>> {
        let notification = sqlx::query_as::<_, ScheduledNotification>(
            "UPDATE scheduled_notifications SET status = 'sending', claimed_at = $2
             WHERE id = (
                SELECT id FROM scheduled_notifications
                WHERE scheduled_at <= $1
                AND (status = 'pending' OR (status = 'sending' AND claimed_at < $3))
                ORDER BY scheduled_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
             )
             RETURNING *"
        )
        .bind(due_before)
        .bind(claimed_at)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Only succeeds while the row is still held by the claim stamped `claimed_at`.
    pub async fn mark_sent(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_notifications SET status = 'sent', sent_at = $3
             WHERE id = $1 AND status = 'sending' AND claimed_at = $2"
        )
        .bind(id)
        .bind(claimed_at)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_failed(&self, id: Uuid, claimed_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_notifications SET status = 'failed'
             WHERE id = $1 AND status = 'sending' AND claimed_at = $2"
        )
        .bind(id)
        .bind(claimed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
