use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::civil_time::CivilZone;
use crate::device::{DeviceToken, DeviceTokenRepository};
use crate::error::Result;
use crate::notification::notification_models::{
    reminder_body, NewScheduledNotification, REMINDER_TITLE,
};
use crate::notification::NotificationRepository;
use crate::plan::plan_dto::{PreviewEntry, ScheduleOutcome, SkipReason};
use crate::plan::ContributionPlan;
use crate::settings::{NotificationPreferences, SettingsRepository};

use super::dedup::{retain_new_slots, ReminderSlot};
use super::delivery_time::DeliveryRules;
use super::payment_dates::enumerate_payment_dates;

/// What the schedule builder reads and writes.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>>;
    async fn device_tokens(&self, user_id: Uuid) -> Result<Vec<DeviceToken>>;
    async fn scheduled_times(&self, plan_id: Uuid) -> Result<HashSet<DateTime<Utc>>>;
    async fn insert_notifications(&self, rows: &[NewScheduledNotification]) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgScheduleStore {
    settings_repository: SettingsRepository,
    device_repository: DeviceTokenRepository,
    notification_repository: NotificationRepository,
}

impl PgScheduleStore {
    pub fn new(
        settings_repository: SettingsRepository,
        device_repository: DeviceTokenRepository,
        notification_repository: NotificationRepository,
    ) -> Self {
        Self {
            settings_repository,
            device_repository,
            notification_repository,
        }
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>> {
        let settings = self.settings_repository.find_by_user(user_id).await?;
        Ok(settings.map(NotificationPreferences::from))
    }

    async fn device_tokens(&self, user_id: Uuid) -> Result<Vec<DeviceToken>> {
        self.device_repository.find_all_by_user(user_id).await
    }

    async fn scheduled_times(&self, plan_id: Uuid) -> Result<HashSet<DateTime<Utc>>> {
        self.notification_repository.find_scheduled_times(plan_id).await
    }

    async fn insert_notifications(&self, rows: &[NewScheduledNotification]) -> Result<u64> {
        self.notification_repository.insert_batch(rows).await
    }
}

/// Every future reminder slot for a plan, before dedup against the queue.
pub fn plan_slots(plan: &ContributionPlan, rules: &DeliveryRules) -> Vec<ReminderSlot> {
    enumerate_payment_dates(plan.start_date, plan.duration_years, &plan.payment_days_of_month)
        .into_iter()
        .filter_map(|payment_date| {
            rules.delivery_instant(payment_date).map(|scheduled_at| ReminderSlot {
                payment_date,
                scheduled_at,
            })
        })
        .collect()
}

/// Payment dates with their delivery times, without touching storage.
pub fn preview_schedule(
    plan: &ContributionPlan,
    preferences: &NotificationPreferences,
    zone: CivilZone,
) -> Vec<PreviewEntry> {
    let rules = DeliveryRules::from_preferences(preferences, zone);

    plan_slots(plan, &rules)
        .into_iter()
        .map(|slot| PreviewEntry {
            payment_date: slot.payment_date,
            civil_delivery: zone.to_civil(slot.scheduled_at),
            scheduled_at: slot.scheduled_at,
        })
        .collect()
}

/// Turns a newly created plan into queued reminders.
#[derive(Clone)]
pub struct ScheduleBuilder<S> {
    store: S,
    zone: CivilZone,
}

impl<S: ScheduleStore> ScheduleBuilder<S> {
    pub fn new(store: S, zone: CivilZone) -> Self {
        Self { store, zone }
    }

    pub async fn build(&self, plan: &ContributionPlan, now: DateTime<Utc>) -> Result<ScheduleOutcome> {
        if plan.payment_days_of_month.is_empty() {
            return Ok(self.skip(plan, SkipReason::NoPaymentDays));
        }

        let Some(preferences) = self.store.preferences(plan.owner_id).await? else {
            return Ok(self.skip(plan, SkipReason::PreferencesMissing));
        };
        if !preferences.global_enabled {
            return Ok(self.skip(plan, SkipReason::NotificationsDisabled));
        }

        let tokens = self.store.device_tokens(plan.owner_id).await?;
        if tokens.is_empty() {
            return Ok(self.skip(plan, SkipReason::NoDeviceTokens));
        }

        let rules = DeliveryRules::from_preferences(&preferences, self.zone);
        let candidates = plan_slots(plan, &rules);
        let existing = self.store.scheduled_times(plan.id).await?;
        let slots = retain_new_slots(candidates, &existing, now);

        debug!(
            plan_id = %plan.id,
            slots = slots.len(),
            already_queued = existing.len(),
            tokens = tokens.len(),
            "Computed reminder slots"
        );

        if slots.is_empty() {
            return Ok(self.skip(plan, SkipReason::NothingToSchedule));
        }

        let body = reminder_body(&plan.title, rules.pre_reminder_offset_days);
        let rows: Vec<NewScheduledNotification> = slots
            .iter()
            .flat_map(|slot| {
                tokens.iter().map(|device| NewScheduledNotification {
                    user_id: plan.owner_id,
                    record_id: plan.id,
                    token: device.token.clone(),
                    title: REMINDER_TITLE.to_string(),
                    body: body.clone(),
                    scheduled_at: slot.scheduled_at,
                })
            })
            .collect();

        let created = self.store.insert_notifications(&rows).await?;

        info!(plan_id = %plan.id, created, "Scheduled plan reminders");
        Ok(ScheduleOutcome::created(created))
    }

    fn skip(&self, plan: &ContributionPlan, reason: SkipReason) -> ScheduleOutcome {
        info!(plan_id = %plan.id, owner_id = %plan.owner_id, ?reason, "{}", reason.message());
        ScheduleOutcome::skipped(reason)
    }
}
