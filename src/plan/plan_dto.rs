use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::settings::NotificationPreferences;
use super::plan_models::ContributionPlan;

/// Body of the plan-created webhook.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanCreatedPayload {
    pub plan_id: Uuid,
    pub owner_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[schema(value_type = String, example = "2024-01-15")]
    pub start_date: NaiveDate,
    #[validate(range(min = 1, max = 100))]
    pub duration_years: u32,
    #[serde(default)]
    pub payment_days_of_month: Option<Vec<u32>>,
}

impl PlanCreatedPayload {
    /// Validate and convert into a plan. An absent day list becomes empty.
    pub fn into_plan(self) -> Result<ContributionPlan> {
        self.validate()?;

        let days = self.payment_days_of_month.unwrap_or_default();
        if let Some(day) = days.iter().find(|day| !(1..=31).contains(*day)) {
            return Err(AppError::Validation(format!(
                "paymentDaysOfMonth: {} is not a day of the month",
                day
            )));
        }

        Ok(ContributionPlan {
            id: self.plan_id,
            owner_id: self.owner_id,
            title: self.title,
            start_date: self.start_date,
            duration_years: self.duration_years,
            payment_days_of_month: days,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoPaymentDays,
    PreferencesMissing,
    NotificationsDisabled,
    NoDeviceTokens,
    NothingToSchedule,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::NoPaymentDays => "plan has no payment days; nothing scheduled",
            SkipReason::PreferencesMissing => "owner has no notification settings; nothing scheduled",
            SkipReason::NotificationsDisabled => "owner disabled notifications; nothing scheduled",
            SkipReason::NoDeviceTokens => "owner has no registered devices; nothing scheduled",
            SkipReason::NothingToSchedule => "all reminders are already queued or in the past",
        }
    }
}

/// Result of one schedule builder invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleOutcome {
    pub created: u64,
    pub skipped: Option<SkipReason>,
    pub message: String,
}

impl ScheduleOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            created: 0,
            skipped: Some(reason),
            message: reason.message().to_string(),
        }
    }

    pub fn created(created: u64) -> Self {
        Self {
            created,
            skipped: None,
            message: format!("scheduled {} notifications", created),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePreviewRequest {
    pub plan: PlanCreatedPayload,
    pub preferences: NotificationPreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    #[schema(value_type = String, example = "2024-02-01")]
    pub payment_date: NaiveDate,
    #[schema(value_type = String, example = "2024-01-31T08:00:00")]
    pub civil_delivery: NaiveDateTime,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePreviewResponse {
    pub utc_offset_minutes: i32,
    pub entries: Vec<PreviewEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(days: Option<Vec<u32>>) -> PlanCreatedPayload {
        PlanCreatedPayload {
            plan_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Index fund".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            duration_years: 1,
            payment_days_of_month: days,
        }
    }

    #[test]
    fn test_payload_deserializes_from_webhook_json() {
        let payload: PlanCreatedPayload = serde_json::from_str(
            r#"{"planId":"6f9619ff-8b86-d011-b42d-00cf4fc964ff",
                "ownerId":"7f9619ff-8b86-d011-b42d-00cf4fc964ff",
                "title":"Index fund","startDate":"2024-01-15",
                "durationYears":3,"paymentDaysOfMonth":[1,15]}"#,
        )
        .unwrap();

        let plan = payload.into_plan().unwrap();
        assert_eq!(plan.duration_years, 3);
        assert_eq!(plan.payment_days_of_month, vec![1, 15]);
        assert_eq!(plan.start_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_absent_days_become_empty() {
        let plan = payload(None).into_plan().unwrap();
        assert!(plan.payment_days_of_month.is_empty());
    }

    #[test]
    fn test_rejects_day_outside_month_range() {
        assert!(matches!(
            payload(Some(vec![1, 32])).into_plan(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            payload(Some(vec![0])).into_plan(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_zero_duration_and_empty_title() {
        let mut zero = payload(Some(vec![1]));
        zero.duration_years = 0;
        assert!(matches!(zero.into_plan(), Err(AppError::Validation(_))));

        let mut untitled = payload(Some(vec![1]));
        untitled.title = String::new();
        assert!(matches!(untitled.into_plan(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_skip_outcome_serializes_reason() {
        let json = serde_json::to_value(ScheduleOutcome::skipped(SkipReason::NoDeviceTokens)).unwrap();
        assert_eq!(json["created"], 0);
        assert_eq!(json["skipped"], "no_device_tokens");
    }
}
