use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Heading shown on every contribution reminder.
pub const REMINDER_TITLE: &str = "Contribution reminder";

/// Stored as lowercase text in `scheduled_notifications.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sending => "sending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued reminder for one device token.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduledNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub record_id: Uuid,
    pub token: String,
    pub title: String,
    pub body: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Queue row as built by the schedule builder, before the database assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledNotification {
    pub user_id: Uuid,
    pub record_id: Uuid,
    pub token: String,
    pub title: String,
    pub body: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Reminder text for a plan, e.g. "Index fund — due in 3 days".
pub fn reminder_body(plan_title: &str, pre_reminder_offset_days: u32) -> String {
    match pre_reminder_offset_days {
        0 => format!("{} — due today", plan_title),
        days => format!("{} — due in {} days", plan_title, days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_status_display() {
        assert_eq!(NotificationStatus::Pending.to_string(), "pending");
        assert_eq!(NotificationStatus::Sending.to_string(), "sending");
        assert_eq!(NotificationStatus::Sent.to_string(), "sent");
        assert_eq!(NotificationStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_reminder_body() {
        assert_eq!(reminder_body("S&P 500", 0), "S&P 500 — due today");
        assert_eq!(reminder_body("S&P 500", 3), "S&P 500 — due in 3 days");
    }
}
