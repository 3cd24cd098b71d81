use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::civil_time::QuietHours;

/// Row of `user_settings`, notification columns only.
#[derive(Debug, Clone, FromRow)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub notification_global_enabled: bool,
    pub notification_default_time: NaiveTime,
    pub notification_pre_reminder: i32,
    pub notification_dnd_enabled: bool,
    pub notification_dnd_start: Option<NaiveTime>,
    pub notification_dnd_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DoNotDisturb {
    pub enabled: bool,
    #[schema(value_type = String, example = "22:00:00")]
    pub start: NaiveTime,
    #[schema(value_type = String, example = "08:00:00")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub global_enabled: bool,
    #[schema(value_type = String, example = "09:00:00")]
    pub default_reminder_time: NaiveTime,
    pub pre_reminder_offset_days: u32,
    pub do_not_disturb: Option<DoNotDisturb>,
}

impl NotificationPreferences {
    pub fn quiet_hours(&self) -> Option<QuietHours> {
        self.do_not_disturb
            .filter(|dnd| dnd.enabled)
            .map(|dnd| QuietHours::new(dnd.start, dnd.end))
    }
}

impl From<UserSettings> for NotificationPreferences {
    fn from(settings: UserSettings) -> Self {
        let do_not_disturb = match (settings.notification_dnd_start, settings.notification_dnd_end) {
            (Some(start), Some(end)) => Some(DoNotDisturb {
                enabled: settings.notification_dnd_enabled,
                start,
                end,
            }),
            _ => None,
        };

        Self {
            global_enabled: settings.notification_global_enabled,
            default_reminder_time: settings.notification_default_time,
            pre_reminder_offset_days: u32::try_from(settings.notification_pre_reminder).unwrap_or(0),
            do_not_disturb,
        }
    }
}
