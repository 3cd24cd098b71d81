use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::settings_models::UserSettings;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserSettings>> {
        let settings = sqlx::query_as::<_, UserSettings>(
            "SELECT user_id, notification_global_enabled, notification_default_time,
                    notification_pre_reminder, notification_dnd_enabled,
                    notification_dnd_start, notification_dnd_end
             FROM user_settings WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }
}
