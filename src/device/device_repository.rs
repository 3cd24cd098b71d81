use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::device_models::DeviceToken;

#[derive(Clone)]
pub struct DeviceTokenRepository {
    pool: PgPool,
}

impl DeviceTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<DeviceToken>> {
        let tokens = sqlx::query_as::<_, DeviceToken>(
            "SELECT user_id, token, platform FROM user_push_tokens
             WHERE user_id = $1
             ORDER BY token"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }
}
