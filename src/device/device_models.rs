use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered push token; a user may have several devices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceToken {
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
}
