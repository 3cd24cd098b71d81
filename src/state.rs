use crate::civil_time::{CivilZone, HOME_UTC_OFFSET_MINUTES};
use crate::error::{AppError, Result};
use crate::db::DbPool;
use crate::device::DeviceTokenRepository;
use crate::notification::{Dispatcher, NotificationRepository};
use crate::push::HttpPushGateway;
use crate::schedule::{PgScheduleStore, ScheduleBuilder};
use crate::settings::SettingsRepository;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type PushDispatcher = Dispatcher<NotificationRepository, HttpPushGateway>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub schedule_builder: Arc<ScheduleBuilder<PgScheduleStore>>,
    pub dispatcher: Arc<PushDispatcher>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Result<Self> {
        let notification_repository = NotificationRepository::new(db.clone());
        let store = PgScheduleStore::new(
            SettingsRepository::new(db.clone()),
            DeviceTokenRepository::new(db),
            notification_repository.clone(),
        );

        let gateway = HttpPushGateway::new(
            config.push_gateway_url.clone(),
            config.push_gateway_key.clone(),
            config.push_timeout,
        )?;

        let schedule_builder = ScheduleBuilder::new(store, config.civil_zone);
        let dispatcher = Dispatcher::new(
            notification_repository,
            gateway,
            config.dispatch_batch_size,
            config.claim_lease,
        );

        Ok(Self {
            config: Arc::new(config),
            schedule_builder: Arc::new(schedule_builder),
            dispatcher: Arc::new(dispatcher),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub webhook_secret: String,
    pub push_gateway_url: String,
    pub push_gateway_key: String,
    pub push_timeout: Duration,
    pub dispatch_batch_size: i64,
    pub dispatch_cron: String,
    pub claim_lease: chrono::Duration,
    pub civil_zone: CivilZone,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::Configuration(format!("{} must be set", key)))
        };

        let offset_minutes: i32 = parse_or(&lookup, "CIVIL_UTC_OFFSET_MINUTES", HOME_UTC_OFFSET_MINUTES)?;
        let civil_zone = CivilZone::from_offset_minutes(offset_minutes).ok_or_else(|| {
            AppError::Configuration(format!(
                "CIVIL_UTC_OFFSET_MINUTES out of range: {}",
                offset_minutes
            ))
        })?;

        let dispatch_batch_size: i64 = parse_or(&lookup, "DISPATCH_BATCH_SIZE", 100)?;
        if dispatch_batch_size < 1 {
            return Err(AppError::Configuration(
                "DISPATCH_BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        // A claim covers one gateway call; it must expire only after that call has timed out
        let push_timeout_secs: u64 = parse_or(&lookup, "PUSH_TIMEOUT_SECS", 10)?;
        let claim_lease_secs: u64 = parse_or(&lookup, "DISPATCH_CLAIM_LEASE_SECS", 300)?;
        if claim_lease_secs <= push_timeout_secs {
            return Err(AppError::Configuration(format!(
                "DISPATCH_CLAIM_LEASE_SECS ({}) must be greater than PUSH_TIMEOUT_SECS ({})",
                claim_lease_secs, push_timeout_secs
            )));
        }
        let claim_lease = i64::try_from(claim_lease_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                AppError::Configuration("DISPATCH_CLAIM_LEASE_SECS out of range".to_string())
            })?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            webhook_secret: required("WEBHOOK_SECRET")?,
            push_gateway_url: required("PUSH_GATEWAY_URL")?,
            push_gateway_key: required("PUSH_GATEWAY_KEY")?,
            push_timeout: Duration::from_secs(push_timeout_secs),
            dispatch_batch_size,
            dispatch_cron: lookup("DISPATCH_CRON").unwrap_or_else(|| "0 * * * * *".to_string()),
            claim_lease,
            civil_zone,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a number", key))),
        None => Ok(default),
    }
}
