pub mod dedup;
pub mod delivery_time;
pub mod payment_dates;
pub mod schedule_service;

pub use schedule_service::{preview_schedule, PgScheduleStore, ScheduleBuilder};
