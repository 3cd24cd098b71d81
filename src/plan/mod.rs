pub mod plan_models;
pub mod plan_dto;
pub mod plan_handlers;

pub use plan_models::ContributionPlan;
pub use plan_handlers::{plan_created, schedule_preview};
