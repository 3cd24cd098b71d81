use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's recurring monthly contribution plan, as the scheduler sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub duration_years: u32,
    pub payment_days_of_month: Vec<u32>,
}
