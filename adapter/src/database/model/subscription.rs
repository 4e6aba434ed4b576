use chrono::{DateTime, Utc};
use kernel::model::subscription::SubscriptionGrant;
use sqlx::types::Uuid;

pub const SUBSCRIPTION_COLUMNS: &str =
    "subscription_id, user_id, subscription_plan_id, start_date, end_date, is_active, auto_renew";

#[derive(sqlx::FromRow)]
pub struct SubscriptionRow {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub subscription_plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub auto_renew: bool,
}

impl From<SubscriptionRow> for SubscriptionGrant {
    fn from(value: SubscriptionRow) -> Self {
        Self {
            id: value.subscription_id.into(),
            user_id: value.user_id.into(),
            subscription_plan_id: value.subscription_plan_id.into(),
            start_date: value.start_date,
            end_date: value.end_date,
            is_active: value.is_active,
            auto_renew: value.auto_renew,
        }
    }
}
