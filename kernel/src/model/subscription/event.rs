use chrono::{DateTime, Utc};
use derive_new::new;

use crate::model::id::{SubscriptionPlanId, UserId};

// 登録すると同じ利用者の既存の有効な購読は無効化される
#[derive(new, Debug, Clone)]
pub struct CreateSubscription {
    pub user_id: UserId,
    pub subscription_plan_id: SubscriptionPlanId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub auto_renew: bool,
}
