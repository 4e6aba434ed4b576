use chrono::{DateTime, Duration, Utc};
use garde::Validate;
use kernel::model::{
    id::{SubscriptionId, SubscriptionPlanId, UserId},
    subscription::{event::CreateSubscription, SubscriptionGrant},
};
use serde::{Deserialize, Serialize};

/// 決済サービスが支払い確定後に送る購読の登録
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[garde(skip)]
    pub user_id: UserId,
    #[garde(skip)]
    pub subscription_plan_id: SubscriptionPlanId,
    // 省略時はリクエスト時刻から開始
    #[garde(skip)]
    pub start_date: Option<DateTime<Utc>>,
    #[garde(range(min = 1, max = 366))]
    pub duration_days: i64,
    #[garde(skip)]
    #[serde(default)]
    pub auto_renew: bool,
}

impl CreateSubscriptionRequest {
    pub fn into_event(self, now: DateTime<Utc>) -> CreateSubscription {
        let start_date = self.start_date.unwrap_or(now);
        CreateSubscription::new(
            self.user_id,
            self.subscription_plan_id,
            start_date,
            start_date + Duration::days(self.duration_days),
            self.auto_renew,
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub subscription_plan_id: SubscriptionPlanId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub auto_renew: bool,
}

impl From<SubscriptionGrant> for SubscriptionResponse {
    fn from(value: SubscriptionGrant) -> Self {
        let SubscriptionGrant {
            id,
            user_id,
            subscription_plan_id,
            start_date,
            end_date,
            is_active,
            auto_renew,
        } = value;
        Self {
            id,
            user_id,
            subscription_plan_id,
            start_date,
            end_date,
            is_active,
            auto_renew,
        }
    }
}
