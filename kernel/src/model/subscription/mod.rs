use chrono::{DateTime, Utc};

use super::id::{SubscriptionId, SubscriptionPlanId, UserId};

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionGrant {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub subscription_plan_id: SubscriptionPlanId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub auto_renew: bool,
}

impl SubscriptionGrant {
    // [start_date, end_date) の半開区間
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now < self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn effective_window_is_half_open() {
        let start = Utc::now();
        let sub = SubscriptionGrant {
            id: SubscriptionId::new(),
            user_id: UserId::new(),
            subscription_plan_id: SubscriptionPlanId::new(),
            start_date: start,
            end_date: start + Duration::days(30),
            is_active: true,
            auto_renew: false,
        };

        assert!(sub.is_effective_at(start));
        assert!(sub.is_effective_at(start + Duration::days(29)));
        assert!(!sub.is_effective_at(start + Duration::days(30)));
        assert!(!sub.is_effective_at(start - Duration::seconds(1)));

        let inactive = SubscriptionGrant {
            is_active: false,
            ..sub
        };
        assert!(!inactive.is_effective_at(start + Duration::days(1)));
    }
}
