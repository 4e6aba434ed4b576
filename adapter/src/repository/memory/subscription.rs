use async_trait::async_trait;
use kernel::{
    model::{
        id::{SubscriptionId, UserId},
        subscription::{event::CreateSubscription, SubscriptionGrant},
    },
    repository::subscription::SubscriptionRepository,
};
use shared::error::AppResult;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<Vec<SubscriptionGrant>>,
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<SubscriptionGrant>> {
        let mut found: Vec<_> = self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(found)
    }

    async fn create(&self, event: CreateSubscription) -> AppResult<SubscriptionGrant> {
        let mut subscriptions = self.subscriptions.write().await;
        for s in subscriptions.iter_mut().filter(|s| s.user_id == event.user_id) {
            s.is_active = false;
        }
        let subscription = SubscriptionGrant {
            id: SubscriptionId::new(),
            user_id: event.user_id,
            subscription_plan_id: event.subscription_plan_id,
            start_date: event.start_date,
            end_date: event.end_date,
            is_active: true,
            auto_renew: event.auto_renew,
        };
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }
}
