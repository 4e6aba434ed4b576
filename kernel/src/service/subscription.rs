use std::sync::Arc;

use chrono::{DateTime, Utc};
use derive_new::new;
use shared::error::AppResult;

use crate::{
    model::{
        id::{BookId, UserId},
        subscription::SubscriptionGrant,
    },
    repository::{catalog::CatalogRepository, subscription::SubscriptionRepository},
};

/// 購読によるアクセス判定。購読はプランに含まれる書籍だけが対象で、全書籍の読み放題ではない
#[derive(new, Clone)]
pub struct SubscriptionResolver {
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl SubscriptionResolver {
    // 現在有効なもののうち最も新しいもの
    pub async fn effective_subscription(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SubscriptionGrant>> {
        let subscriptions = self.subscriptions.find_by_user_id(user_id).await?;
        Ok(subscriptions
            .into_iter()
            .filter(|s| s.is_effective_at(now))
            .max_by_key(|s| s.start_date))
    }

    pub async fn subscription_for_book(
        &self,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SubscriptionGrant>> {
        let Some(subscription) = self.effective_subscription(user_id, now).await? else {
            return Ok(None);
        };
        let books = self
            .catalog
            .get_subscription_plan_books(subscription.subscription_plan_id)
            .await?;
        Ok(books.contains(&book_id).then_some(subscription))
    }

    pub async fn has_subscription_access(
        &self,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self
            .subscription_for_book(user_id, book_id, now)
            .await?
            .is_some())
    }
}
