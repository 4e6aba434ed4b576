use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::UserId,
    subscription::{event::CreateSubscription, SubscriptionGrant},
};

#[mockall::automock]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    // 新しい順
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<SubscriptionGrant>>;
    // 既存の有効な購読の無効化と登録を 1 トランザクションで行う
    async fn create(&self, event: CreateSubscription) -> AppResult<SubscriptionGrant>;
}
