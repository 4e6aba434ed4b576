use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    book::{BookFormat, Money},
    id::{BookId, SubscriptionPlanId},
};

// カタログは外部の管理画面が持つ。エンジンは読むだけ
#[mockall::automock]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // 存在しない書籍は EntityNotFound
    async fn get_book_formats(&self, book_id: BookId) -> AppResult<BTreeSet<BookFormat>>;
    // 取り扱いのない形態は 0
    async fn get_rental_capacity(&self, book_id: BookId, format: BookFormat) -> AppResult<u32>;
    async fn get_guarantee_amount(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Option<Money>>;
    async fn exists_subscription_plan(&self, plan_id: SubscriptionPlanId) -> AppResult<bool>;
    async fn get_subscription_plan_books(
        &self,
        plan_id: SubscriptionPlanId,
    ) -> AppResult<HashSet<BookId>>;
}
