use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

use crate::model::{
    availability::Capacity,
    book::BookFormat,
    grant::{
        event::{CreateGrant, TransitionGrant},
        EntitlementGrant,
    },
    id::{BookId, GrantId, UserId},
};

/// 利用権の台帳。貸出枠の排他はすべてここの原子的な書き込みで担保する。
/// エンジン側はプロセス内ロックを持たないので、複数インスタンスが同時に動いても
/// 実装側のトランザクション（または同等の条件付き書き込み）だけで整合性が保たれること。
#[mockall::automock]
#[async_trait]
pub trait GrantLedger: Send + Sync {
    // 検査と挿入を 1 つの原子的な操作で行う。
    // 同じ (利用者, 書籍, 形態) に PENDING/ACTIVE が既にある、または
    // 貸出の場合に capacity を超える場合は Conflict
    async fn record_grant(
        &self,
        event: CreateGrant,
        capacity: Capacity,
    ) -> AppResult<EntitlementGrant>;
    async fn find_by_id(&self, grant_id: GrantId) -> AppResult<Option<EntitlementGrant>>;
    // 利用者と書籍に紐づく利用権（終了済みも含む、新しい順）
    async fn find_by_user_and_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> AppResult<Vec<EntitlementGrant>>;
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<EntitlementGrant>>;
    // 書籍・形態ごとの ACTIVE な利用権
    async fn list_active_grants(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Vec<EntitlementGrant>>;
    // 支払い待ちで貸出枠を押さえている件数
    async fn count_pending_rentals(&self, book_id: BookId, format: BookFormat) -> AppResult<u32>;
    // 遷移元が許されない場合は InvalidTransition、存在しなければ EntityNotFound
    async fn transition_status(&self, event: TransitionGrant) -> AppResult<EntitlementGrant>;
    // 期限切れの ACTIVE をまとめて EXPIRED にする。何度呼んでも結果は同じ
    async fn expire_due_grants(&self, now: DateTime<Utc>) -> AppResult<Vec<GrantId>>;
    // cutoff より前に作られたまま確定していない PENDING を、時刻 at で CANCELLED にする
    async fn cancel_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<GrantId>>;
}
