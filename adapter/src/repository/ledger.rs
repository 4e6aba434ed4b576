use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::{
    model::{
        availability::Capacity,
        book::BookFormat,
        grant::{
            event::{CreateGrant, TransitionGrant},
            AccessChannel, EntitlementGrant, GrantStatus,
        },
        id::{BookId, GrantId, UserId},
    },
    repository::ledger::GrantLedger,
};
use shared::error::{AppError, AppResult};
use sqlx::types::Uuid;

use super::duplicate_live_grant;
use crate::database::{
    model::grant::{GrantRow, GRANT_COLUMNS},
    ConnectionPool,
};

#[derive(new)]
pub struct GrantLedgerImpl {
    db: ConnectionPool,
}

impl GrantLedgerImpl {
    async fn find_rows(
        &self,
        sql: &str,
        first: Uuid,
        second: Option<Uuid>,
    ) -> AppResult<Vec<EntitlementGrant>> {
        let mut query = sqlx::query_as::<_, GrantRow>(sql).bind(first);
        if let Some(second) = second {
            query = query.bind(second);
        }
        query
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .into_iter()
            .map(EntitlementGrant::try_from)
            .collect()
    }
}

#[async_trait]
impl GrantLedger for GrantLedgerImpl {
    async fn record_grant(
        &self,
        event: CreateGrant,
        capacity: Capacity,
    ) -> AppResult<EntitlementGrant> {
        let mut tx = self.db.begin().await?;

        // (書籍, 形態) 単位でトランザクション終了まで直列化する。
        // DB 側のロックなので複数のエンジンインスタンスからの同時実行でも効く
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{}:{}", event.book_id, event.format))
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        // 期限を過ぎた ACTIVE を先に満了させ、枠と一意制約を空ける
        let lazily_expired = sqlx::query(
            r#"
                UPDATE entitlement_grants
                SET status = 'expired', updated_at = $3
                WHERE book_id = $1 AND format = $2
                  AND status = 'active' AND end_at <= $3
            "#,
        )
        .bind(event.book_id.raw())
        .bind(event.format.as_ref())
        .bind(event.requested_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?
        .rows_affected();
        if lazily_expired > 0 {
            tracing::debug!(
                book_id = %event.book_id,
                format = %event.format,
                lazily_expired,
                "expired elapsed grants before insert"
            );
        }

        if event.channel == AccessChannel::Rental {
            let (held,): (i64,) = sqlx::query_as(
                r#"
                    SELECT COUNT(*)
                    FROM entitlement_grants
                    WHERE book_id = $1 AND format = $2
                      AND channel = 'rental' AND status IN ('pending', 'active')
                "#,
            )
            .bind(event.book_id.raw())
            .bind(event.format.as_ref())
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            if !capacity.admits(u32::try_from(held).unwrap_or(u32::MAX)) {
                return Err(AppError::conflict_unavailable());
            }
        }

        let sql = format!(
            r#"
                INSERT INTO entitlement_grants
                    (grant_id, user_id, book_id, channel, format, status,
                     start_at, end_at, guarantee_amount, source_order_item_id,
                     created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $10)
                RETURNING {GRANT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(GrantId::new().raw())
            .bind(event.user_id.raw())
            .bind(event.book_id.raw())
            .bind(event.channel.as_ref())
            .bind(event.format.as_ref())
            .bind(event.start_at)
            .bind(event.end_at)
            .bind(event.guarantee_amount.map(|m| m.0))
            .bind(event.source_order_item_id.raw())
            .bind(event.requested_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                // 部分一意インデックス違反 = 同じ組に生きている利用権がある
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    duplicate_live_grant(event.format)
                }
                e => AppError::SpecificOperationError(e),
            })?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        row.try_into()
    }

    async fn find_by_id(&self, grant_id: GrantId) -> AppResult<Option<EntitlementGrant>> {
        let sql = format!("SELECT {GRANT_COLUMNS} FROM entitlement_grants WHERE grant_id = $1");
        sqlx::query_as::<_, GrantRow>(&sql)
            .bind(grant_id.raw())
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .map(EntitlementGrant::try_from)
            .transpose()
    }

    async fn find_by_user_and_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> AppResult<Vec<EntitlementGrant>> {
        let sql = format!(
            "SELECT {GRANT_COLUMNS} FROM entitlement_grants \
             WHERE user_id = $1 AND book_id = $2 ORDER BY created_at DESC"
        );
        self.find_rows(&sql, user_id.raw(), Some(book_id.raw()))
            .await
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<EntitlementGrant>> {
        let sql = format!(
            "SELECT {GRANT_COLUMNS} FROM entitlement_grants \
             WHERE user_id = $1 ORDER BY created_at DESC"
        );
        self.find_rows(&sql, user_id.raw(), None).await
    }

    async fn list_active_grants(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Vec<EntitlementGrant>> {
        let sql = format!(
            "SELECT {GRANT_COLUMNS} FROM entitlement_grants \
             WHERE book_id = $1 AND format = $2 AND status = 'active'"
        );
        sqlx::query_as::<_, GrantRow>(&sql)
            .bind(book_id.raw())
            .bind(format.as_ref())
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .into_iter()
            .map(EntitlementGrant::try_from)
            .collect()
    }

    async fn count_pending_rentals(&self, book_id: BookId, format: BookFormat) -> AppResult<u32> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
                SELECT COUNT(*)
                FROM entitlement_grants
                WHERE book_id = $1 AND format = $2
                  AND channel = 'rental' AND status = 'pending'
            "#,
        )
        .bind(book_id.raw())
        .bind(format.as_ref())
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn transition_status(&self, event: TransitionGrant) -> AppResult<EntitlementGrant> {
        let sources: Vec<String> = event
            .status
            .allowed_sources()
            .iter()
            .map(ToString::to_string)
            .collect();

        // 条件付き UPDATE で遷移元を確かめる。有効化では期間の長さを保って開始をずらす
        let assignments = if event.status == GrantStatus::Active {
            "status = $2, start_at = $3, end_at = $3 + (end_at - start_at), updated_at = $3"
        } else {
            "status = $2, updated_at = $3"
        };
        let sql = format!(
            "UPDATE entitlement_grants SET {assignments} \
             WHERE grant_id = $1 AND status = ANY($4) \
             RETURNING {GRANT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(event.grant_id.raw())
            .bind(event.status.as_ref())
            .bind(event.at)
            .bind(&sources)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if let Some(row) = updated {
            return row.try_into();
        }

        let current = self.find_by_id(event.grant_id).await?.ok_or_else(|| {
            AppError::EntityNotFound(format!("grant {} not found", event.grant_id))
        })?;
        current.status.ensure_transition(event.status)?;
        Err(AppError::NoRowAffectedError(format!(
            "grant {} changed while being updated",
            event.grant_id
        )))
    }

    async fn expire_due_grants(&self, now: DateTime<Utc>) -> AppResult<Vec<GrantId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
                UPDATE entitlement_grants
                SET status = 'expired', updated_at = $1
                WHERE status = 'active' AND end_at <= $1
                RETURNING grant_id
            "#,
        )
        .bind(now)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(|(id,)| id.into()).collect())
    }

    async fn cancel_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<GrantId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
                UPDATE entitlement_grants
                SET status = 'cancelled', updated_at = $2
                WHERE status = 'pending' AND created_at < $1
                RETURNING grant_id
            "#,
        )
        .bind(cutoff)
        .bind(at)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(|(id,)| id.into()).collect())
    }
}
