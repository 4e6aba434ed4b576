use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::{SubscriptionId, UserId},
        subscription::{event::CreateSubscription, SubscriptionGrant},
    },
    repository::subscription::SubscriptionRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{
    model::subscription::{SubscriptionRow, SUBSCRIPTION_COLUMNS},
    ConnectionPool,
};

#[derive(new)]
pub struct SubscriptionRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl SubscriptionRepository for SubscriptionRepositoryImpl {
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<SubscriptionGrant>> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 ORDER BY start_date DESC"
        );
        let rows = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(user_id.raw())
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(SubscriptionGrant::from).collect())
    }

    async fn create(&self, event: CreateSubscription) -> AppResult<SubscriptionGrant> {
        let mut tx = self.db.begin().await?;

        // 有効な購読は常に 1 件
        sqlx::query(
            "UPDATE subscriptions SET is_active = FALSE WHERE user_id = $1 AND is_active",
        )
        .bind(event.user_id.raw())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let sql = format!(
            r#"
                INSERT INTO subscriptions
                    (subscription_id, user_id, subscription_plan_id,
                     start_date, end_date, is_active, auto_renew)
                VALUES ($1, $2, $3, $4, $5, TRUE, $6)
                RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(SubscriptionId::new().raw())
            .bind(event.user_id.raw())
            .bind(event.subscription_plan_id.raw())
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(event.auto_renew)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(row.into())
    }
}
