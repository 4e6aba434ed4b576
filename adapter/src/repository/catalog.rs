use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        book::{BookFormat, Money},
        id::{BookId, SubscriptionPlanId},
    },
    repository::catalog::CatalogRepository,
};
use shared::error::{AppError, AppResult};
use sqlx::types::Uuid;

use crate::database::{model::parse_column, ConnectionPool};

#[derive(new)]
pub struct CatalogRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn get_book_formats(&self, book_id: BookId) -> AppResult<BTreeSet<BookFormat>> {
        // 形態が 1 つもない書籍と存在しない書籍を区別するため LEFT JOIN する
        let rows: Vec<(Option<String>,)> = sqlx::query_as(
            r#"
                SELECT f.format
                FROM books AS b
                LEFT JOIN book_formats AS f USING (book_id)
                WHERE b.book_id = $1
            "#,
        )
        .bind(book_id.raw())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if rows.is_empty() {
            return Err(AppError::EntityNotFound(format!("book {book_id} not found")));
        }

        rows.into_iter()
            .filter_map(|(format,)| format)
            .map(|format| parse_column(&format, "format"))
            .collect()
    }

    async fn get_rental_capacity(&self, book_id: BookId, format: BookFormat) -> AppResult<u32> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT rental_capacity FROM book_formats WHERE book_id = $1 AND format = $2",
        )
        .bind(book_id.raw())
        .bind(format.as_ref())
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row
            .and_then(|(capacity,)| u32::try_from(capacity).ok())
            .unwrap_or(0))
    }

    async fn get_guarantee_amount(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Option<Money>> {
        let row: Option<(Option<i64>,)> = sqlx::query_as(
            "SELECT guarantee_amount FROM book_formats WHERE book_id = $1 AND format = $2",
        )
        .bind(book_id.raw())
        .bind(format.as_ref())
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.and_then(|(amount,)| amount).map(Money))
    }

    async fn exists_subscription_plan(&self, plan_id: SubscriptionPlanId) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM subscription_plans WHERE subscription_plan_id = $1)",
        )
        .bind(plan_id.raw())
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(exists)
    }

    async fn get_subscription_plan_books(
        &self,
        plan_id: SubscriptionPlanId,
    ) -> AppResult<HashSet<BookId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT book_id FROM subscription_plan_books WHERE subscription_plan_id = $1",
        )
        .bind(plan_id.raw())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(|(id,)| id.into()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures("common"))]
    #[ignore = "requires DATABASE_URL"]
    async fn reads_formats_and_capacity(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = CatalogRepositoryImpl::new(ConnectionPool::new(pool));
        let book_id: BookId = "5b4c96ac-316a-4bee-8e69-cac5eb84ff4c".parse()?;

        let formats = repo.get_book_formats(book_id).await?;
        assert_eq!(
            formats,
            BTreeSet::from([BookFormat::Ebook, BookFormat::Hardcopy])
        );
        assert_eq!(repo.get_rental_capacity(book_id, BookFormat::Hardcopy).await?, 1);
        assert_eq!(repo.get_rental_capacity(book_id, BookFormat::Audiobook).await?, 0);
        assert_eq!(
            repo.get_guarantee_amount(book_id, BookFormat::Hardcopy).await?,
            Some(Money(3000))
        );

        let res = repo.get_book_formats(BookId::new()).await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        Ok(())
    }

    #[sqlx::test(fixtures("common"))]
    #[ignore = "requires DATABASE_URL"]
    async fn tells_known_plans_from_unknown(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = CatalogRepositoryImpl::new(ConnectionPool::new(pool));
        let plan_id: SubscriptionPlanId = "9582f9de-0fd1-4892-b20c-70139a7eb95b".parse()?;

        assert!(repo.exists_subscription_plan(plan_id).await?);
        assert!(!repo.exists_subscription_plan(SubscriptionPlanId::new()).await?);
        Ok(())
    }
}
