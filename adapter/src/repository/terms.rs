use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::{TermsAcceptanceId, UserId},
        terms::{event::AcceptTerms, RequiredTerms, TermsAcceptance, TermsCategory},
    },
    repository::terms::TermsRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{
    model::terms::{specific_column, RequiredTermsRow, TermsAcceptanceRow},
    ConnectionPool,
};

#[derive(new)]
pub struct TermsRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl TermsRepository for TermsRepositoryImpl {
    async fn find_required_terms(
        &self,
        category: TermsCategory,
    ) -> AppResult<Option<RequiredTerms>> {
        sqlx::query_as::<_, RequiredTermsRow>(
            r#"
                SELECT rental_type, specific_rental_type, terms_version, effective_from
                FROM terms_versions
                WHERE rental_type = $1
                  AND specific_rental_type IS NOT DISTINCT FROM $2
                  AND effective_from <= now()
                ORDER BY effective_from DESC
                LIMIT 1
            "#,
        )
        .bind(category.rental_type.as_ref())
        .bind(specific_column(&category))
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(RequiredTerms::try_from)
        .transpose()
    }

    async fn find_latest_acceptance(
        &self,
        user_id: UserId,
        category: TermsCategory,
    ) -> AppResult<Option<TermsAcceptance>> {
        sqlx::query_as::<_, TermsAcceptanceRow>(
            r#"
                SELECT terms_acceptance_id, user_id, rental_type, specific_rental_type,
                       terms_version, accepted_at
                FROM terms_acceptances
                WHERE user_id = $1
                  AND rental_type = $2
                  AND specific_rental_type IS NOT DISTINCT FROM $3
                ORDER BY accepted_at DESC
                LIMIT 1
            "#,
        )
        .bind(user_id.raw())
        .bind(category.rental_type.as_ref())
        .bind(specific_column(&category))
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(TermsAcceptance::try_from)
        .transpose()
    }

    async fn create_acceptance(&self, event: AcceptTerms) -> AppResult<TermsAcceptance> {
        sqlx::query_as::<_, TermsAcceptanceRow>(
            r#"
                INSERT INTO terms_acceptances
                    (terms_acceptance_id, user_id, rental_type, specific_rental_type,
                     terms_version, accepted_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING terms_acceptance_id, user_id, rental_type, specific_rental_type,
                          terms_version, accepted_at
            "#,
        )
        .bind(TermsAcceptanceId::new().raw())
        .bind(event.user_id.raw())
        .bind(event.category.rental_type.as_ref())
        .bind(specific_column(&event.category))
        .bind(&event.terms_version)
        .bind(event.accepted_at)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .try_into()
    }
}
