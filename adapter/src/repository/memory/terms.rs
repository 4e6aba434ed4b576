use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kernel::{
    model::{
        id::{TermsAcceptanceId, UserId},
        terms::{event::AcceptTerms, RequiredTerms, TermsAcceptance, TermsCategory},
    },
    repository::terms::TermsRepository,
};
use shared::error::AppResult;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryTermsRepository {
    required: RwLock<Vec<RequiredTerms>>,
    acceptances: RwLock<Vec<TermsAcceptance>>,
}

impl InMemoryTermsRepository {
    pub async fn require(
        &self,
        category: TermsCategory,
        terms_version: &str,
        effective_from: DateTime<Utc>,
    ) {
        self.required.write().await.push(RequiredTerms {
            category,
            terms_version: terms_version.to_string(),
            effective_from,
        });
    }
}

#[async_trait]
impl TermsRepository for InMemoryTermsRepository {
    async fn find_required_terms(
        &self,
        category: TermsCategory,
    ) -> AppResult<Option<RequiredTerms>> {
        let now = Utc::now();
        Ok(self
            .required
            .read()
            .await
            .iter()
            .filter(|r| r.category == category && r.effective_from <= now)
            .max_by_key(|r| r.effective_from)
            .cloned())
    }

    async fn find_latest_acceptance(
        &self,
        user_id: UserId,
        category: TermsCategory,
    ) -> AppResult<Option<TermsAcceptance>> {
        Ok(self
            .acceptances
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.category == category)
            .max_by_key(|a| a.accepted_at)
            .cloned())
    }

    async fn create_acceptance(&self, event: AcceptTerms) -> AppResult<TermsAcceptance> {
        let acceptance = TermsAcceptance {
            id: TermsAcceptanceId::new(),
            user_id: event.user_id,
            category: event.category,
            terms_version: event.terms_version,
            accepted_at: event.accepted_at,
        };
        self.acceptances.write().await.push(acceptance.clone());
        Ok(acceptance)
    }
}
