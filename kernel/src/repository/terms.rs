use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::UserId,
    terms::{event::AcceptTerms, RequiredTerms, TermsAcceptance, TermsCategory},
};

#[mockall::automock]
#[async_trait]
pub trait TermsRepository: Send + Sync {
    // 区分に完全一致する、現在有効な最新の版
    async fn find_required_terms(&self, category: TermsCategory)
        -> AppResult<Option<RequiredTerms>>;
    async fn find_latest_acceptance(
        &self,
        user_id: UserId,
        category: TermsCategory,
    ) -> AppResult<Option<TermsAcceptance>>;
    async fn create_acceptance(&self, event: AcceptTerms) -> AppResult<TermsAcceptance>;
}
