use std::sync::Arc;

use derive_new::new;
use shared::error::{AppError, AppResult};

use crate::{
    model::{
        id::UserId,
        terms::{event::AcceptTerms, RequiredTerms, TermsAcceptance, TermsCategory, TermsValidation},
    },
    repository::terms::TermsRepository,
};

/// 貸出・購読の前に、区分ごとの最新の利用規約に同意済みかを確かめる
#[derive(new, Clone)]
pub struct TermsGate {
    terms: Arc<dyn TermsRepository>,
}

impl TermsGate {
    // 個別区分（例: rental/hardcopy）になければ一般区分（rental）の版を使う
    async fn required_terms(&self, category: TermsCategory) -> AppResult<Option<RequiredTerms>> {
        if let Some(required) = self.terms.find_required_terms(category).await? {
            return Ok(Some(required));
        }
        match category.general() {
            Some(general) => self.terms.find_required_terms(general).await,
            None => Ok(None),
        }
    }

    /// 未同意・旧版への同意は `TermsValidation::Required` で返す。
    /// エラーになるのはストレージの失敗だけ
    pub async fn validate(
        &self,
        user_id: UserId,
        category: TermsCategory,
    ) -> AppResult<TermsValidation> {
        let Some(required) = self.required_terms(category).await? else {
            return Ok(TermsValidation::Valid);
        };

        let accepted = self
            .terms
            .find_latest_acceptance(user_id, required.category)
            .await?;

        let message = match accepted {
            Some(acceptance) if acceptance.terms_version == required.terms_version => {
                return Ok(TermsValidation::Valid);
            }
            Some(acceptance) => format!(
                "accepted terms version {} is outdated; version {} must be accepted",
                acceptance.terms_version, required.terms_version
            ),
            None => format!(
                "terms version {} must be accepted before continuing",
                required.terms_version
            ),
        };

        Ok(TermsValidation::Required {
            category: required.category,
            terms_version: required.terms_version,
            message,
        })
    }

    // 書き込み系の操作の前に呼ぶ。未同意なら TermsRequired で早期に失敗させる
    pub async fn ensure_accepted(&self, user_id: UserId, category: TermsCategory) -> AppResult<()> {
        match self.validate(user_id, category).await? {
            TermsValidation::Valid => Ok(()),
            TermsValidation::Required {
                category,
                terms_version,
                ..
            } => Err(AppError::TermsRequired {
                terms_version,
                category: category.to_string(),
            }),
        }
    }

    pub async fn accept(&self, event: AcceptTerms) -> AppResult<TermsAcceptance> {
        let required = self.required_terms(event.category).await?.ok_or_else(|| {
            AppError::UnprocessableEntity(format!(
                "no terms of service are required for {}",
                event.category
            ))
        })?;

        if required.terms_version != event.terms_version {
            return Err(AppError::UnprocessableEntity(format!(
                "terms version {} is not current; version {} is required",
                event.terms_version, required.terms_version
            )));
        }

        // 同意は実際に適用された区分で記録する
        let acceptance = self
            .terms
            .create_acceptance(AcceptTerms {
                category: required.category,
                ..event
            })
            .await?;
        tracing::info!(
            user_id = %acceptance.user_id,
            category = %acceptance.category,
            terms_version = %acceptance.terms_version,
            "terms accepted"
        );
        Ok(acceptance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{book::BookFormat, id::TermsAcceptanceId},
        repository::terms::MockTermsRepository,
    };
    use chrono::Utc;

    fn required(category: TermsCategory, version: &str) -> RequiredTerms {
        RequiredTerms {
            category,
            terms_version: version.into(),
            effective_from: Utc::now(),
        }
    }

    fn acceptance(user_id: UserId, category: TermsCategory, version: &str) -> TermsAcceptance {
        TermsAcceptance {
            id: TermsAcceptanceId::new(),
            user_id,
            category,
            terms_version: version.into(),
            accepted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_acceptance_reports_required_version() {
        let category = TermsCategory::rental(BookFormat::Hardcopy);
        let mut repo = MockTermsRepository::new();
        repo.expect_find_required_terms()
            .returning(|c| Ok(Some(required(c, "2024-06"))));
        repo.expect_find_latest_acceptance().returning(|_, _| Ok(None));

        let gate = TermsGate::new(Arc::new(repo));
        let res = gate.validate(UserId::new(), category).await.unwrap();

        assert!(!res.is_valid());
        assert_eq!(res.terms_required(), Some("2024-06"));
    }

    #[tokio::test]
    async fn stale_acceptance_is_not_valid() {
        let user_id = UserId::new();
        let category = TermsCategory::rental(BookFormat::Audiobook);
        let mut repo = MockTermsRepository::new();
        repo.expect_find_required_terms()
            .returning(|c| Ok(Some(required(c, "v3"))));
        repo.expect_find_latest_acceptance()
            .returning(move |u, c| Ok(Some(acceptance(u, c, "v2"))));

        let gate = TermsGate::new(Arc::new(repo));
        let res = gate.validate(user_id, category).await.unwrap();

        assert_eq!(res.terms_required(), Some("v3"));
        let err = gate.ensure_accepted(user_id, category).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::TermsRequired { ref terms_version, .. } if terms_version == "v3"
        ));
    }

    #[tokio::test]
    async fn falls_back_to_general_category() {
        let user_id = UserId::new();
        let specific = TermsCategory::rental(BookFormat::Ebook);
        let general = specific.general().unwrap();

        let mut repo = MockTermsRepository::new();
        repo.expect_find_required_terms().returning(move |c| {
            if c == general {
                Ok(Some(required(c, "lend-1")))
            } else {
                Ok(None)
            }
        });
        repo.expect_find_latest_acceptance()
            .withf(move |_, c| *c == general)
            .returning(|u, c| Ok(Some(acceptance(u, c, "lend-1"))));

        let gate = TermsGate::new(Arc::new(repo));
        assert!(gate.validate(user_id, specific).await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn nothing_required_is_valid() {
        let mut repo = MockTermsRepository::new();
        repo.expect_find_required_terms().returning(|_| Ok(None));
        repo.expect_find_latest_acceptance().never();

        let gate = TermsGate::new(Arc::new(repo));
        let res = gate
            .validate(UserId::new(), TermsCategory::subscription())
            .await
            .unwrap();
        assert!(res.is_valid());
    }

    #[tokio::test]
    async fn accepting_an_outdated_version_is_rejected() {
        let mut repo = MockTermsRepository::new();
        repo.expect_find_required_terms()
            .returning(|c| Ok(Some(required(c, "v3"))));
        repo.expect_create_acceptance().never();

        let gate = TermsGate::new(Arc::new(repo));
        let res = gate
            .accept(AcceptTerms::new(
                UserId::new(),
                TermsCategory::subscription(),
                "v1".into(),
                Utc::now(),
            ))
            .await;
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut repo = MockTermsRepository::new();
        repo.expect_find_required_terms()
            .returning(|_| Err(AppError::NoRowAffectedError("terms_versions".into())));

        let gate = TermsGate::new(Arc::new(repo));
        let res = gate
            .validate(UserId::new(), TermsCategory::subscription())
            .await;
        assert!(matches!(res, Err(AppError::NoRowAffectedError(_))));
    }
}
