use chrono::{DateTime, Utc};
use garde::Validate;
use kernel::model::{
    book::BookFormat,
    id::{TermsAcceptanceId, UserId},
    terms::{event::AcceptTerms, RentalType, TermsAcceptance, TermsCategory, TermsValidation},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsCategoryQuery {
    pub rental_type: RentalType,
    pub specific_rental_type: Option<BookFormat>,
}

impl From<TermsCategoryQuery> for TermsCategory {
    fn from(value: TermsCategoryQuery) -> Self {
        Self {
            rental_type: value.rental_type,
            specific_rental_type: value.specific_rental_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<TermsValidation> for TermsValidationResponse {
    fn from(value: TermsValidation) -> Self {
        match value {
            TermsValidation::Valid => Self {
                valid: true,
                terms_required: None,
                category: None,
                message: None,
            },
            TermsValidation::Required {
                category,
                terms_version,
                message,
            } => Self {
                valid: false,
                terms_required: Some(terms_version),
                category: Some(category.to_string()),
                message: Some(message),
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptTermsRequest {
    #[garde(skip)]
    pub rental_type: RentalType,
    #[garde(skip)]
    pub specific_rental_type: Option<BookFormat>,
    #[garde(length(min = 1, max = 64))]
    pub terms_version: String,
}

impl AcceptTermsRequest {
    pub fn into_event(self, user_id: UserId, accepted_at: DateTime<Utc>) -> AcceptTerms {
        let category = TermsCategory {
            rental_type: self.rental_type,
            specific_rental_type: self.specific_rental_type,
        };
        AcceptTerms::new(user_id, category, self.terms_version, accepted_at)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsAcceptanceResponse {
    pub id: TermsAcceptanceId,
    pub user_id: UserId,
    pub category: String,
    pub terms_version: String,
    pub accepted_at: DateTime<Utc>,
}

impl From<TermsAcceptance> for TermsAcceptanceResponse {
    fn from(value: TermsAcceptance) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            category: value.category.to_string(),
            terms_version: value.terms_version,
            accepted_at: value.accepted_at,
        }
    }
}
