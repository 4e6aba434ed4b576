use chrono::{DateTime, Utc};
use kernel::model::terms::{RequiredTerms, TermsAcceptance, TermsCategory};
use shared::error::{AppError, AppResult};
use sqlx::types::Uuid;

use super::parse_column;

fn category(rental_type: &str, specific_rental_type: Option<&str>) -> AppResult<TermsCategory> {
    Ok(TermsCategory {
        rental_type: parse_column(rental_type, "rental_type")?,
        specific_rental_type: specific_rental_type
            .map(|s| parse_column(s, "specific_rental_type"))
            .transpose()?,
    })
}

pub fn specific_column(category: &TermsCategory) -> Option<String> {
    category.specific_rental_type.map(|f| f.to_string())
}

#[derive(sqlx::FromRow)]
pub struct RequiredTermsRow {
    pub rental_type: String,
    pub specific_rental_type: Option<String>,
    pub terms_version: String,
    pub effective_from: DateTime<Utc>,
}

impl TryFrom<RequiredTermsRow> for RequiredTerms {
    type Error = AppError;

    fn try_from(value: RequiredTermsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            category: category(&value.rental_type, value.specific_rental_type.as_deref())?,
            terms_version: value.terms_version,
            effective_from: value.effective_from,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct TermsAcceptanceRow {
    pub terms_acceptance_id: Uuid,
    pub user_id: Uuid,
    pub rental_type: String,
    pub specific_rental_type: Option<String>,
    pub terms_version: String,
    pub accepted_at: DateTime<Utc>,
}

impl TryFrom<TermsAcceptanceRow> for TermsAcceptance {
    type Error = AppError;

    fn try_from(value: TermsAcceptanceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.terms_acceptance_id.into(),
            user_id: value.user_id.into(),
            category: category(&value.rental_type, value.specific_rental_type.as_deref())?,
            terms_version: value.terms_version,
            accepted_at: value.accepted_at,
        })
    }
}
