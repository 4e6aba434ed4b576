use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::{
    book::BookFormat,
    id::{TermsAcceptanceId, UserId},
};

pub mod event;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase")]
pub enum RentalType {
    Rental,
    Subscription,
}

/// 規約の適用区分。紙の本・オーディオの貸出（保証金と返却の条項）と
/// 電子書籍の貸出では別の版を要求できる
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermsCategory {
    pub rental_type: RentalType,
    pub specific_rental_type: Option<BookFormat>,
}

impl TermsCategory {
    pub fn rental(format: BookFormat) -> Self {
        Self {
            rental_type: RentalType::Rental,
            specific_rental_type: Some(format),
        }
    }

    pub fn subscription() -> Self {
        Self {
            rental_type: RentalType::Subscription,
            specific_rental_type: None,
        }
    }

    // 個別区分の規約がない場合に参照する区分
    pub fn general(self) -> Option<Self> {
        self.specific_rental_type.map(|_| Self {
            rental_type: self.rental_type,
            specific_rental_type: None,
        })
    }
}

impl std::fmt::Display for TermsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.specific_rental_type {
            Some(specific) => write!(f, "{}/{}", self.rental_type, specific),
            None => write!(f, "{}", self.rental_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredTerms {
    pub category: TermsCategory,
    pub terms_version: String,
    pub effective_from: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsAcceptance {
    pub id: TermsAcceptanceId,
    pub user_id: UserId,
    pub category: TermsCategory,
    pub terms_version: String,
    pub accepted_at: DateTime<Utc>,
}

/// 規約チェックの結果。未同意は利用者が解消できる想定内の状態なのでエラーにはしない
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermsValidation {
    Valid,
    Required {
        category: TermsCategory,
        terms_version: String,
        message: String,
    },
}

impl TermsValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, TermsValidation::Valid)
    }

    pub fn terms_required(&self) -> Option<&str> {
        match self {
            TermsValidation::Valid => None,
            TermsValidation::Required { terms_version, .. } => Some(terms_version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_render_as_path() {
        assert_eq!(
            TermsCategory::rental(BookFormat::Hardcopy).to_string(),
            "rental/hardcopy"
        );
        assert_eq!(TermsCategory::subscription().to_string(), "subscription");
    }

    #[test]
    fn only_specific_categories_fall_back() {
        let general = TermsCategory::rental(BookFormat::Audiobook).general().unwrap();
        assert_eq!(general.rental_type, RentalType::Rental);
        assert_eq!(general.specific_rental_type, None);
        assert_eq!(general.general(), None);
    }
}
