use chrono::{DateTime, Utc};
use derive_new::new;

use super::TermsCategory;
use crate::model::id::UserId;

#[derive(new, Debug, Clone)]
pub struct AcceptTerms {
    pub user_id: UserId,
    pub category: TermsCategory,
    pub terms_version: String,
    pub accepted_at: DateTime<Utc>,
}
