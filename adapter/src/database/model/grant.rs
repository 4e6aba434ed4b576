use chrono::{DateTime, Utc};
use kernel::model::{book::Money, grant::EntitlementGrant};
use shared::error::AppError;
use sqlx::types::Uuid;

use super::parse_column;

pub const GRANT_COLUMNS: &str = "grant_id, user_id, book_id, channel, format, status, \
    start_at, end_at, guarantee_amount, source_order_item_id, created_at";

#[derive(sqlx::FromRow)]
pub struct GrantRow {
    pub grant_id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub channel: String,
    pub format: String,
    pub status: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub guarantee_amount: Option<i64>,
    pub source_order_item_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for EntitlementGrant {
    type Error = AppError;

    fn try_from(value: GrantRow) -> Result<Self, Self::Error> {
        let GrantRow {
            grant_id,
            user_id,
            book_id,
            channel,
            format,
            status,
            start_at,
            end_at,
            guarantee_amount,
            source_order_item_id,
            created_at,
        } = value;
        Ok(EntitlementGrant {
            id: grant_id.into(),
            user_id: user_id.into(),
            book_id: book_id.into(),
            channel: parse_column(&channel, "channel")?,
            format: parse_column(&format, "format")?,
            status: parse_column(&status, "status")?,
            start_at,
            end_at,
            guarantee_amount: guarantee_amount.map(Money),
            source_order_item_id: source_order_item_id.into(),
            created_at,
        })
    }
}
