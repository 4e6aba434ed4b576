use chrono::{DateTime, Utc};
use garde::Validate;
use kernel::model::{
    book::{BookFormat, Money},
    grant::{AccessChannel, EntitlementGrant, GrantStatus},
    id::{BookId, GrantId, OrderItemId, UserId},
};
use serde::{Deserialize, Serialize};

/// 貸出・購入の登録リクエスト。注文明細は注文サービス側で採番済み
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrantRequest {
    #[garde(skip)]
    pub format: BookFormat,
    #[garde(skip)]
    pub order_item_id: OrderItemId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    pub id: GrantId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub channel: AccessChannel,
    pub format: BookFormat,
    pub status: GrantStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub guarantee_amount: Option<Money>,
    pub source_order_item_id: OrderItemId,
    pub created_at: DateTime<Utc>,
}

impl From<EntitlementGrant> for GrantResponse {
    fn from(value: EntitlementGrant) -> Self {
        let EntitlementGrant {
            id,
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
        Self {
            id,
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
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantsResponse {
    pub items: Vec<GrantResponse>,
}

impl From<Vec<EntitlementGrant>> for GrantsResponse {
    fn from(value: Vec<EntitlementGrant>) -> Self {
        Self {
            items: value.into_iter().map(GrantResponse::from).collect(),
        }
    }
}
