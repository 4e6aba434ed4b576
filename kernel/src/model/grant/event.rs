use chrono::{DateTime, Utc};
use derive_new::new;

use super::{AccessChannel, GrantStatus};
use crate::model::{
    book::{BookFormat, Money},
    id::{BookId, GrantId, OrderItemId, UserId},
};

// 新しい利用権を PENDING で記録する
#[derive(new, Debug, Clone)]
pub struct CreateGrant {
    pub user_id: UserId,
    pub book_id: BookId,
    pub channel: AccessChannel,
    pub format: BookFormat,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub guarantee_amount: Option<Money>,
    pub source_order_item_id: OrderItemId,
    pub requested_at: DateTime<Utc>,
}

#[derive(new, Debug, Clone, Copy)]
pub struct TransitionGrant {
    pub grant_id: GrantId,
    pub status: GrantStatus,
    pub at: DateTime<Utc>,
}
