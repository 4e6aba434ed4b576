use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use strum::{AsRefStr, Display, EnumString};

use super::{
    book::{BookFormat, Money},
    id::{BookId, GrantId, OrderItemId, UserId},
};

pub mod event;

/// アクセス経路。取りうる値はこの 3 つに閉じている
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase")]
pub enum AccessChannel {
    Purchase,
    Rental,
    Subscription,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase")]
pub enum GrantStatus {
    Pending,
    Active,
    Expired,
    Cancelled,
    Returned,
}

impl GrantStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GrantStatus::Expired | GrantStatus::Cancelled | GrantStatus::Returned
        )
    }

    // PENDING も ACTIVE と同じく貸出枠と「1 利用者 1 形態 1 件」の制約を占有する
    pub fn is_live(self) -> bool {
        matches!(self, GrantStatus::Pending | GrantStatus::Active)
    }

    // PENDING → ACTIVE → {EXPIRED | RETURNED}, PENDING → CANCELLED
    pub fn can_transition_to(self, next: GrantStatus) -> bool {
        matches!(
            (self, next),
            (GrantStatus::Pending, GrantStatus::Active)
                | (GrantStatus::Pending, GrantStatus::Cancelled)
                | (GrantStatus::Active, GrantStatus::Expired)
                | (GrantStatus::Active, GrantStatus::Returned)
        )
    }

    /// 遷移元として許される状態。条件付き UPDATE の WHERE 句に使う
    pub fn allowed_sources(self) -> &'static [GrantStatus] {
        match self {
            GrantStatus::Active | GrantStatus::Cancelled => &[GrantStatus::Pending],
            GrantStatus::Expired | GrantStatus::Returned => &[GrantStatus::Active],
            GrantStatus::Pending => &[],
        }
    }

    pub fn ensure_transition(self, next: GrantStatus) -> AppResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementGrant {
    pub id: GrantId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub channel: AccessChannel,
    pub format: BookFormat,
    pub status: GrantStatus,
    pub start_at: DateTime<Utc>,
    // 買い切りは None
    pub end_at: Option<DateTime<Utc>>,
    pub guarantee_amount: Option<Money>,
    pub source_order_item_id: OrderItemId,
    pub created_at: DateTime<Utc>,
}

impl EntitlementGrant {
    pub fn grants_access_at(&self, now: DateTime<Utc>) -> bool {
        self.status == GrantStatus::Active && self.end_at.map_or(true, |end| end > now)
    }

    // ACTIVE のまま期限を過ぎている
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == GrantStatus::Active && self.end_at.is_some_and(|end| end <= now)
    }

    /// 支払い確定時の期間。貸出期間の長さは保ったまま開始を確定時刻にずらす
    pub fn window_from(&self, activated_at: DateTime<Utc>) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        let end_at = self
            .end_at
            .map(|end| activated_at + (end - self.start_at));
        (activated_at, end_at)
    }

    // 状態遷移を適用した結果を返す。遷移できなければ InvalidTransition
    pub fn transitioned(&self, next: GrantStatus, at: DateTime<Utc>) -> AppResult<Self> {
        self.status.ensure_transition(next)?;
        let mut grant = self.clone();
        if next == GrantStatus::Active {
            let (start_at, end_at) = self.window_from(at);
            grant.start_at = start_at;
            grant.end_at = end_at;
        }
        grant.status = next;
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(GrantStatus::Pending, GrantStatus::Active, true)]
    #[case(GrantStatus::Pending, GrantStatus::Cancelled, true)]
    #[case(GrantStatus::Active, GrantStatus::Expired, true)]
    #[case(GrantStatus::Active, GrantStatus::Returned, true)]
    #[case(GrantStatus::Pending, GrantStatus::Returned, false)]
    #[case(GrantStatus::Pending, GrantStatus::Expired, false)]
    #[case(GrantStatus::Active, GrantStatus::Cancelled, false)]
    #[case(GrantStatus::Active, GrantStatus::Pending, false)]
    #[case(GrantStatus::Expired, GrantStatus::Returned, false)]
    #[case(GrantStatus::Returned, GrantStatus::Active, false)]
    #[case(GrantStatus::Cancelled, GrantStatus::Active, false)]
    fn lifecycle_edges(#[case] from: GrantStatus, #[case] to: GrantStatus, #[case] ok: bool) {
        assert_eq!(from.can_transition_to(to), ok);
        assert_eq!(from.ensure_transition(to).is_ok(), ok);
        assert_eq!(to.allowed_sources().contains(&from), ok);
    }

    #[test]
    fn terminal_states_never_move() {
        for from in [GrantStatus::Expired, GrantStatus::Cancelled, GrantStatus::Returned] {
            assert!(from.is_terminal());
            for to in [
                GrantStatus::Pending,
                GrantStatus::Active,
                GrantStatus::Expired,
                GrantStatus::Cancelled,
                GrantStatus::Returned,
            ] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    fn rental(start: DateTime<Utc>, days: i64) -> EntitlementGrant {
        EntitlementGrant {
            id: GrantId::new(),
            user_id: UserId::new(),
            book_id: BookId::new(),
            channel: AccessChannel::Rental,
            format: BookFormat::Ebook,
            status: GrantStatus::Pending,
            start_at: start,
            end_at: Some(start + Duration::days(days)),
            guarantee_amount: None,
            source_order_item_id: OrderItemId::new(),
            created_at: start,
        }
    }

    #[test]
    fn activation_keeps_window_length() {
        let start = Utc::now();
        let grant = rental(start, 14);
        let activated_at = start + Duration::minutes(5);

        let active = grant.transitioned(GrantStatus::Active, activated_at).unwrap();

        assert_eq!(active.status, GrantStatus::Active);
        assert_eq!(active.start_at, activated_at);
        assert_eq!(active.end_at, Some(activated_at + Duration::days(14)));
    }

    #[test]
    fn elapsed_active_grant_is_due_and_grants_nothing() {
        let now = Utc::now();
        let mut grant = rental(now - Duration::days(3), 1);
        grant.status = GrantStatus::Active;

        assert!(grant.is_due(now));
        assert!(!grant.grants_access_at(now));
    }

    #[test]
    fn perpetual_purchase_never_falls_due() {
        let now = Utc::now();
        let mut grant = rental(now, 1);
        grant.channel = AccessChannel::Purchase;
        grant.status = GrantStatus::Active;
        grant.end_at = None;

        assert!(!grant.is_due(now + Duration::days(10_000)));
        assert!(grant.grants_access_at(now + Duration::days(10_000)));
    }
}
