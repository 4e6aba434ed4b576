use chrono::{DateTime, Utc};

use super::{
    book::BookFormat,
    grant::AccessChannel,
    id::{GrantId, SubscriptionId, SubscriptionPlanId},
};

/// 「利用者 U は書籍 B にどの経路でアクセスできるか」の答え
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessInfo {
    Subscription {
        subscription_id: SubscriptionId,
        plan_id: SubscriptionPlanId,
        expires_at: DateTime<Utc>,
    },
    Purchase {
        grant_id: GrantId,
        format: BookFormat,
    },
    Rental {
        grant_id: GrantId,
        format: BookFormat,
        expires_at: Option<DateTime<Utc>>,
    },
    NoAccess,
}

impl AccessInfo {
    pub fn channel(&self) -> Option<AccessChannel> {
        match self {
            AccessInfo::Subscription { .. } => Some(AccessChannel::Subscription),
            AccessInfo::Purchase { .. } => Some(AccessChannel::Purchase),
            AccessInfo::Rental { .. } => Some(AccessChannel::Rental),
            AccessInfo::NoAccess => None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            AccessInfo::Subscription { expires_at, .. } => Some(*expires_at),
            AccessInfo::Rental { expires_at, .. } => *expires_at,
            AccessInfo::Purchase { .. } | AccessInfo::NoAccess => None,
        }
    }

    pub fn has_access(&self) -> bool {
        !matches!(self, AccessInfo::NoAccess)
    }
}
