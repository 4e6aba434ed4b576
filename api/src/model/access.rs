use chrono::{DateTime, Utc};
use kernel::{
    model::{
        access::AccessInfo,
        availability::{Capacity, RentalAvailability},
        book::BookFormat,
        grant::AccessChannel,
        id::{BookId, GrantId, SubscriptionId, SubscriptionPlanId},
    },
    policy::rental::RentalRecommendation,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub has_access: bool,
    pub channel: Option<AccessChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_id: Option<GrantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<BookFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<SubscriptionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<SubscriptionPlanId>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<AccessInfo> for AccessResponse {
    fn from(value: AccessInfo) -> Self {
        let mut res = Self {
            has_access: value.has_access(),
            channel: value.channel(),
            grant_id: None,
            format: None,
            subscription_id: None,
            plan_id: None,
            expires_at: value.expires_at(),
        };
        match value {
            AccessInfo::Subscription {
                subscription_id,
                plan_id,
                ..
            } => {
                res.subscription_id = Some(subscription_id);
                res.plan_id = Some(plan_id);
            }
            AccessInfo::Purchase { grant_id, format }
            | AccessInfo::Rental {
                grant_id, format, ..
            } => {
                res.grant_id = Some(grant_id);
                res.format = Some(format);
            }
            AccessInfo::NoAccess => {}
        }
        res
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub book_id: BookId,
    pub format: BookFormat,
    // 上限なし（電子書籍）は null
    pub capacity: Option<u32>,
    pub active_count: u32,
    pub pending_count: u32,
    pub available: Option<u32>,
}

impl From<RentalAvailability> for AvailabilityResponse {
    fn from(value: RentalAvailability) -> Self {
        let available = value.available();
        let capacity = match value.capacity {
            Capacity::Unbounded => None,
            Capacity::Limited(max) => Some(max),
        };
        let RentalAvailability {
            book_id,
            format,
            active_count,
            pending_count,
            ..
        } = value;
        Self {
            book_id,
            format,
            capacity,
            active_count,
            pending_count,
            available,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub book_id: BookId,
    pub eligible_rental_types: Vec<BookFormat>,
    pub recommended_rental_type: Option<BookFormat>,
}

impl RecommendationResponse {
    pub fn new(book_id: BookId, recommendation: RentalRecommendation) -> Self {
        let RentalRecommendation {
            eligible,
            recommended,
        } = recommendation;
        Self {
            book_id,
            eligible_rental_types: eligible.into_iter().collect(),
            recommended_rental_type: recommended,
        }
    }
}
