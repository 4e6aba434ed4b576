use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kernel::{
    model::{
        availability::Capacity,
        book::BookFormat,
        grant::{
            event::{CreateGrant, TransitionGrant},
            AccessChannel, EntitlementGrant, GrantStatus,
        },
        id::{BookId, GrantId, UserId},
    },
    repository::ledger::GrantLedger,
};
use shared::error::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::repository::duplicate_live_grant;

#[derive(Default)]
pub struct InMemoryGrantLedger {
    grants: RwLock<HashMap<GrantId, EntitlementGrant>>,
}

fn live_grants(
    grants: &HashMap<GrantId, EntitlementGrant>,
    book_id: BookId,
    format: BookFormat,
) -> impl Iterator<Item = &EntitlementGrant> {
    grants
        .values()
        .filter(move |g| g.book_id == book_id && g.format == format && g.status.is_live())
}

fn newest_first(mut grants: Vec<EntitlementGrant>) -> Vec<EntitlementGrant> {
    grants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    grants
}

#[async_trait]
impl GrantLedger for InMemoryGrantLedger {
    async fn record_grant(
        &self,
        event: CreateGrant,
        capacity: Capacity,
    ) -> AppResult<EntitlementGrant> {
        let mut grants = self.grants.write().await;

        for grant in grants.values_mut().filter(|g| {
            g.book_id == event.book_id && g.format == event.format && g.is_due(event.requested_at)
        }) {
            grant.status = GrantStatus::Expired;
        }

        if live_grants(&grants, event.book_id, event.format).any(|g| g.user_id == event.user_id) {
            return Err(duplicate_live_grant(event.format));
        }
        if event.channel == AccessChannel::Rental {
            let held = live_grants(&grants, event.book_id, event.format)
                .filter(|g| g.channel == AccessChannel::Rental)
                .count();
            if !capacity.admits(u32::try_from(held).unwrap_or(u32::MAX)) {
                return Err(AppError::conflict_unavailable());
            }
        }

        let grant = EntitlementGrant {
            id: GrantId::new(),
            user_id: event.user_id,
            book_id: event.book_id,
            channel: event.channel,
            format: event.format,
            status: GrantStatus::Pending,
            start_at: event.start_at,
            end_at: event.end_at,
            guarantee_amount: event.guarantee_amount,
            source_order_item_id: event.source_order_item_id,
            created_at: event.requested_at,
        };
        grants.insert(grant.id, grant.clone());
        Ok(grant)
    }

    async fn find_by_id(&self, grant_id: GrantId) -> AppResult<Option<EntitlementGrant>> {
        Ok(self.grants.read().await.get(&grant_id).cloned())
    }

    async fn find_by_user_and_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> AppResult<Vec<EntitlementGrant>> {
        let grants = self.grants.read().await;
        Ok(newest_first(
            grants
                .values()
                .filter(|g| g.user_id == user_id && g.book_id == book_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<EntitlementGrant>> {
        let grants = self.grants.read().await;
        Ok(newest_first(
            grants
                .values()
                .filter(|g| g.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_active_grants(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Vec<EntitlementGrant>> {
        let grants = self.grants.read().await;
        Ok(grants
            .values()
            .filter(|g| {
                g.book_id == book_id && g.format == format && g.status == GrantStatus::Active
            })
            .cloned()
            .collect())
    }

    async fn count_pending_rentals(&self, book_id: BookId, format: BookFormat) -> AppResult<u32> {
        let grants = self.grants.read().await;
        let count = grants
            .values()
            .filter(|g| {
                g.book_id == book_id
                    && g.format == format
                    && g.channel == AccessChannel::Rental
                    && g.status == GrantStatus::Pending
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn transition_status(&self, event: TransitionGrant) -> AppResult<EntitlementGrant> {
        let mut grants = self.grants.write().await;
        let grant = grants.get_mut(&event.grant_id).ok_or_else(|| {
            AppError::EntityNotFound(format!("grant {} not found", event.grant_id))
        })?;
        *grant = grant.transitioned(event.status, event.at)?;
        Ok(grant.clone())
    }

    async fn expire_due_grants(&self, now: DateTime<Utc>) -> AppResult<Vec<GrantId>> {
        let mut grants = self.grants.write().await;
        Ok(grants
            .values_mut()
            .filter(|g| g.is_due(now))
            .map(|g| {
                g.status = GrantStatus::Expired;
                g.id
            })
            .collect())
    }

    async fn cancel_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        _at: DateTime<Utc>,
    ) -> AppResult<Vec<GrantId>> {
        let mut grants = self.grants.write().await;
        Ok(grants
            .values_mut()
            .filter(|g| g.status == GrantStatus::Pending && g.created_at < cutoff)
            .map(|g| {
                g.status = GrantStatus::Cancelled;
                g.id
            })
            .collect())
    }
}
