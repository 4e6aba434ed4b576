use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use derive_new::new;
use shared::{
    config::RentalConfig,
    error::{AppError, AppResult},
};

use crate::{
    model::{
        access::AccessInfo,
        availability::Capacity,
        book::{BookFormat, Money},
        grant::{
            event::{CreateGrant, TransitionGrant},
            AccessChannel, EntitlementGrant, GrantStatus,
        },
        id::{BookId, GrantId, OrderItemId, UserId},
        subscription::{event::CreateSubscription, SubscriptionGrant},
        terms::TermsCategory,
    },
    policy::rental,
    repository::{
        catalog::CatalogRepository, ledger::GrantLedger, subscription::SubscriptionRepository,
    },
    service::{
        availability::AvailabilityTracker, subscription::SubscriptionResolver, terms::TermsGate,
    },
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: Vec<GrantId>,
    pub cancelled: Vec<GrantId>,
}

/// 利用権の状態遷移を唯一書き込むサービス。
/// 購読・台帳・貸出可能数を組み合わせてアクセス判定と貸出の作成・終了を行う
#[derive(new, Clone)]
pub struct EntitlementResolver {
    ledger: Arc<dyn GrantLedger>,
    catalog: Arc<dyn CatalogRepository>,
    subscription_repository: Arc<dyn SubscriptionRepository>,
    availability: AvailabilityTracker,
    terms: TermsGate,
    subscriptions: SubscriptionResolver,
    rental_config: RentalConfig,
}

impl EntitlementResolver {
    /// 購読 → 購入 → 貸出 の順に最初に当てはまる経路を返す。副作用はない
    pub async fn get_access(
        &self,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> AppResult<AccessInfo> {
        if let Some(subscription) = self
            .subscriptions
            .subscription_for_book(user_id, book_id, now)
            .await?
        {
            return Ok(AccessInfo::Subscription {
                subscription_id: subscription.id,
                plan_id: subscription.subscription_plan_id,
                expires_at: subscription.end_date,
            });
        }

        let grants = self.ledger.find_by_user_and_book(user_id, book_id).await?;

        if let Some(purchase) = live_grant(&grants, AccessChannel::Purchase, now) {
            return Ok(AccessInfo::Purchase {
                grant_id: purchase.id,
                format: purchase.format,
            });
        }
        if let Some(rental) = live_grant(&grants, AccessChannel::Rental, now) {
            return Ok(AccessInfo::Rental {
                grant_id: rental.id,
                format: rental.format,
                expires_at: rental.end_at,
            });
        }
        Ok(AccessInfo::NoAccess)
    }

    pub async fn recommend_rental_type(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> AppResult<rental::RentalRecommendation> {
        let book = self.availability.get_book(book_id).await?;
        let snapshot = self.availability.snapshot(&book, now).await?;
        Ok(rental::rental_recommendation(&book, &snapshot))
    }

    // 規約 → 貸出方針 → 台帳への原子的な登録 の順。結果は支払い確定まで PENDING
    #[tracing::instrument(skip(self), err)]
    pub async fn create_rental(
        &self,
        user_id: UserId,
        book_id: BookId,
        format: BookFormat,
        order_item_id: OrderItemId,
        now: DateTime<Utc>,
    ) -> AppResult<EntitlementGrant> {
        self.terms
            .ensure_accepted(user_id, TermsCategory::rental(format))
            .await?;

        let book = self.availability.get_book(book_id).await?;
        if !book.offers(format) {
            return Err(AppError::UnprocessableEntity(format!(
                "book {book_id} is not offered as {format}"
            )));
        }

        let availability = self.availability.availability_for(&book, format, now).await?;
        let snapshot = rental::AvailabilitySnapshot::from([(format, availability.clone())]);
        if !rental::eligible_rental_types(&book, &snapshot).contains(&format) {
            tracing::info!(%book_id, %format, "no rental slot left");
            return Err(AppError::conflict_unavailable());
        }

        let guarantee_amount = self.guarantee_amount(book_id, format).await?;
        let window = rental::compute_duration(format, &self.rental_config, now);

        let event = CreateGrant::new(
            user_id,
            book_id,
            AccessChannel::Rental,
            format,
            window.start_at,
            Some(window.end_at),
            guarantee_amount,
            order_item_id,
            now,
        );
        let grant = self
            .ledger
            .record_grant(event, availability.capacity)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    tracing::info!(%book_id, %format, "rental race lost");
                }
            })?;

        tracing::info!(grant_id = %grant.id, "rental created");
        Ok(grant)
    }

    async fn guarantee_amount(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Option<Money>> {
        if !rental::requires_guarantee_deposit(format) {
            return Ok(None);
        }
        let amount = self
            .catalog
            .get_guarantee_amount(book_id, format)
            .await?
            .ok_or_else(|| {
                AppError::UnprocessableEntity(format!(
                    "no guarantee deposit is configured for book {book_id} as {format}"
                ))
            })?;
        Ok(Some(amount))
    }

    // 買い切り。規約・貸出枠の制約はないが、同じ形態の二重登録は Conflict
    #[tracing::instrument(skip(self), err)]
    pub async fn create_purchase(
        &self,
        user_id: UserId,
        book_id: BookId,
        format: BookFormat,
        order_item_id: OrderItemId,
        now: DateTime<Utc>,
    ) -> AppResult<EntitlementGrant> {
        let book = self.availability.get_book(book_id).await?;
        if !book.offers(format) {
            return Err(AppError::UnprocessableEntity(format!(
                "book {book_id} is not offered as {format}"
            )));
        }

        let event = CreateGrant::new(
            user_id,
            book_id,
            AccessChannel::Purchase,
            format,
            now,
            None,
            None,
            order_item_id,
            now,
        );
        let grant = self.ledger.record_grant(event, Capacity::Unbounded).await?;
        tracing::info!(grant_id = %grant.id, "purchase recorded");
        Ok(grant)
    }

    pub async fn find_grant(&self, grant_id: GrantId) -> AppResult<EntitlementGrant> {
        self.ledger
            .find_by_id(grant_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("grant {grant_id} not found")))
    }

    pub async fn list_user_grants(&self, user_id: UserId) -> AppResult<Vec<EntitlementGrant>> {
        self.ledger.find_by_user_id(user_id).await
    }

    /// 早期返却。ACTIVE からのみ。期限切れ後の返却は自然満了と区別するためエラーにする
    #[tracing::instrument(skip(self), err)]
    pub async fn return_rental(
        &self,
        grant_id: GrantId,
        now: DateTime<Utc>,
    ) -> AppResult<EntitlementGrant> {
        let grant = self.find_grant(grant_id).await?;
        if grant.channel != AccessChannel::Rental {
            return Err(AppError::UnprocessableEntity(format!(
                "grant {grant_id} is a {} grant and cannot be returned",
                grant.channel
            )));
        }

        // 掃除前でも期限を過ぎていれば満了として確定させる
        if grant.is_due(now) {
            self.ledger
                .transition_status(TransitionGrant::new(grant_id, GrantStatus::Expired, now))
                .await?;
            return Err(AppError::InvalidTransition {
                from: GrantStatus::Expired.to_string(),
                to: GrantStatus::Returned.to_string(),
            });
        }

        let grant = self
            .ledger
            .transition_status(TransitionGrant::new(grant_id, GrantStatus::Returned, now))
            .await?;
        tracing::info!(grant_id = %grant.id, "rental returned");
        Ok(grant)
    }

    // 決済サービスからの支払い確定通知
    #[tracing::instrument(skip(self), err)]
    pub async fn activate_grant(
        &self,
        grant_id: GrantId,
        now: DateTime<Utc>,
    ) -> AppResult<EntitlementGrant> {
        self.ledger
            .transition_status(TransitionGrant::new(grant_id, GrantStatus::Active, now))
            .await
    }

    // 決済サービスからの支払い失敗通知
    #[tracing::instrument(skip(self), err)]
    pub async fn cancel_grant(
        &self,
        grant_id: GrantId,
        now: DateTime<Utc>,
    ) -> AppResult<EntitlementGrant> {
        self.ledger
            .transition_status(TransitionGrant::new(grant_id, GrantStatus::Cancelled, now))
            .await
    }

    pub async fn expire_due_grants(&self, now: DateTime<Utc>) -> AppResult<Vec<GrantId>> {
        self.ledger.expire_due_grants(now).await
    }

    pub async fn cancel_stale_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<GrantId>> {
        let cutoff = now - Duration::minutes(self.rental_config.pending_timeout_minutes);
        self.ledger.cancel_stale_pending(cutoff, now).await
    }

    /// 定期実行用。期限切れの満了と、放置された PENDING の取り消し
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let expired = self.expire_due_grants(now).await?;
        let cancelled = self.cancel_stale_pending(now).await?;
        if !expired.is_empty() || !cancelled.is_empty() {
            tracing::info!(
                expired = expired.len(),
                cancelled = cancelled.len(),
                "grant sweep finished"
            );
        }
        Ok(SweepReport { expired, cancelled })
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn subscribe(
        &self,
        event: CreateSubscription,
    ) -> AppResult<SubscriptionGrant> {
        if event.end_date <= event.start_date {
            return Err(AppError::UnprocessableEntity(
                "subscription must end after it starts".into(),
            ));
        }
        if !self
            .catalog
            .exists_subscription_plan(event.subscription_plan_id)
            .await?
        {
            return Err(AppError::EntityNotFound(format!(
                "subscription plan {} not found",
                event.subscription_plan_id
            )));
        }
        self.terms
            .ensure_accepted(event.user_id, TermsCategory::subscription())
            .await?;

        let subscription = self.subscription_repository.create(event).await?;
        tracing::info!(subscription_id = %subscription.id, "subscription created");
        Ok(subscription)
    }
}

fn live_grant(
    grants: &[EntitlementGrant],
    channel: AccessChannel,
    now: DateTime<Utc>,
) -> Option<&EntitlementGrant> {
    grants
        .iter()
        .find(|g| g.channel == channel && g.grants_access_at(now))
}
