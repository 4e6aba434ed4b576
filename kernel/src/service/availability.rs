use std::sync::Arc;

use chrono::{DateTime, Utc};
use derive_new::new;
use shared::error::AppResult;

use crate::{
    model::{
        availability::{Capacity, RentalAvailability},
        book::{Book, BookFormat},
        grant::AccessChannel,
        id::BookId,
    },
    policy::rental::AvailabilitySnapshot,
    repository::{catalog::CatalogRepository, ledger::GrantLedger},
};

/// 貸出可能数の算出。状態は持たず、毎回カタログと台帳から計算し直す。
/// 結果は参考値であり、ロックではない。直後の登録が Conflict になることはありうる
#[derive(new, Clone)]
pub struct AvailabilityTracker {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn GrantLedger>,
}

impl AvailabilityTracker {
    pub async fn get_book(&self, book_id: BookId) -> AppResult<Book> {
        let formats = self.catalog.get_book_formats(book_id).await?;
        Ok(Book {
            id: book_id,
            formats,
        })
    }

    pub async fn capacity(&self, book: &Book, format: BookFormat) -> AppResult<Capacity> {
        if !book.offers(format) {
            return Ok(Capacity::Limited(0));
        }
        if !format.is_capacity_bounded() {
            return Ok(Capacity::Unbounded);
        }
        let max = self.catalog.get_rental_capacity(book.id, format).await?;
        Ok(Capacity::Limited(max))
    }

    pub async fn get_availability(
        &self,
        book_id: BookId,
        format: BookFormat,
        now: DateTime<Utc>,
    ) -> AppResult<RentalAvailability> {
        let book = self.get_book(book_id).await?;
        self.availability_for(&book, format, now).await
    }

    pub async fn availability_for(
        &self,
        book: &Book,
        format: BookFormat,
        now: DateTime<Utc>,
    ) -> AppResult<RentalAvailability> {
        let capacity = self.capacity(book, format).await?;
        // 期限を過ぎてまだ掃除されていない ACTIVE は数えない
        let active = self
            .ledger
            .list_active_grants(book.id, format)
            .await?
            .into_iter()
            .filter(|g| g.channel == AccessChannel::Rental && g.grants_access_at(now))
            .count();
        let pending_count = self.ledger.count_pending_rentals(book.id, format).await?;

        Ok(RentalAvailability {
            book_id: book.id,
            format,
            capacity,
            active_count: u32::try_from(active).unwrap_or(u32::MAX),
            pending_count,
        })
    }

    // カタログにある全形態の貸出可能数
    pub async fn snapshot(&self, book: &Book, now: DateTime<Utc>) -> AppResult<AvailabilitySnapshot> {
        let mut snapshot = AvailabilitySnapshot::new();
        for format in book.formats.iter().copied() {
            let availability = self.availability_for(book, format, now).await?;
            snapshot.insert(format, availability);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            book::BookFormat,
            grant::{EntitlementGrant, GrantStatus},
            id::{GrantId, OrderItemId, UserId},
        },
        repository::{catalog::MockCatalogRepository, ledger::MockGrantLedger},
    };
    use chrono::Duration;
    use shared::error::AppError;
    use std::collections::BTreeSet;

    fn active_rental(book_id: BookId, format: BookFormat, end_at: DateTime<Utc>) -> EntitlementGrant {
        EntitlementGrant {
            id: GrantId::new(),
            user_id: UserId::new(),
            book_id,
            channel: AccessChannel::Rental,
            format,
            status: GrantStatus::Active,
            start_at: end_at - Duration::days(30),
            end_at: Some(end_at),
            guarantee_amount: None,
            source_order_item_id: OrderItemId::new(),
            created_at: end_at - Duration::days(30),
        }
    }

    #[tokio::test]
    async fn counts_live_rentals_against_capacity() {
        let now = Utc::now();
        let book_id = BookId::new();

        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_get_book_formats()
            .returning(|_| Ok(BTreeSet::from([BookFormat::Hardcopy])));
        catalog.expect_get_rental_capacity().returning(|_, _| Ok(3));

        let mut ledger = MockGrantLedger::new();
        ledger.expect_list_active_grants().returning(move |book_id, format| {
            Ok(vec![
                active_rental(book_id, format, now + Duration::days(2)),
                // 期限切れ・未掃除
                active_rental(book_id, format, now - Duration::seconds(1)),
            ])
        });
        ledger.expect_count_pending_rentals().returning(|_, _| Ok(1));

        let tracker = AvailabilityTracker::new(Arc::new(catalog), Arc::new(ledger));
        let availability = tracker
            .get_availability(book_id, BookFormat::Hardcopy, now)
            .await
            .unwrap();

        assert_eq!(availability.capacity, Capacity::Limited(3));
        assert_eq!(availability.active_count, 1);
        assert_eq!(availability.pending_count, 1);
        assert_eq!(availability.available(), Some(1));
    }

    #[tokio::test]
    async fn ebook_capacity_is_unbounded_whatever_the_catalog_says() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_get_book_formats()
            .returning(|_| Ok(BTreeSet::from([BookFormat::Ebook])));
        catalog.expect_get_rental_capacity().never();

        let mut ledger = MockGrantLedger::new();
        ledger.expect_list_active_grants().returning(|_, _| Ok(vec![]));
        ledger.expect_count_pending_rentals().returning(|_, _| Ok(0));

        let tracker = AvailabilityTracker::new(Arc::new(catalog), Arc::new(ledger));
        let availability = tracker
            .get_availability(BookId::new(), BookFormat::Ebook, Utc::now())
            .await
            .unwrap();

        assert_eq!(availability.capacity, Capacity::Unbounded);
        assert_eq!(availability.available(), None);
        assert!(availability.has_free_slot());
    }

    #[tokio::test]
    async fn format_not_in_catalog_has_no_slots() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_get_book_formats()
            .returning(|_| Ok(BTreeSet::from([BookFormat::Ebook])));

        let mut ledger = MockGrantLedger::new();
        ledger.expect_list_active_grants().returning(|_, _| Ok(vec![]));
        ledger.expect_count_pending_rentals().returning(|_, _| Ok(0));

        let tracker = AvailabilityTracker::new(Arc::new(catalog), Arc::new(ledger));
        let availability = tracker
            .get_availability(BookId::new(), BookFormat::Audiobook, Utc::now())
            .await
            .unwrap();

        assert_eq!(availability.available(), Some(0));
    }

    #[tokio::test]
    async fn unknown_book_is_not_found() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_get_book_formats()
            .returning(|id| Err(AppError::EntityNotFound(format!("book {id} not found"))));

        let tracker =
            AvailabilityTracker::new(Arc::new(catalog), Arc::new(MockGrantLedger::new()));
        let res = tracker
            .get_availability(BookId::new(), BookFormat::Hardcopy, Utc::now())
            .await;

        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }
}
