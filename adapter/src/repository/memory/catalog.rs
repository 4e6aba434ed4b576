use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use kernel::{
    model::{
        book::{BookFormat, Money},
        id::{BookId, SubscriptionPlanId},
    },
    repository::catalog::CatalogRepository,
};
use shared::error::{AppError, AppResult};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatListing {
    pub rental_capacity: u32,
    pub guarantee_amount: Option<Money>,
}

impl FormatListing {
    pub fn digital() -> Self {
        Self {
            rental_capacity: 0,
            guarantee_amount: None,
        }
    }

    pub fn physical(rental_capacity: u32, guarantee_amount: Money) -> Self {
        Self {
            rental_capacity,
            guarantee_amount: Some(guarantee_amount),
        }
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    books: RwLock<HashMap<BookId, BTreeMap<BookFormat, FormatListing>>>,
    plans: RwLock<HashMap<SubscriptionPlanId, HashSet<BookId>>>,
}

impl InMemoryCatalog {
    pub async fn put_book(
        &self,
        book_id: BookId,
        listings: impl IntoIterator<Item = (BookFormat, FormatListing)>,
    ) {
        self.books
            .write()
            .await
            .insert(book_id, listings.into_iter().collect());
    }

    pub async fn put_plan(
        &self,
        plan_id: SubscriptionPlanId,
        books: impl IntoIterator<Item = BookId>,
    ) {
        self.plans
            .write()
            .await
            .insert(plan_id, books.into_iter().collect());
    }

    async fn listing(&self, book_id: BookId, format: BookFormat) -> Option<FormatListing> {
        self.books
            .read()
            .await
            .get(&book_id)
            .and_then(|formats| formats.get(&format).copied())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get_book_formats(&self, book_id: BookId) -> AppResult<BTreeSet<BookFormat>> {
        self.books
            .read()
            .await
            .get(&book_id)
            .map(|formats| formats.keys().copied().collect())
            .ok_or_else(|| AppError::EntityNotFound(format!("book {book_id} not found")))
    }

    async fn get_rental_capacity(&self, book_id: BookId, format: BookFormat) -> AppResult<u32> {
        Ok(self
            .listing(book_id, format)
            .await
            .map_or(0, |l| l.rental_capacity))
    }

    async fn get_guarantee_amount(
        &self,
        book_id: BookId,
        format: BookFormat,
    ) -> AppResult<Option<Money>> {
        Ok(self
            .listing(book_id, format)
            .await
            .and_then(|l| l.guarantee_amount))
    }

    async fn exists_subscription_plan(&self, plan_id: SubscriptionPlanId) -> AppResult<bool> {
        Ok(self.plans.read().await.contains_key(&plan_id))
    }

    async fn get_subscription_plan_books(
        &self,
        plan_id: SubscriptionPlanId,
    ) -> AppResult<HashSet<BookId>> {
        Ok(self
            .plans
            .read()
            .await
            .get(&plan_id)
            .cloned()
            .unwrap_or_default())
    }
}
