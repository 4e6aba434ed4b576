//! プロセス内で完結するストレージ。テストとローカル実行用。
//! 1 つのロックの中で検査と書き込みを行うので、単一プロセスでは
//! PostgreSQL 実装のトランザクションと同じ原子性を持つ。

use std::sync::Arc;

mod auth;
mod catalog;
mod ledger;
mod subscription;
mod terms;

pub use auth::InMemoryAuthRepository;
pub use catalog::{FormatListing, InMemoryCatalog};
pub use ledger::InMemoryGrantLedger;
pub use subscription::InMemorySubscriptionRepository;
pub use terms::InMemoryTermsRepository;

use async_trait::async_trait;
use kernel::repository::health::HealthCheckRepository;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub ledger: Arc<InMemoryGrantLedger>,
    pub catalog: Arc<InMemoryCatalog>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub terms: Arc<InMemoryTermsRepository>,
    pub auth: Arc<InMemoryAuthRepository>,
}

pub struct InMemoryHealthCheck;

#[async_trait]
impl HealthCheckRepository for InMemoryHealthCheck {
    async fn check_db(&self) -> bool {
        true
    }
}
