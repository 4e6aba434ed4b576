use std::sync::Arc;

use adapter::{
    database::ConnectionPool,
    redis::RedisClient,
    repository::{
        auth::AuthRepositoryImpl,
        catalog::CatalogRepositoryImpl,
        health::HealthCheckRepositoryImpl,
        ledger::GrantLedgerImpl,
        memory::{InMemoryHealthCheck, InMemoryStore},
        subscription::SubscriptionRepositoryImpl,
        terms::TermsRepositoryImpl,
    },
};
use kernel::{
    repository::{
        auth::AuthRepository, catalog::CatalogRepository, health::HealthCheckRepository,
        ledger::GrantLedger, subscription::SubscriptionRepository, terms::TermsRepository,
    },
    service::{
        availability::AvailabilityTracker, entitlement::EntitlementResolver,
        subscription::SubscriptionResolver, terms::TermsGate,
    },
};
use shared::config::RentalConfig;

pub struct Repositories {
    pub health_check: Arc<dyn HealthCheckRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub ledger: Arc<dyn GrantLedger>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub terms: Arc<dyn TermsRepository>,
}

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    auth_repository: Arc<dyn AuthRepository>,
    availability_tracker: AvailabilityTracker,
    terms_gate: TermsGate,
    entitlement_resolver: EntitlementResolver,
}

impl AppRegistry {
    pub fn new(
        pool: ConnectionPool,
        redis_client: Arc<RedisClient>,
        rental_config: RentalConfig,
    ) -> Self {
        let repositories = Repositories {
            health_check: Arc::new(HealthCheckRepositoryImpl::new(pool.clone())),
            auth: Arc::new(AuthRepositoryImpl::new(redis_client)),
            ledger: Arc::new(GrantLedgerImpl::new(pool.clone())),
            catalog: Arc::new(CatalogRepositoryImpl::new(pool.clone())),
            subscriptions: Arc::new(SubscriptionRepositoryImpl::new(pool.clone())),
            terms: Arc::new(TermsRepositoryImpl::new(pool)),
        };
        Self::from_repositories(repositories, rental_config)
    }

    // DB を使わずプロセス内で完結させる
    pub fn in_memory(store: &InMemoryStore, rental_config: RentalConfig) -> Self {
        let repositories = Repositories {
            health_check: Arc::new(InMemoryHealthCheck),
            auth: store.auth.clone(),
            ledger: store.ledger.clone(),
            catalog: store.catalog.clone(),
            subscriptions: store.subscriptions.clone(),
            terms: store.terms.clone(),
        };
        Self::from_repositories(repositories, rental_config)
    }

    pub fn from_repositories(repositories: Repositories, rental_config: RentalConfig) -> Self {
        let Repositories {
            health_check,
            auth,
            ledger,
            catalog,
            subscriptions,
            terms,
        } = repositories;

        let availability_tracker = AvailabilityTracker::new(catalog.clone(), ledger.clone());
        let terms_gate = TermsGate::new(terms);
        let subscription_resolver = SubscriptionResolver::new(subscriptions.clone(), catalog.clone());
        let entitlement_resolver = EntitlementResolver::new(
            ledger,
            catalog,
            subscriptions,
            availability_tracker.clone(),
            terms_gate.clone(),
            subscription_resolver,
            rental_config,
        );

        Self {
            health_check_repository: health_check,
            auth_repository: auth,
            availability_tracker,
            terms_gate,
            entitlement_resolver,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn auth_repository(&self) -> Arc<dyn AuthRepository> {
        self.auth_repository.clone()
    }

    pub fn availability_tracker(&self) -> &AvailabilityTracker {
        &self.availability_tracker
    }

    pub fn terms_gate(&self) -> &TermsGate {
        &self.terms_gate
    }

    pub fn entitlement_resolver(&self) -> &EntitlementResolver {
        &self.entitlement_resolver
    }
}
