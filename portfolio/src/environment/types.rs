use portfolio_core_contact_impl::ContactFeatureServiceImpl;
use portfolio_core_health_impl::HealthFeatureServiceImpl;
use portfolio_persistence_postgres::{contact::PostgresContactRepository, PostgresDatabase};
use portfolio_shared_impl::{
    id::IdServiceImpl, rate_limit::RateLimitServiceImpl, time::TimeServiceImpl,
};

// API
pub type RestServer = portfolio_api_rest::RestServer<HealthFeature, ContactFeature>;

// Persistence
pub type Database = PostgresDatabase;
pub type ContactRepo = PostgresContactRepository;

// Shared
pub type Id = IdServiceImpl;
pub type Time = TimeServiceImpl;
pub type RateLimit = RateLimitServiceImpl<Time>;

// Core
pub type HealthFeature = HealthFeatureServiceImpl<Time, Database>;
pub type ContactFeature = ContactFeatureServiceImpl<Database, Id, Time, RateLimit, ContactRepo>;
