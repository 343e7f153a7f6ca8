use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use portfolio_core_health_contracts::{HealthFeatureService, HealthStatus};
use portfolio_di::Build;
use portfolio_persistence_contracts::Database;
use portfolio_shared_contracts::time::TimeService;
use tokio::sync::RwLock;
use tracing::error;

#[derive(Debug, Clone, Build)]
pub struct HealthFeatureServiceImpl<Time, Db> {
    time: Time,
    db: Db,
    config: HealthFeatureConfig,
    #[state]
    state: Arc<State>,
}

#[derive(Debug, Clone)]
pub struct HealthFeatureConfig {
    /// How long a database ping result is reused.
    pub cache_ttl: Duration,
}

#[derive(Debug, Default)]
struct State {
    database: RwLock<Option<CachedPing>>,
}

#[derive(Debug, Clone, Copy)]
struct CachedPing {
    ok: bool,
    timestamp: DateTime<Utc>,
}

impl<Time, Db> HealthFeatureServiceImpl<Time, Db>
where
    Db: Database,
{
    async fn ping_database(&self, now: DateTime<Utc>) -> bool {
        let is_fresh = |c: &&CachedPing| now < c.timestamp + self.config.cache_ttl;

        if let Some(cached) = self.state.database.read().await.as_ref().filter(is_fresh) {
            return cached.ok;
        }

        let mut cache_guard = self.state.database.write().await;
        if let Some(cached) = cache_guard.as_ref().filter(is_fresh) {
            return cached.ok;
        }

        let ok = self
            .db
            .ping()
            .await
            .inspect_err(|err| error!("Failed to ping database: {err:#}"))
            .is_ok();

        cache_guard.insert(CachedPing { ok, timestamp: now }).ok
    }
}

impl<Time, Db> HealthFeatureService for HealthFeatureServiceImpl<Time, Db>
where
    Time: TimeService,
    Db: Database,
{
    async fn get_status(&self) -> HealthStatus {
        let now = self.time.now();

        HealthStatus {
            timestamp: now,
            database: self.ping_database(now).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use portfolio_persistence_contracts::MockDatabase;
    use portfolio_shared_contracts::time::MockTimeService;
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_sut(time: MockTimeService, db: MockDatabase) -> HealthFeatureServiceImpl<MockTimeService, MockDatabase> {
        HealthFeatureServiceImpl {
            time,
            db,
            config: HealthFeatureConfig {
                cache_ttl: Duration::from_secs(10),
            },
            state: Default::default(),
        }
    }

    fn time(seconds: &[i64]) -> MockTimeService {
        let start: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let mut seq = mockall::Sequence::new();
        let mut time = MockTimeService::new();
        for &s in seconds {
            time.expect_now()
                .once()
                .in_sequence(&mut seq)
                .return_const(start + chrono::Duration::seconds(s));
        }
        time
    }

    #[tokio::test]
    async fn ok() {
        // Arrange
        let sut = make_sut(time(&[0]), MockDatabase::new().with_ping(true));

        // Act
        let result = sut.get_status().await;

        // Assert
        assert_eq!(
            result,
            HealthStatus {
                timestamp: "2024-05-01T12:00:00Z".parse().unwrap(),
                database: true,
            }
        );
    }

    #[tokio::test]
    async fn database_down() {
        // Arrange
        let sut = make_sut(time(&[0]), MockDatabase::new().with_ping(false));

        // Act
        let result = sut.get_status().await;

        // Assert
        assert!(!result.database);
    }

    #[tokio::test]
    async fn ping_is_cached() {
        // Arrange
        let sut = make_sut(time(&[0, 5, 9]), MockDatabase::new().with_ping(true));

        // Act
        let results = [
            sut.get_status().await,
            sut.get_status().await,
            sut.get_status().await,
        ];

        // Assert
        assert!(results.iter().all(|s| s.database));
        assert_eq!(
            results[2].timestamp,
            "2024-05-01T12:00:09Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn cache_expires() {
        // Arrange
        let mut db = MockDatabase::new();
        let mut seq = mockall::Sequence::new();
        for ok in [true, false] {
            db.expect_ping()
                .once()
                .in_sequence(&mut seq)
                .return_once(move || {
                    Box::pin(std::future::ready(if ok {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("database unreachable"))
                    }))
                });
        }
        let sut = make_sut(time(&[0, 10]), db);

        // Act
        let first = sut.get_status().await;
        let second = sut.get_status().await;

        // Assert
        assert!(first.database);
        assert!(!second.database);
    }
}
