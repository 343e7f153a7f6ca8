use std::collections::HashSet;

use anyhow::Context;
use tracing::debug;

use crate::{PgTransaction, PostgresDatabase};

/// A schema change embedded from the `migrations` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub migration: Migration,
    pub applied: bool,
}

/// All migrations, ordered by name.
// generated by `build.rs` script
pub const MIGRATIONS: &[Migration] = include!(env!("MIGRATIONS"));

/// Advisory lock held while migrating, so that two instances starting at the
/// same time do not apply the same migration twice.
const MIGRATION_LOCK: i64 = 0x706f_7274_666f_6c69;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl PostgresDatabase {
    pub async fn list_migrations(&self) -> anyhow::Result<Vec<MigrationStatus>> {
        let mut conn = self.connection().await?;
        let txn = conn
            .transaction()
            .await
            .context("Failed to begin transaction")?;
        let status = migration_status(&txn).await?;
        txn.commit().await.context("Failed to commit transaction")?;
        Ok(status)
    }

    /// Apply the next `cnt` pending migrations, or all of them.
    pub async fn run_migrations(&self, cnt: Option<usize>) -> anyhow::Result<Vec<&'static str>> {
        self.migrate(Direction::Up, cnt).await
    }

    /// Revert the last `cnt` applied migrations, or all of them.
    pub async fn revert_migrations(&self, cnt: Option<usize>) -> anyhow::Result<Vec<&'static str>> {
        self.migrate(Direction::Down, cnt).await
    }

    async fn migrate(
        &self,
        direction: Direction,
        cnt: Option<usize>,
    ) -> anyhow::Result<Vec<&'static str>> {
        let mut conn = self.connection().await?;
        let txn = conn
            .transaction()
            .await
            .context("Failed to begin transaction")?;
        txn.execute("select pg_advisory_xact_lock($1)", &[&MIGRATION_LOCK])
            .await
            .context("Failed to acquire migration lock")?;

        let status = migration_status(&txn).await?;
        let selected = select(&status, direction, cnt.unwrap_or(usize::MAX));

        for migration in &selected {
            let (script, bookkeeping) = match direction {
                Direction::Up => (migration.up, "insert into _migrations (name) values ($1)"),
                Direction::Down => (migration.down, "delete from _migrations where name = $1"),
            };
            txn.batch_execute(script)
                .await
                .with_context(|| format!("Migration {} failed ({direction:?})", migration.name))?;
            txn.execute(bookkeeping, &[&migration.name])
                .await
                .with_context(|| format!("Failed to record migration {}", migration.name))?;
            debug!(name = migration.name, ?direction, "migrated");
        }

        txn.commit()
            .await
            .context("Failed to commit migrations")?;
        Ok(selected.into_iter().map(|m| m.name).collect())
    }
}

/// The migrations to run in `direction`, in the order they have to run.
fn select(status: &[MigrationStatus], direction: Direction, cnt: usize) -> Vec<Migration> {
    let wanted = direction == Direction::Down;
    let candidates = status
        .iter()
        .filter(|s| s.applied == wanted)
        .map(|s| s.migration);
    match direction {
        Direction::Up => candidates.take(cnt).collect(),
        Direction::Down => candidates.rev().take(cnt).collect(),
    }
}

async fn migration_status(txn: &PgTransaction<'_>) -> anyhow::Result<Vec<MigrationStatus>> {
    txn.batch_execute(
        "create table if not exists _migrations (name text primary key, applied_at timestamp \
         with time zone not null default now())",
    )
    .await
    .context("Failed to create migrations table")?;

    let applied = txn
        .query("select name from _migrations", &[])
        .await
        .context("Failed to list applied migrations")?
        .into_iter()
        .map(|row| row.get(0))
        .collect::<HashSet<String>>();

    Ok(MIGRATIONS
        .iter()
        .map(|&migration| MigrationStatus {
            migration,
            applied: applied.contains(migration.name),
        })
        .collect())
}
