use std::{fmt::Write, time::Duration};

use anyhow::{ensure, Context};
use bb8::{Pool, PooledConnection};
use bb8_postgres::{
    tokio_postgres::{self, NoTls},
    PostgresConnectionManager,
};
use portfolio_persistence_contracts::Database;
use portfolio_utils::trace_instrument;
use tracing::trace;

pub use migrations::{Migration, MigrationStatus, MIGRATIONS};
pub use transaction::PostgresTransaction;

pub mod contact;
mod migrations;
mod transaction;

type PgManager = PostgresConnectionManager<NoTls>;
type PgConnection<'a> = PooledConnection<'a, PgManager>;
type PgTransaction<'a> = tokio_postgres::Transaction<'a>;

/// Pooled handle to the PostgreSQL database holding the contact messages.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: Pool<PgManager>,
}

#[derive(Debug)]
pub struct PostgresDatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl PostgresDatabase {
    pub async fn connect(config: &PostgresDatabaseConfig) -> anyhow::Result<Self> {
        let url = config.url.parse().context("Invalid database url")?;
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_connections))
            .connection_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .build(PostgresConnectionManager::new(url, NoTls))
            .await
            .context("Failed to create database connection pool")?;

        Ok(Self { pool })
    }

    /// Create a database handle without connecting to anything.
    #[cfg(feature = "dummy")]
    pub async fn dummy() -> Self {
        let manager = PostgresConnectionManager::new(Default::default(), NoTls);
        Self {
            pool: Pool::builder().build_unchecked(manager),
        }
    }

    /// Drop all contact messages and the migration bookkeeping.
    pub async fn reset(&self) -> anyhow::Result<()> {
        self.connection()
            .await?
            .batch_execute("drop schema public cascade; create schema public;")
            .await
            .context("Failed to recreate schema public")
    }

    async fn connection(&self) -> anyhow::Result<PgConnection<'_>> {
        self.pool
            .get()
            .await
            .context("Failed to acquire database connection")
    }
}

impl Database for PostgresDatabase {
    type Transaction = PostgresTransaction;

    async fn begin_transaction(&self) -> anyhow::Result<Self::Transaction> {
        trace!("begin transaction");

        let conn = self
            .pool
            .get_owned()
            .await
            .context("Failed to acquire database connection")?;
        PostgresTransaction::begin(conn).await
    }

    #[trace_instrument(skip(self))]
    async fn ping(&self) -> anyhow::Result<()> {
        let one: i32 = self
            .connection()
            .await?
            .query_one("select 1", &[])
            .await
            .context("Failed to ping database")?
            .get(0);
        ensure!(one == 1, "Database answered the ping with {one}");
        Ok(())
    }
}

macro_rules! columns {
    ($vis:vis $ident:ident as $alias:literal: $fst:literal $(, $col:literal)* $(,)?) => {
        ::paste::paste! {
            $vis const [< $ident:snake:upper _CNT >]: usize = [ $fst $(, $col)* ].len();
            $vis const [< $ident:snake:upper _COLS >]: &str = ::core::concat!( '"', $alias, "\".\"", $fst, '"' $(, ", \"" , $alias, "\".\"", $col, '"' )* );
            $vis const [< $ident:snake:upper _COL_NAMES >]: &str = ::core::concat!( '"', $fst, '"' $(, ", \"", $col, '"' )* );
        }
    };
}
use columns;

/// Render `$1, $2, ...` for the given parameter indices.
fn arg_indices(indices: impl IntoIterator<Item = usize>) -> String {
    let mut out = String::new();
    for (i, x) in indices.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(&mut out, "${x}");
    }
    out
}
