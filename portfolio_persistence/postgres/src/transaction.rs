use anyhow::{anyhow, Context};
use bb8::PooledConnection;
use ouroboros::self_referencing;
use portfolio_persistence_contracts::Transaction;
use tracing::trace;

use crate::{PgManager, PgTransaction};

/// An open transaction together with the pooled connection it runs on.
///
/// The connection goes back to the pool once the transaction is dropped.
/// Dropping without [`Transaction::commit`] rolls back.
#[self_referencing]
pub struct PostgresTransaction {
    conn: PooledConnection<'static, PgManager>,
    #[borrows(mut conn)]
    #[covariant]
    inner: Option<PgTransaction<'this>>,
}

impl PostgresTransaction {
    pub(crate) async fn begin(conn: PooledConnection<'static, PgManager>) -> anyhow::Result<Self> {
        PostgresTransactionAsyncSendTryBuilder {
            conn,
            inner_builder: |conn| Box::pin(async move { conn.transaction().await.map(Some) }),
        }
        .try_build()
        .await
        .context("Failed to begin transaction")
    }

    pub(crate) fn client(&self) -> anyhow::Result<&PgTransaction<'_>> {
        self.borrow_inner()
            .as_ref()
            .ok_or_else(|| anyhow!("Transaction has already been finished"))
    }

    async fn finish(mut self, commit: bool) -> anyhow::Result<()> {
        let txn = self
            .with_inner_mut(|txn| txn.take())
            .ok_or_else(|| anyhow!("Transaction has already been finished"))?;

        if commit {
            txn.commit().await.context("Failed to commit transaction")
        } else {
            txn.rollback().await.context("Failed to roll back transaction")
        }
    }
}

impl Transaction for PostgresTransaction {
    async fn commit(self) -> anyhow::Result<()> {
        trace!("commit transaction");
        self.finish(true).await
    }

    async fn rollback(self) -> anyhow::Result<()> {
        trace!("rollback transaction");
        self.finish(false).await
    }
}
