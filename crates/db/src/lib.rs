//! PostgreSQL handle and statement building for shelf.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

pub mod statement;

pub use statement::{BindValue, Dialect, RenderedStatement, SelectStatement, SortDirection};

/// Shared database handle passed explicitly to whoever needs it.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    statement_timeout: Duration,
}

impl Database {
    /// Open the pool and make sure the server answers.
    pub async fn connect(url: &str, statement_timeout: Duration) -> anyhow::Result<Self> {
        let options = Self::connect_options(url, statement_timeout)?;
        let pool = PgPoolOptions::new()
            .connect_with(options)
            .await
            .context("open db")?;
        let db = Self::from_pool(pool, statement_timeout);
        db.ping().await.context("ping db")?;

        tracing::info!(target: "shelf-db", "database connection established");
        Ok(db)
    }

    /// Build a handle whose connections are opened on first use.
    pub fn connect_lazy(url: &str, statement_timeout: Duration) -> anyhow::Result<Self> {
        let options = Self::connect_options(url, statement_timeout)?;
        let pool = PgPoolOptions::new().connect_lazy_with(options);
        Ok(Self::from_pool(pool, statement_timeout))
    }

    /// Parse `url` and have the server cancel any statement running longer
    /// than `statement_timeout`, so an abandoned query frees its connection.
    pub fn connect_options(
        url: &str,
        statement_timeout: Duration,
    ) -> anyhow::Result<PgConnectOptions> {
        let options = PgConnectOptions::from_str(url).context("parse database url")?;
        Ok(options.options([(
            "statement_timeout",
            statement_timeout.as_millis().to_string(),
        )]))
    }

    pub fn from_pool(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Longest a single statement may run before it is abandoned. Pools built
    /// by [`Database::connect`] or [`Database::connect_lazy`] enforce the same
    /// bound on the server.
    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    /// Round-trip `SELECT 1`, bounded by the statement timeout.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let ping = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(self.statement_timeout, ping).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(sqlx::Error::PoolTimedOut),
        }
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "shelf-db", "database connections closed");
    }
}
