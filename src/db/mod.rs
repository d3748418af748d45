pub mod row;

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use tokio::time::{timeout_at, Instant};

use crate::config::Config;
use crate::error::QueryError;
pub use row::JsonRow;

/// VM instructions between checks of the interrupt flag.
const PROGRESS_STEPS: i32 = 1_000;

/// Opens the process-wide pool. Connections are read-only: nothing this
/// service runs may change the store.
pub async fn get_db_pool(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.read_only(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
}

/// Value bound to the single placeholder of an item query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Int(i64),
    Text(String),
}

/// Shared handle on the store. Cloning shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl Database {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = get_db_pool(config).await?;
        Ok(Self::new(pool, config.query_timeout))
    }

    /// Runs `sql` with at most one bound parameter and returns every row.
    ///
    /// Checkout and execution share one deadline. A statement abandoned
    /// before it completes, by timeout or by the request being dropped, is
    /// interrupted so its connection is idle again when it returns to the
    /// pool.
    pub async fn fetch_rows(
        &self,
        sql: &str,
        param: Option<&QueryParam>,
    ) -> Result<Vec<JsonRow>, QueryError> {
        let deadline = Instant::now() + self.query_timeout;
        let timed_out = |_| QueryError::Timeout(self.query_timeout);

        let mut conn = timeout_at(deadline, self.pool.acquire())
            .await
            .map_err(timed_out)??;
        let guard = InterruptGuard::install(&mut conn).await?;

        let mut query = sqlx::query(sql);
        query = match param {
            Some(QueryParam::Int(value)) => query.bind(*value),
            Some(QueryParam::Text(value)) => query.bind(value.clone()),
            None => query,
        };

        log::debug!("executing {sql:?} with {param:?}");

        let fetched = timeout_at(deadline, query.fetch_all(&mut *conn)).await;
        let rows = match fetched {
            Ok(rows) => {
                guard.disarm();
                rows?
            }
            Err(elapsed) => {
                drop(guard);
                return Err(timed_out(elapsed));
            }
        };

        rows.iter()
            .map(row::to_json)
            .collect::<Result<Vec<_>, _>>()
            .map_err(QueryError::from)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Interrupts the statement running on a checked-out connection when dropped
/// while still armed.
///
/// The progress handler clears the flag as it fires, so a connection that
/// goes back to the pool is only interrupted once. Every checkout installs a
/// fresh handler, replacing any earlier one.
struct InterruptGuard {
    flag: Option<Arc<AtomicBool>>,
}

impl InterruptGuard {
    async fn install(conn: &mut PoolConnection<Sqlite>) -> Result<Self, sqlx::Error> {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = Arc::clone(&flag);
        conn.lock_handle()
            .await?
            .set_progress_handler(PROGRESS_STEPS, move || {
                !handler_flag.swap(false, Ordering::AcqRel)
            });
        Ok(Self { flag: Some(flag) })
    }

    fn disarm(mut self) {
        self.flag = None;
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Some(flag) = self.flag.take() {
            flag.store(true, Ordering::Release);
        }
    }
}
