//! Transactions over a reserved connection.
//!
//! [`transaction`] checks a connection out of a [`Pool`], issues `BEGIN`, and
//! hands the unit of work a [`Sql`] bound to that connection. When the work
//! returns `Ok` the transaction commits; when it returns `Err` the transaction
//! rolls back and the error is returned exactly as the work produced it.
//!
//! ```ignore
//! let db = pgfrag::Sql::new(pool);
//! let id: i64 = db
//!     .begin(|tx| async move {
//!         tx.query(pgfrag::sql!("UPDATE accounts SET balance = balance - {} WHERE id = {}", 100, 1)?)
//!             .await?;
//!         let rows = tx.query(pgfrag::sql!("SELECT id FROM accounts WHERE id = {}", 1)?).await?;
//!         Ok::<_, pgfrag::Error>(rows[0].get(0))
//!     })
//!     .await?;
//! ```
//!
//! The connection goes back to the pool before `transaction` returns. The
//! work's handle is a [`TxConnection`]; once the transaction has closed, any
//! copy of it that escaped fails with [`Error::TransactionClosed`].
//!
//! If the returned future is dropped while the transaction is active (a
//! timeout, a `select!` branch losing), `ROLLBACK` is spawned on the reserved
//! connection and the connection is released only after it completes.

use crate::client::Executor;
use crate::config::SqlConfig;
use crate::error::{Error, Result};
use crate::pool::Pool;
use crate::query::Sql;
use crate::value::Param;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Lifecycle of one transaction. `Committed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Active,
    Committed,
    RolledBack,
}

/// Postgres transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Modes applied to `BEGIN`. The default is a plain `BEGIN`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation: Option<IsolationLevel>,
    pub read_only: Option<bool>,
    pub deferrable: Option<bool>,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = Some(deferrable);
        self
    }

    /// The `BEGIN` command for these options.
    pub fn begin_sql(&self) -> String {
        let mut modes: Vec<String> = Vec::new();
        if let Some(level) = self.isolation {
            modes.push(format!("ISOLATION LEVEL {}", level.as_sql()));
        }
        match self.read_only {
            Some(true) => modes.push("READ ONLY".to_string()),
            Some(false) => modes.push("READ WRITE".to_string()),
            None => {}
        }
        match self.deferrable {
            Some(true) => modes.push("DEFERRABLE".to_string()),
            Some(false) => modes.push("NOT DEFERRABLE".to_string()),
            None => {}
        }

        if modes.is_empty() {
            "BEGIN".to_string()
        } else {
            format!("BEGIN {}", modes.join(", "))
        }
    }
}

/// The connection handed to a unit of work.
///
/// Clones share one slot. The transaction empties the slot when it commits or
/// rolls back, after which every statement fails with
/// [`Error::TransactionClosed`].
pub struct TxConnection<C> {
    slot: Arc<Mutex<Option<Arc<C>>>>,
}

impl<C> Clone for TxConnection<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C> fmt::Debug for TxConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxConnection")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<C> TxConnection<C> {
    fn new(conn: Arc<C>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(conn))),
        }
    }

    fn checkout(&self) -> Result<Arc<C>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::TransactionClosed)
    }

    fn close(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Whether the owning transaction has finished.
    pub fn is_closed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<C: Executor> Executor for TxConnection<C> {
    type Row = C::Row;

    fn execute_raw(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send {
        let conn = self.checkout();
        async move {
            let conn = conn?;
            conn.execute_raw(sql, params).await
        }
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.checkout().ok()?.cancel_token()
    }
}

/// Control-command driver for one reserved connection.
///
/// Dropping it closes the work's [`TxConnection`]. Dropping it while
/// [`TxState::Active`] spawns a `ROLLBACK` that owns the last reference to
/// the connection.
struct Transaction<C: Executor + 'static> {
    conn: Arc<C>,
    handle: TxConnection<C>,
    state: TxState,
}

impl<C: Executor + 'static> Transaction<C> {
    fn new(conn: C) -> Self {
        let conn = Arc::new(conn);
        Self {
            handle: TxConnection::new(Arc::clone(&conn)),
            conn,
            state: TxState::Idle,
        }
    }

    fn handle(&self) -> TxConnection<C> {
        self.handle.clone()
    }

    async fn begin(&mut self, options: &TransactionOptions) -> Result<()> {
        debug_assert_eq!(self.state, TxState::Idle);
        let command = options.begin_sql();
        self.conn.simple_command(&command).await?;
        self.state = TxState::Active;
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "pgfrag.tx", command = %command, "transaction started");
        Ok(())
    }

    /// A failed `COMMIT` leaves the transaction aborted server-side, so it
    /// counts as rolled back.
    async fn commit(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, TxState::Active);
        self.handle.close();
        let result = self.conn.simple_command("COMMIT").await;
        self.state = match result {
            Ok(()) => TxState::Committed,
            Err(_) => TxState::RolledBack,
        };
        #[cfg(feature = "tracing")]
        if result.is_ok() {
            tracing::debug!(target: "pgfrag.tx", "transaction committed");
        }
        result
    }

    async fn rollback(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, TxState::Active);
        #[cfg(feature = "tracing")]
        tracing::warn!(target: "pgfrag.tx", "unit of work failed, rolling back");
        self.handle.close();
        let result = self.conn.simple_command("ROLLBACK").await;
        self.state = TxState::RolledBack;
        result
    }
}

impl<C: Executor + 'static> Drop for Transaction<C> {
    fn drop(&mut self) {
        self.handle.close();
        if self.state != TxState::Active {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(target: "pgfrag.tx", "transaction dropped while active, rolling back");

        let conn = Arc::clone(&self.conn);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(_err) = conn.simple_command("ROLLBACK").await {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(target: "pgfrag.tx", error = %_err, "rollback after drop failed");
                    }
                });
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(target: "pgfrag.tx", "no runtime to roll back on, releasing connection as is");
            }
        }
    }
}

/// Run `work` inside a transaction on a connection reserved from `pool`.
///
/// Failures of `BEGIN`, `COMMIT` or `ROLLBACK` are returned as `Er::from`
/// of the driver error. An error from `work` is returned unchanged after
/// the rollback.
pub async fn transaction<P, F, Fut, T, Er>(pool: &P, work: F) -> std::result::Result<T, Er>
where
    P: Pool,
    F: FnOnce(Sql<TxConnection<P::Connection>>) -> Fut,
    Fut: Future<Output = std::result::Result<T, Er>>,
    Er: From<Error>,
{
    run_transaction(pool, &TransactionOptions::default(), SqlConfig::default(), work).await
}

impl<P: Pool> Sql<P> {
    /// Run `work` inside a transaction on a connection reserved from this
    /// handle's pool. See [`transaction`].
    pub async fn begin<F, Fut, T, Er>(&self, work: F) -> std::result::Result<T, Er>
    where
        F: FnOnce(Sql<TxConnection<P::Connection>>) -> Fut,
        Fut: Future<Output = std::result::Result<T, Er>>,
        Er: From<Error>,
    {
        self.begin_with(TransactionOptions::default(), work).await
    }

    /// Like [`Sql::begin`], with isolation and access modes applied to
    /// `BEGIN`.
    pub async fn begin_with<F, Fut, T, Er>(
        &self,
        options: TransactionOptions,
        work: F,
    ) -> std::result::Result<T, Er>
    where
        F: FnOnce(Sql<TxConnection<P::Connection>>) -> Fut,
        Fut: Future<Output = std::result::Result<T, Er>>,
        Er: From<Error>,
    {
        run_transaction(self.executor(), &options, self.config().clone(), work).await
    }
}

async fn run_transaction<P, F, Fut, T, Er>(
    pool: &P,
    options: &TransactionOptions,
    config: SqlConfig,
    work: F,
) -> std::result::Result<T, Er>
where
    P: Pool,
    F: FnOnce(Sql<TxConnection<P::Connection>>) -> Fut,
    Fut: Future<Output = std::result::Result<T, Er>>,
    Er: From<Error>,
{
    let mut tx = Transaction::new(pool.reserve().await?);
    tx.begin(options).await?;

    match work(Sql::with_config(tx.handle(), config)).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            tx.rollback().await?;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Param;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
    }

    impl Executor for Recorder {
        type Row = ();

        async fn execute_raw(&self, sql: &str, _params: &[Param]) -> Result<Vec<()>> {
            self.commands.lock().unwrap().push(sql.to_string());
            Ok(Vec::new())
        }
    }

    #[test]
    fn begin_sql_variants() {
        assert_eq!(TransactionOptions::new().begin_sql(), "BEGIN");
        assert_eq!(
            TransactionOptions::new()
                .isolation(IsolationLevel::Serializable)
                .begin_sql(),
            "BEGIN ISOLATION LEVEL SERIALIZABLE"
        );
        assert_eq!(
            TransactionOptions::new()
                .isolation(IsolationLevel::RepeatableRead)
                .read_only(true)
                .deferrable(true)
                .begin_sql(),
            "BEGIN ISOLATION LEVEL REPEATABLE READ, READ ONLY, DEFERRABLE"
        );
        assert_eq!(
            TransactionOptions::new().read_only(false).begin_sql(),
            "BEGIN READ WRITE"
        );
    }

    #[tokio::test]
    async fn state_machine_commit_path() {
        let conn = Arc::new(Recorder::default());
        let mut tx = Transaction::new(Arc::clone(&conn));
        assert_eq!(tx.state, TxState::Idle);
        tx.begin(&TransactionOptions::default()).await.unwrap();
        assert_eq!(tx.state, TxState::Active);
        tx.commit().await.unwrap();
        assert_eq!(tx.state, TxState::Committed);
        assert_eq!(*conn.commands.lock().unwrap(), vec!["BEGIN", "COMMIT"]);
    }

    #[tokio::test]
    async fn state_machine_rollback_path() {
        let conn = Arc::new(Recorder::default());
        let mut tx = Transaction::new(Arc::clone(&conn));
        tx.begin(&TransactionOptions::default()).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(tx.state, TxState::RolledBack);
        assert_eq!(*conn.commands.lock().unwrap(), vec!["BEGIN", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn handle_closes_when_transaction_finishes() {
        let conn = Arc::new(Recorder::default());
        let mut tx = Transaction::new(Arc::clone(&conn));
        let handle = tx.handle();
        tx.begin(&TransactionOptions::default()).await.unwrap();
        handle.execute_raw("SELECT 1", &[]).await.unwrap();
        tx.commit().await.unwrap();

        assert!(handle.is_closed());
        let err = handle.execute_raw("SELECT 2", &[]).await.unwrap_err();
        assert!(err.is_transaction_closed());
        assert_eq!(
            *conn.commands.lock().unwrap(),
            vec!["BEGIN", "SELECT 1", "COMMIT"]
        );
    }

    #[tokio::test]
    async fn dropping_active_transaction_spawns_rollback() {
        let conn = Arc::new(Recorder::default());
        let mut tx = Transaction::new(Arc::clone(&conn));
        let handle = tx.handle();
        tx.begin(&TransactionOptions::default()).await.unwrap();
        drop(tx);

        assert!(handle.is_closed());
        for _ in 0..10 {
            if Arc::strong_count(&conn) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(Arc::strong_count(&conn), 1);
        assert_eq!(*conn.commands.lock().unwrap(), vec!["BEGIN", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn dropping_finished_transaction_sends_nothing() {
        let conn = Arc::new(Recorder::default());
        let mut tx = Transaction::new(Arc::clone(&conn));
        tx.begin(&TransactionOptions::default()).await.unwrap();
        tx.commit().await.unwrap();
        drop(tx);
        tokio::task::yield_now().await;
        assert_eq!(*conn.commands.lock().unwrap(), vec!["BEGIN", "COMMIT"]);
    }
}
