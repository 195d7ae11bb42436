//! The execution seam between rendered fragments and a database driver.

use crate::error::Result;
use crate::fragment::params_ref;
use crate::value::Param;
use std::future::Future;
use std::sync::Arc;

/// Anything that can run one parameterized statement.
///
/// Implemented for `tokio_postgres::Client`, pooled deadpool clients and the
/// deadpool pool itself (which checks a connection out per statement).
/// Test doubles implement it with their own `Row` type.
pub trait Executor: Send + Sync {
    /// Row type yielded by this executor.
    type Row: Send;

    /// Run `sql` with `params` bound to `$1..$n` and return every row.
    fn execute_raw(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send;

    /// Run a parameterless control statement such as `BEGIN` or `COMMIT`.
    ///
    /// The default implementation goes through [`Executor::execute_raw`] and
    /// discards the rows.
    fn simple_command(&self, command: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.execute_raw(command, &[]).await?;
            Ok(())
        }
    }

    /// Token for cancelling the statement currently running on this
    /// executor, if the driver supports it.
    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        None
    }
}

impl Executor for tokio_postgres::Client {
    type Row = tokio_postgres::Row;

    async fn execute_raw(&self, sql: &str, params: &[Param]) -> Result<Vec<Self::Row>> {
        let refs = params_ref(params);
        Ok(tokio_postgres::Client::query(self, sql, &refs).await?)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Client::cancel_token(self))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    type Row = tokio_postgres::Row;

    async fn execute_raw(&self, sql: &str, params: &[Param]) -> Result<Vec<Self::Row>> {
        let client: &tokio_postgres::Client = self;
        Executor::execute_raw(client, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        let client: &tokio_postgres::Client = self;
        Executor::cancel_token(client)
    }
}

/// Each statement runs on whichever connection the pool hands out.
#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Pool {
    type Row = tokio_postgres::Row;

    async fn execute_raw(&self, sql: &str, params: &[Param]) -> Result<Vec<Self::Row>> {
        let client = self.get().await?;
        Executor::execute_raw(&client, sql, params).await
    }
}

impl<E: Executor> Executor for &E {
    type Row = E::Row;

    fn execute_raw(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send {
        (**self).execute_raw(sql, params)
    }

    fn simple_command(&self, command: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).simple_command(command)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        (**self).cancel_token()
    }
}

impl<E: Executor> Executor for Arc<E> {
    type Row = E::Row;

    fn execute_raw(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send {
        (**self).execute_raw(sql, params)
    }

    fn simple_command(&self, command: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).simple_command(command)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        (**self).cancel_token()
    }
}
