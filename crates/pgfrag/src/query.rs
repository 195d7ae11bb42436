//! The bound query surface.
//!
//! [`Sql`] pairs an [`Executor`] with a [`SqlConfig`] and exposes the
//! builders as methods, so application code can hold one value and both
//! build and run queries through it:
//!
//! ```ignore
//! let db = pgfrag::Sql::new(pool);
//! let rows = db.query(pgfrag::sql!("SELECT * FROM {} WHERE id = {}", db.id("users"), 7)?).await?;
//! ```

use crate::builders::{self, Separator};
use crate::client::Executor;
use crate::config::SqlConfig;
use crate::error::Result;
use crate::fragment::Fragment;
use crate::record::Record;
use crate::value::{Param, Value};
use futures_util::future::BoxFuture;
use std::future::IntoFuture;

/// A query builder bound to an executor.
#[derive(Debug, Clone)]
pub struct Sql<E> {
    executor: E,
    config: SqlConfig,
}

impl<E> Sql<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, SqlConfig::default())
    }

    pub fn with_config(executor: E, config: SqlConfig) -> Self {
        Self { executor, config }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// See [`builders::id`].
    pub fn id(&self, name: &str) -> Fragment {
        builders::id(name)
    }

    /// See [`builders::unsafe_sql`].
    pub fn unsafe_sql(&self, text: impl Into<String>) -> Fragment {
        builders::unsafe_sql(text)
    }

    /// See [`builders::values`].
    pub fn values<I, R, V>(&self, rows: I) -> Result<Fragment>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        builders::values(rows)
    }

    /// See [`builders::values_of`].
    pub fn values_of<R: Record>(&self, rows: &[R], columns: Option<&[&str]>) -> Result<Fragment> {
        builders::values_of(rows, columns)
    }

    /// See [`builders::values_table`].
    pub fn values_table<R: Record>(
        &self,
        alias: &str,
        rows: &[R],
        columns: Option<&[&str]>,
    ) -> Result<Fragment> {
        builders::values_table(alias, rows, columns)
    }

    /// See [`builders::insert_values`].
    pub fn insert_values<R: Record>(
        &self,
        rows: &[R],
        columns: Option<&[&str]>,
    ) -> Result<Fragment> {
        builders::insert_values(rows, columns)
    }

    /// See [`builders::list`].
    pub fn list<I, V>(&self, items: I) -> Result<Fragment>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        builders::list(items)
    }

    /// See [`builders::list_by`].
    pub fn list_by<R: Record>(&self, rows: &[R], key: &str) -> Result<Fragment> {
        builders::list_by(rows, key)
    }

    /// See [`builders::join`].
    pub fn join(
        &self,
        separator: Separator,
        fragments: impl IntoIterator<Item = Fragment>,
    ) -> Fragment {
        builders::join(separator, fragments)
    }
}

impl<E: Executor> Sql<E> {
    /// Wrap `fragment` as a runnable query. Nothing is sent until the
    /// returned [`Query`] is awaited.
    pub fn query(&self, fragment: Fragment) -> Query<'_, E> {
        Query {
            sql: self,
            fragment,
        }
    }

    /// Render and run `fragment`, returning every row.
    pub async fn execute(&self, fragment: &Fragment) -> Result<Vec<E::Row>> {
        run(&self.executor, &self.config, fragment).await
    }
}

/// A fragment bound to an executor.
///
/// Awaiting the query runs it:
///
/// ```ignore
/// let rows = db.query(fragment).await?;
/// ```
#[must_use = "queries do nothing unless awaited"]
pub struct Query<'a, E> {
    sql: &'a Sql<E>,
    fragment: Fragment,
}

impl<'a, E: Executor> Query<'a, E> {
    /// The fragment this query will run.
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Take the fragment back without running it, e.g. to splice it into a
    /// larger query.
    pub fn unexecuted(self) -> Fragment {
        self.fragment
    }

    /// The `(sql, params)` pair that awaiting would send.
    pub fn render(&self) -> (String, Vec<Param>) {
        self.fragment.render()
    }

    /// Token for cancelling this query once it is running.
    pub fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.sql.executor.cancel_token()
    }

    /// Run the query and return every row.
    pub async fn fetch_all(self) -> Result<Vec<E::Row>> {
        self.sql.execute(&self.fragment).await
    }
}

impl<'a, E: Executor + 'a> IntoFuture for Query<'a, E> {
    type Output = Result<Vec<E::Row>>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.fetch_all())
    }
}

impl Fragment {
    /// Run this fragment on `executor` with the default [`SqlConfig`].
    pub async fn fetch_all<E: Executor>(&self, executor: &E) -> Result<Vec<E::Row>> {
        run(executor, &SqlConfig::default(), self).await
    }
}

pub(crate) async fn run<E: Executor>(
    executor: &E,
    config: &SqlConfig,
    fragment: &Fragment,
) -> Result<Vec<E::Row>> {
    let sql = fragment.to_sql();
    log_query(config, &sql, fragment.param_count());
    executor.execute_raw(&sql, fragment.params()).await
}

#[cfg(feature = "tracing")]
fn log_query(config: &SqlConfig, sql: &str, param_count: usize) {
    tracing::debug!(
        target: "pgfrag.sql",
        param_count,
        sql = %config.loggable_sql(sql),
        "executing query"
    );
}

#[cfg(not(feature = "tracing"))]
fn log_query(_config: &SqlConfig, _sql: &str, _param_count: usize) {}
