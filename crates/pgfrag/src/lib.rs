//! # pgfrag
//!
//! Composable, parameter-safe PostgreSQL query fragments.
//!
//! ## Features
//!
//! - **Values never touch SQL text**: every interpolated value becomes a `$n`
//!   placeholder with the value in the parameter vector
//! - **Fragments compose**: embed one fragment in another and placeholders are
//!   renumbered from the final position
//! - **Builders for the awkward parts**: escaped identifiers, multi-row
//!   `VALUES`, `INSERT` column lists, `IN` lists, `AND`/`OR` joins
//! - **Transactions**: `BEGIN`/`COMMIT`/`ROLLBACK` around a unit of work on a
//!   reserved pool connection
//!
//! ## Example
//!
//! ```ignore
//! use pgfrag::{sql, Sql};
//! use serde_json::json;
//!
//! let db = Sql::new(pgfrag::create_pool(&std::env::var("DATABASE_URL")?)?);
//!
//! let rows = [json!({"name": "Alice", "age": 25}), json!({"name": "Bob", "age": 30})];
//! db.query(sql!("INSERT INTO users {}", db.insert_values(&rows, None)?)?).await?;
//!
//! let filter = sql!("age > {}", 18)?;
//! let adults = db
//!     .query(sql!("SELECT * FROM {} WHERE {}", db.id("users"), filter)?)
//!     .await?;
//! ```

// Lets `::pgfrag::` paths emitted by the proc macros resolve inside this crate.
extern crate self as pgfrag;

pub mod builders;
pub mod client;
pub mod config;
pub mod error;
pub mod fragment;
pub mod ident;
pub mod pool;
pub mod query;
pub mod record;
pub mod template;
pub mod transaction;
pub mod value;

pub use builders::Separator;
pub use client::Executor;
pub use config::SqlConfig;
pub use error::{Error, Result};
pub use fragment::Fragment;
pub use ident::escape_identifier;
pub use pool::Pool;
pub use query::{Query, Sql};
pub use record::Record;
pub use template::{Arg, IntoArg, compose};
pub use transaction::{IsolationLevel, TransactionOptions, TxConnection, TxState, transaction};
pub use value::{Param, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "macros")]
pub use pgfrag_macros::{Record, sql};

// Re-exported so callers can name row and cancel-token types.
pub use tokio_postgres;
