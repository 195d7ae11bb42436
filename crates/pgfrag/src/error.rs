//! Error types for pgfrag

use thiserror::Error;

/// Result type alias for pgfrag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fragment building and execution
#[derive(Debug, Error)]
pub enum Error {
    /// A builder received no rows or items where at least one is required
    #[error("{0} requires at least one row or item")]
    EmptyInput(&'static str),

    /// The resolved column set is empty
    #[error("{0} requires at least one column")]
    NoColumns(&'static str),

    /// A row lacks a column present in the resolved column set
    #[error("row {row} is missing column \"{column}\"")]
    MissingColumn { row: String, column: String },

    /// A fragment list contains something other than a fragment
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Template literal parts and interpolations are out of step
    #[error("template has {parts} literal parts for {args} interpolations")]
    TemplateArity { parts: usize, args: usize },

    /// A statement was issued through a transaction's connection after the
    /// transaction committed or rolled back
    #[error("transaction is closed")]
    TransactionClosed,

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing column error for a row.
    pub fn missing_column(row: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            row: row.into(),
            column: column.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// Check if this is an empty input error
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput(_))
    }

    /// Check if this is a no columns error
    pub fn is_no_columns(&self) -> bool {
        matches!(self, Self::NoColumns(_))
    }

    /// Check if this is a missing column error
    pub fn is_missing_column(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }

    /// Check if this is a type mismatch error
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch(_))
    }

    /// Check if this is a closed transaction error
    pub fn is_transaction_closed(&self) -> bool {
        matches!(self, Self::TransactionClosed)
    }

    /// Whether this error was raised while building a fragment, before any I/O.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput(_)
                | Self::NoColumns(_)
                | Self::MissingColumn { .. }
                | Self::TypeMismatch(_)
                | Self::TemplateArity { .. }
        )
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for Error {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
