use std::borrow::Cow;

/// Default cap on the SQL text written to query logs, in bytes.
pub const DEFAULT_MAX_LOGGED_SQL_LENGTH: usize = 200;

/// Configuration for a [`Sql`](crate::Sql) handle.
#[derive(Debug, Clone)]
pub struct SqlConfig {
    /// Longest SQL text (in bytes) included in log events. `None` logs the
    /// full statement.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            max_logged_sql_length: Some(DEFAULT_MAX_LOGGED_SQL_LENGTH),
        }
    }
}

impl SqlConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncate logged SQL to `max_bytes`.
    pub fn max_logged_sql_length(mut self, max_bytes: usize) -> Self {
        self.max_logged_sql_length = Some(max_bytes);
        self
    }

    /// Log SQL text in full.
    pub fn log_full_sql(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }

    /// SQL text as it should appear in a log event.
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn loggable_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.max_logged_sql_length {
            Some(max) if sql.len() > max => {
                Cow::Owned(format!("{}...", truncate_sql_bytes(sql, max)))
            }
            _ => Cow::Borrowed(sql),
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
