//! Fragment builders for common SQL shapes.
//!
//! All builders are pure: they either return a finished [`Fragment`] or fail
//! before producing any text.
//!
//! # Example
//!
//! ```ignore
//! use pgfrag::{builders, Fragment};
//! use serde_json::json;
//!
//! let rows = [json!({"name": "Alice", "age": 25}), json!({"name": "Bob", "age": 30})];
//! let mut q = Fragment::literal("INSERT INTO users ");
//! q.push_fragment(builders::insert_values(&rows, None)?);
//! assert_eq!(q.to_sql(), "INSERT INTO users (name, age) VALUES ($1, $2), ($3, $4)");
//! ```

use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::record::Record;
use crate::value::Value;

/// An escaped identifier.
pub fn id(name: &str) -> Fragment {
    Fragment::ident(name)
}

/// Raw SQL inserted verbatim.
///
/// Nothing is escaped; never pass untrusted input.
pub fn unsafe_sql(text: impl Into<String>) -> Fragment {
    Fragment::literal(text)
}

/// `VALUES (v, v), (v, v)` from positional rows.
pub fn values<I, R, V>(rows: I) -> Result<Fragment>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let mut out = Fragment::literal("VALUES ");
    let mut count = 0usize;
    for row in rows {
        if count > 0 {
            out.push(", ");
        }
        out.push("(");
        for (i, v) in row.into_iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_value(v);
        }
        out.push(")");
        count += 1;
    }
    if count == 0 {
        return Err(Error::EmptyInput("values"));
    }
    Ok(out)
}

/// `VALUES (v, v), (v, v)` from keyed rows.
///
/// Columns default to the first row's keys.
pub fn values_of<R: Record>(rows: &[R], columns: Option<&[&str]>) -> Result<Fragment> {
    let columns = resolve_columns("values", rows, columns)?;
    let mut out = Fragment::literal("VALUES ");
    push_rows(&mut out, rows, &columns)?;
    Ok(out)
}

/// `(VALUES (v, v), ...) AS alias(col, col)`, usable wherever a table is.
///
/// Columns default to the first row's keys; the alias and every column name
/// are escaped.
pub fn values_table<R: Record>(
    alias: &str,
    rows: &[R],
    columns: Option<&[&str]>,
) -> Result<Fragment> {
    let columns = resolve_columns("values_table", rows, columns)?;
    let mut out = Fragment::literal("(VALUES ");
    push_rows(&mut out, rows, &columns)?;
    out.push(") AS ").push_ident(alias).push("(");
    push_column_list(&mut out, &columns);
    out.push(")");
    Ok(out)
}

/// `(col, col) VALUES (v, v), (v, v)`, for use after `INSERT INTO table`.
///
/// Columns default to the first row's keys.
pub fn insert_values<R: Record>(rows: &[R], columns: Option<&[&str]>) -> Result<Fragment> {
    let columns = resolve_columns("insert_values", rows, columns)?;
    let mut out = Fragment::literal("(");
    push_column_list(&mut out, &columns);
    out.push(") VALUES ");
    push_rows(&mut out, rows, &columns)?;
    Ok(out)
}

/// `(v, v, v)`, e.g. for `IN` lists.
pub fn list<I, V>(items: I) -> Result<Fragment>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let mut out = Fragment::literal("(");
    let mut count = 0usize;
    for item in items {
        if count > 0 {
            out.push(", ");
        }
        out.push_value(item);
        count += 1;
    }
    if count == 0 {
        return Err(Error::EmptyInput("list"));
    }
    out.push(")");
    Ok(out)
}

/// `(v, v, v)` projecting `key` out of each row.
pub fn list_by<R: Record>(rows: &[R], key: &str) -> Result<Fragment> {
    if rows.is_empty() {
        return Err(Error::EmptyInput("list"));
    }
    let mut out = Fragment::literal("(");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        let value = row
            .get(key)
            .ok_or_else(|| Error::missing_column(row.describe(), key))?;
        out.push_value(value);
    }
    out.push(")");
    Ok(out)
}

/// Separator for [`join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    And,
    Or,
    Comma,
}

impl Separator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Separator::And => " AND ",
            Separator::Or => " OR ",
            Separator::Comma => ", ",
        }
    }
}

/// Concatenate fragments with `separator` between consecutive elements.
///
/// Zero fragments give the empty fragment; one is returned unchanged.
pub fn join(separator: Separator, fragments: impl IntoIterator<Item = Fragment>) -> Fragment {
    let mut out = Fragment::empty();
    out.push_separated(fragments, separator.as_sql());
    out
}

/// `a AND b AND c`
pub fn and(fragments: impl IntoIterator<Item = Fragment>) -> Fragment {
    join(Separator::And, fragments)
}

/// `a OR b OR c`
pub fn or(fragments: impl IntoIterator<Item = Fragment>) -> Fragment {
    join(Separator::Or, fragments)
}

/// `a, b, c`
pub fn comma(fragments: impl IntoIterator<Item = Fragment>) -> Fragment {
    join(Separator::Comma, fragments)
}

fn resolve_columns<R: Record>(
    builder: &'static str,
    rows: &[R],
    columns: Option<&[&str]>,
) -> Result<Vec<String>> {
    let Some(first) = rows.first() else {
        return Err(Error::EmptyInput(builder));
    };
    let columns: Vec<String> = match columns {
        Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
        None => first.keys(),
    };
    if columns.is_empty() {
        return Err(Error::NoColumns(builder));
    }
    Ok(columns)
}

fn push_rows<R: Record>(out: &mut Fragment, rows: &[R], columns: &[String]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        out.push("(");
        for (j, column) in columns.iter().enumerate() {
            if j > 0 {
                out.push(", ");
            }
            let value = row
                .get(column)
                .ok_or_else(|| Error::missing_column(row.describe(), column.as_str()))?;
            out.push_value(value);
        }
        out.push(")");
    }
    Ok(())
}

fn push_column_list(out: &mut Fragment, columns: &[String]) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        out.push_ident(column);
    }
}

#[cfg(test)]
mod tests;
