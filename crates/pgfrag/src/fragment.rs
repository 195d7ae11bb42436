//! The fragment type.
//!
//! A [`Fragment`] is literal SQL text interleaved with bound parameters:
//! `parts[0] $1 parts[1] $2 ... parts[n]`. Placeholder numbers are never
//! stored; they are assigned from position when the fragment is rendered, so
//! merging fragments is plain concatenation and nested composition always
//! yields `$1..$n` in order.
//!
//! # Example
//!
//! ```ignore
//! use pgfrag::Fragment;
//!
//! let mut w = Fragment::literal(" WHERE id = ");
//! w.push_value(42);
//!
//! let mut q = Fragment::literal("SELECT * FROM users");
//! q.push_fragment(w);
//! assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id = $1");
//! ```

use crate::ident::write_identifier;
use crate::value::{Param, Value};
use std::fmt::{self, Write};
use tokio_postgres::types::ToSql;

/// A placeholder-indexed piece of SQL plus its bound parameters.
///
/// Invariant: `parts.len() == params.len() + 1`.
#[must_use]
#[derive(Clone, PartialEq)]
pub struct Fragment {
    parts: Vec<String>,
    params: Vec<Param>,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::empty()
    }
}

impl Fragment {
    /// The empty fragment: no text, no parameters.
    pub fn empty() -> Self {
        Self {
            parts: vec![String::new()],
            params: Vec::new(),
        }
    }

    /// A parameterless fragment holding `sql` verbatim.
    pub fn literal(sql: impl Into<String>) -> Self {
        Self {
            parts: vec![sql.into()],
            params: Vec::new(),
        }
    }

    /// A fragment holding the escaped identifier `name`.
    pub fn ident(name: &str) -> Self {
        let mut f = Self::empty();
        f.push_ident(name);
        f
    }

    /// Literal text segments; always one more than [`Fragment::params`].
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Split into `(parts, params)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<Param>) {
        (self.parts, self.params)
    }

    /// No text and no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.parts.iter().all(String::is_empty)
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if let Some(last) = self.parts.last_mut() {
            last.push_str(sql);
        }
        self
    }

    /// Append an escaped identifier.
    pub fn push_ident(&mut self, name: &str) -> &mut Self {
        if let Some(last) = self.parts.last_mut() {
            write_identifier(last, name);
        }
        self
    }

    /// Append one placeholder bound to `param`.
    pub fn push_param(&mut self, param: impl Into<Param>) -> &mut Self {
        self.params.push(param.into());
        self.parts.push(String::new());
        self
    }

    /// Append a value: scalars become one placeholder, arrays become
    /// `ARRAY[...]` with one placeholder per leaf (`[...]` when nested).
    pub fn push_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.write_value(value.into(), false);
        self
    }

    fn write_value(&mut self, value: Value, nested: bool) {
        match value {
            Value::Param(param) => {
                self.push_param(param);
            }
            Value::Array(items) => {
                self.push(if nested { "[" } else { "ARRAY[" });
                for (i, item) in items.into_iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.write_value(item, true);
                }
                self.push("]");
            }
        }
    }

    /// Splice another fragment in, consuming it.
    ///
    /// Its first literal part joins this fragment's last one; everything after
    /// follows in order.
    pub fn push_fragment(&mut self, other: Fragment) -> &mut Self {
        let mut parts = other.parts.into_iter();
        if let Some(first) = parts.next() {
            self.push(&first);
        }
        self.parts.extend(parts);
        self.params.extend(other.params);
        self
    }

    /// Append `items` separated by `separator`.
    pub fn push_separated(
        &mut self,
        items: impl IntoIterator<Item = Fragment>,
        separator: &str,
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.push_fragment(item);
        }
        self
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        #[inline]
        fn decimal_digits(n: usize) -> usize {
            if n < 10 {
                1
            } else if n < 100 {
                2
            } else if n < 1000 {
                3
            } else {
                (n.ilog10() as usize) + 1
            }
        }

        let mut cap: usize = self.parts.iter().map(String::len).sum();
        for idx in 1..=self.params.len() {
            cap += 1 /* '$' */ + decimal_digits(idx);
        }

        let mut out = String::with_capacity(cap);
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                // Writing to a String cannot fail.
                let _ = write!(out, "${i}");
            }
            out.push_str(part);
        }
        out
    }

    /// Render to the final `(sql, params)` pair handed to the driver.
    pub fn render(&self) -> (String, Vec<Param>) {
        (self.to_sql(), self.params.clone())
    }

    /// Consuming counterpart of [`Fragment::render`].
    pub fn into_rendered(self) -> (String, Vec<Param>) {
        let sql = self.to_sql();
        (sql, self.params)
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        params_ref(&self.params)
    }
}

pub(crate) fn params_ref(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

// Show what would be sent, not the internal part vector.
impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("sql", &self.to_sql())
            .field("params", &self.params)
            .finish()
    }
}

/// Concatenates fragments with no separator.
impl FromIterator<Fragment> for Fragment {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        let mut out = Fragment::empty();
        for f in iter {
            out.push_fragment(f);
        }
        out
    }
}
