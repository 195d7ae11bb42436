//! SQL identifier escaping.
//!
//! Postgres identifiers cannot be bound as parameters, so dynamic table and
//! column names go through [`escape_identifier`] instead:
//!
//! - plain lowercase names that are not reserved keywords pass through as-is
//! - anything else is double-quoted, with embedded `"` doubled
//! - names with control or non-ASCII characters use the `U&"..."` form with
//!   `\XXXX` / `\+XXXXXX` code point escapes
//!
//! # Example
//! ```ignore
//! use pgfrag::escape_identifier;
//!
//! assert_eq!(escape_identifier("users"), "users");
//! assert_eq!(escape_identifier("user"), r#""user""#);
//! assert_eq!(escape_identifier("Users"), r#""Users""#);
//! assert_eq!(escape_identifier("café"), r#"U&"caf\00E9""#);
//! ```

use std::fmt::Write;

/// Keywords Postgres reserves (including those only allowed as function or
/// type names). Sorted for binary search.
const RESERVED_KEYWORDS: &[&str] = &[
    "ALL",
    "ANALYSE",
    "ANALYZE",
    "AND",
    "ANY",
    "ARRAY",
    "AS",
    "ASC",
    "ASYMMETRIC",
    "AUTHORIZATION",
    "BINARY",
    "BOTH",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLLATION",
    "COLUMN",
    "CONCURRENTLY",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_CATALOG",
    "CURRENT_DATE",
    "CURRENT_ROLE",
    "CURRENT_SCHEMA",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DEFERRABLE",
    "DESC",
    "DISTINCT",
    "DO",
    "ELSE",
    "END",
    "EXCEPT",
    "FALSE",
    "FETCH",
    "FOR",
    "FOREIGN",
    "FREEZE",
    "FROM",
    "FULL",
    "GRANT",
    "GROUP",
    "HAVING",
    "ILIKE",
    "IN",
    "INITIALLY",
    "INNER",
    "INTERSECT",
    "INTO",
    "IS",
    "ISNULL",
    "JOIN",
    "LATERAL",
    "LEADING",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NATURAL",
    "NOT",
    "NOTNULL",
    "NULL",
    "OFFSET",
    "ON",
    "ONLY",
    "OR",
    "ORDER",
    "OUTER",
    "OVERLAPS",
    "PLACING",
    "PRIMARY",
    "REFERENCES",
    "RETURNING",
    "RIGHT",
    "SELECT",
    "SESSION_USER",
    "SIMILAR",
    "SOME",
    "SYMMETRIC",
    "SYSTEM_USER",
    "TABLE",
    "TABLESAMPLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "USER",
    "USING",
    "VARIADIC",
    "VERBOSE",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
];

/// Whether `word` is a reserved Postgres keyword (case-insensitive).
pub fn is_reserved_keyword(word: &str) -> bool {
    RESERVED_KEYWORDS
        .binary_search_by(|kw| kw.bytes().cmp(word.bytes().map(|b| b.to_ascii_uppercase())))
        .is_ok()
}

/// `^[a-z_][a-z0-9$_]*$`
fn is_plain_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    if !(first == b'_' || first.is_ascii_lowercase()) {
        return false;
    }
    bytes.all(|b| b == b'_' || b == b'$' || b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Outside the printable ASCII range 32..=126.
fn needs_unicode_escape(c: char) -> bool {
    !(' '..='~').contains(&c)
}

/// Escape `name` as a Postgres identifier.
///
/// Never fails: any string maps to a valid identifier that Postgres reads
/// back as exactly `name`.
pub fn escape_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_identifier(&mut out, name);
    out
}

pub(crate) fn write_identifier(out: &mut String, name: &str) {
    if is_plain_identifier(name) && !is_reserved_keyword(name) {
        out.push_str(name);
        return;
    }

    if !name.chars().any(needs_unicode_escape) {
        out.push('"');
        for ch in name.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
        return;
    }

    out.push_str("U&\"");
    for ch in name.chars() {
        match ch {
            '"' => out.push_str("\"\""),
            // `\` is the escape character inside U&"..."
            '\\' => out.push_str("\\\\"),
            c if needs_unicode_escape(c) => {
                let code = u32::from(c);
                // Writing to a String cannot fail.
                let _ = if code > 0xFFFF {
                    write!(out, "\\+{code:06X}")
                } else {
                    write!(out, "\\{code:04X}")
                };
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
