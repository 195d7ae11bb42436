//! Template composition.
//!
//! [`compose`] turns literal parts plus interpolated arguments into one
//! [`Fragment`]. The `sql!` macro is the usual front end:
//!
//! ```ignore
//! let q = pgfrag::sql!("SELECT * FROM users WHERE id = {} AND name = {}", 123, "Alice")?;
//! assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id = $1 AND name = $2");
//! ```
//!
//! Each argument is dispatched on its shape:
//! - a [`Fragment`] is spliced in
//! - a list whose first element is a fragment splices every element (all of
//!   them must be fragments)
//! - anything else is a value: scalars bind one placeholder, lists become
//!   `ARRAY[...]`

use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::value::{Param, Value};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// One interpolated template argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Fragment(Fragment),
    Value(Value),
    List(Vec<Arg>),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Fragment(_) => "fragment",
            Arg::Value(_) => "value",
            Arg::List(_) => "list",
        }
    }

    /// Resolve as a plain value; fragments cannot appear inside values.
    fn into_value(self) -> Result<Value> {
        match self {
            Arg::Value(v) => Ok(v),
            Arg::List(items) => items
                .into_iter()
                .map(Arg::into_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Arg::Fragment(f) => Err(Error::type_mismatch(format!(
                "fragment {:?} inside a value array",
                f.to_sql()
            ))),
        }
    }
}

/// Conversion into a template argument.
pub trait IntoArg {
    fn into_arg(self) -> Arg;
}

impl IntoArg for Arg {
    fn into_arg(self) -> Arg {
        self
    }
}

impl IntoArg for Fragment {
    fn into_arg(self) -> Arg {
        Arg::Fragment(self)
    }
}

impl IntoArg for &Fragment {
    fn into_arg(self) -> Arg {
        Arg::Fragment(self.clone())
    }
}

impl IntoArg for Value {
    fn into_arg(self) -> Arg {
        Arg::Value(self)
    }
}

impl IntoArg for Param {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::Param(self))
    }
}

impl<T: IntoArg> IntoArg for Vec<T> {
    fn into_arg(self) -> Arg {
        Arg::List(self.into_iter().map(IntoArg::into_arg).collect())
    }
}

impl<T: IntoArg, const N: usize> IntoArg for [T; N] {
    fn into_arg(self) -> Arg {
        Arg::List(self.into_iter().map(IntoArg::into_arg).collect())
    }
}

impl<T: IntoArg + Clone> IntoArg for &[T] {
    fn into_arg(self) -> Arg {
        Arg::List(self.iter().cloned().map(IntoArg::into_arg).collect())
    }
}

impl<T: IntoArg> IntoArg for Option<T> {
    fn into_arg(self) -> Arg {
        match self {
            Some(v) => v.into_arg(),
            None => Arg::Value(Value::NULL),
        }
    }
}

macro_rules! impl_into_arg_for_scalars {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoArg for $ty {
                fn into_arg(self) -> Arg {
                    Arg::Value(Value::from(self))
                }
            }
        )*
    };
}

impl_into_arg_for_scalars!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    i128,
    f32,
    f64,
    Decimal,
    &str,
    String,
    &String,
    char,
    DateTime<Utc>,
    Bytes,
    Uuid,
    serde_json::Value,
);

/// Compose literal parts and arguments into one fragment.
///
/// `parts` must hold exactly one more element than `args`.
pub fn compose<S: AsRef<str>>(parts: &[S], args: Vec<Arg>) -> Result<Fragment> {
    if parts.len() != args.len() + 1 {
        return Err(Error::TemplateArity {
            parts: parts.len(),
            args: args.len(),
        });
    }

    let mut out = Fragment::empty();
    for (part, arg) in parts.iter().zip(args) {
        out.push(part.as_ref());
        push_arg(&mut out, arg)?;
    }
    if let Some(last) = parts.last() {
        out.push(last.as_ref());
    }
    Ok(out)
}

fn push_arg(out: &mut Fragment, arg: Arg) -> Result<()> {
    match arg {
        Arg::Fragment(f) => {
            out.push_fragment(f);
        }
        Arg::List(items) if matches!(items.first(), Some(Arg::Fragment(_))) => {
            for (i, item) in items.into_iter().enumerate() {
                match item {
                    Arg::Fragment(f) => {
                        out.push_fragment(f);
                    }
                    other => {
                        return Err(Error::type_mismatch(format!(
                            "fragment list element {i} is a {}",
                            other.kind()
                        )));
                    }
                }
            }
        }
        other => {
            out.push_value(other.into_value()?);
        }
    }
    Ok(())
}
