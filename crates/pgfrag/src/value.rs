//! Bindable values.
//!
//! [`Param`] is a scalar bound to exactly one `$n` placeholder. [`Value`] adds
//! arbitrarily nested arrays on top, which serialize to `ARRAY[...]` syntax
//! instead of a single parameter.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error as StdError;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A scalar bound to one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary-precision integers and decimals.
    Numeric(Decimal),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Bytes),
    Uuid(Uuid),
    Json(serde_json::Value),
}

/// A scalar or an array of values (Postgres `ARRAY` types).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Param(Param),
    Array(Vec<Value>),
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null)
    }
}

impl Value {
    /// SQL `NULL`.
    pub const NULL: Value = Value::Param(Param::Null);

    /// Convert a JSON document structurally: arrays become `Array`, objects
    /// stay JSON parameters, numbers become `Int` when integral. Integers past
    /// `i64::MAX` become `Numeric` rather than losing precision as floats.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Param::Null.into(),
            serde_json::Value::Bool(b) => Param::Bool(*b).into(),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => Param::Int(i).into(),
                (None, Some(u), _) => Param::from(u).into(),
                (None, None, Some(f)) => Param::Float(f).into(),
                (None, None, None) => Param::Text(n.to_string()).into(),
            },
            serde_json::Value::String(s) => Param::Text(s.clone()).into(),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => Param::Json(json.clone()).into(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }
}

// ─── Conversions ────────────────────────────────────────────────────────────

macro_rules! impl_from_scalar {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Param(Param::from(v))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => |v| Param::Bool(v),
    i8 => |v| Param::Int(v.into()),
    i16 => |v| Param::Int(v.into()),
    i32 => |v| Param::Int(v.into()),
    i64 => |v| Param::Int(v),
    u8 => |v| Param::Int(v.into()),
    u16 => |v| Param::Int(v.into()),
    u32 => |v| Param::Int(v.into()),
    u64 => |v| match i64::try_from(v) {
        Ok(i) => Param::Int(i),
        Err(_) => Param::Numeric(Decimal::from(v)),
    },
    i128 => |v| match i64::try_from(v) {
        Ok(i) => Param::Int(i),
        // Past 96 bits only text keeps every digit.
        Err(_) => Decimal::try_from_i128_with_scale(v, 0)
            .map_or_else(|_| Param::Text(v.to_string()), Param::Numeric),
    },
    f32 => |v| Param::Float(v.into()),
    f64 => |v| Param::Float(v),
    Decimal => |v| Param::Numeric(v),
    &str => |v| Param::Text(v.to_string()),
    String => |v| Param::Text(v),
    &String => |v| Param::Text(v.clone()),
    char => |v| Param::Text(v.to_string()),
    DateTime<Utc> => |v| Param::Timestamp(v),
    Bytes => |v| Param::Bytes(v),
    Uuid => |v| Param::Uuid(v),
    serde_json::Value => |v| Param::Json(v),
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

impl From<Param> for Value {
    fn from(v: Param) -> Self {
        Value::Param(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::NULL, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::Array(v.iter().cloned().map(Into::into).collect())
    }
}

// ─── Display (JSON-like, used in error messages) ────────────────────────────

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => f.write_str("null"),
            Param::Bool(v) => write!(f, "{v}"),
            Param::Int(v) => write!(f, "{v}"),
            Param::Float(v) => write!(f, "{v}"),
            Param::Numeric(v) => write!(f, "{v}"),
            Param::Text(v) => write!(f, "{}", serde_json::Value::from(v.as_str())),
            Param::Timestamp(v) => write!(f, "\"{}\"", v.to_rfc3339()),
            Param::Bytes(v) => {
                f.write_str("\"\\\\x")?;
                for b in v.iter() {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("\"")
            }
            Param::Uuid(v) => write!(f, "\"{v}\""),
            Param::Json(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Param(p) => fmt::Display::fmt(p, f),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                f.write_str("]")
            }
        }
    }
}

// ─── Wire binding ───────────────────────────────────────────────────────────

impl ToSql for Param {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            Param::Null => Ok(IsNull::Yes),
            Param::Bool(v) => v.to_sql_checked(ty, out),
            // Integers follow the parameter type the server inferred.
            Param::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Param::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Param::Numeric(v) => v.to_sql_checked(ty, out),
            Param::Text(v) => v.to_sql_checked(ty, out),
            Param::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                Type::DATE => v.date_naive().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Param::Bytes(v) => {
                let bytes: &[u8] = v;
                bytes.to_sql_checked(ty, out)
            }
            Param::Uuid(v) => v.to_sql_checked(ty, out),
            Param::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    // Each variant checks its own inner type in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(None::<i32>), Value::NULL);
        assert_eq!(Param::from(Some("a")), Param::Text("a".into()));
    }

    #[test]
    fn wide_integers_fall_back_to_numeric() {
        assert_eq!(Param::from(7_u64), Param::Int(7));
        assert_eq!(
            Param::from(u64::MAX),
            Param::Numeric(Decimal::from(u64::MAX))
        );
        assert_eq!(Param::from(-3_i128), Param::Int(-3));
        assert_eq!(
            Param::from(i128::from(i64::MIN) - 1),
            Param::Numeric(
                Decimal::try_from_i128_with_scale(i128::from(i64::MIN) - 1, 0).unwrap()
            )
        );
        assert_eq!(
            Param::from(i128::MAX),
            Param::Text(i128::MAX.to_string())
        );
    }

    #[test]
    fn json_integer_past_i64_keeps_precision() {
        assert_eq!(
            Value::from_json(&json!(18446744073709551615u64)),
            Value::from(Param::Numeric(Decimal::from(u64::MAX)))
        );
        assert_eq!(
            Value::from_json(&json!(9223372036854775808u64)),
            Value::from(Param::Numeric(Decimal::from(9223372036854775808u64)))
        );
    }

    #[test]
    fn vec_becomes_nested_array() {
        let v = Value::from(vec![vec![1, 2], vec![3]]);
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Array(vec![1_i64.into(), 2_i64.into()]),
                Value::Array(vec![3_i64.into()]),
            ])
        );
    }

    #[test]
    fn json_numbers_split_int_and_float() {
        assert_eq!(Value::from_json(&json!(2)), Value::from(2_i64));
        assert_eq!(Value::from_json(&json!(2.5)), Value::from(2.5_f64));
        assert_eq!(
            Value::from_json(&json!([1, "a"])),
            Value::Array(vec![1_i64.into(), "a".into()])
        );
        assert_eq!(
            Value::from_json(&json!({"k": 1})),
            Value::Param(Param::Json(json!({"k": 1})))
        );
    }

    #[test]
    fn display_is_json_like() {
        let v = Value::from(vec![Value::from("a\"b"), Value::NULL, Value::from(true)]);
        assert_eq!(v.to_string(), r#"["a\"b",null,true]"#);
        assert_eq!(
            Param::Bytes(Bytes::from_static(&[0xde, 0xad])).to_string(),
            r#""\\xdead""#
        );
    }

    #[test]
    fn int_binds_to_narrower_types() {
        let mut out = BytesMut::new();
        Param::Int(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &7_i32.to_be_bytes());

        let mut out = BytesMut::new();
        assert!(Param::Int(i64::MAX).to_sql(&Type::INT2, &mut out).is_err());
    }

    #[test]
    fn mismatched_inner_type_is_rejected() {
        let mut out = BytesMut::new();
        assert!(
            Param::Bool(true)
                .to_sql_checked(&Type::TEXT, &mut out)
                .is_err()
        );
        let mut out = BytesMut::new();
        assert!(matches!(
            Param::Null.to_sql_checked(&Type::INT4, &mut out),
            Ok(IsNull::Yes)
        ));
    }
}
