//! Keyed rows for the multi-row builders.
//!
//! [`Record`] is the "object" shape: a row that knows its own column names in
//! a stable order and can look up a value by name. Use
//! `#[derive(Record)]` for structs, or pass JSON objects / ordered pairs.

use crate::value::Value;
use std::collections::BTreeMap;

/// A row addressed by column name.
pub trait Record {
    /// Column names this row carries, in natural order.
    fn keys(&self) -> Vec<String>;

    /// Value for `key`, or `None` if the row does not carry that column.
    fn get(&self, key: &str) -> Option<Value>;

    /// Full representation of the row, used in error messages.
    fn describe(&self) -> String {
        let mut out = String::from("{");
        for (i, key) in self.keys().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&serde_json::Value::from(key.as_str()).to_string());
            out.push(':');
            match self.get(key) {
                Some(value) => out.push_str(&value.to_string()),
                None => out.push_str("null"),
            }
        }
        out.push('}');
        out
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }

    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Keys keep insertion order (`serde_json` is built with `preserve_order`).
impl Record for serde_json::Map<String, serde_json::Value> {
    fn keys(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        serde_json::Map::get(self, key).map(Value::from_json)
    }

    fn describe(&self) -> String {
        serde_json::Value::Object(self.clone()).to_string()
    }
}

/// Objects are rows; any other JSON value is a row with no columns.
impl Record for serde_json::Value {
    fn keys(&self) -> Vec<String> {
        match self {
            serde_json::Value::Object(map) => Record::keys(map),
            _ => Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        match self {
            serde_json::Value::Object(map) => Record::get(map, key),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl<V> Record for BTreeMap<String, V>
where
    V: Clone + Into<Value>,
{
    fn keys(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        BTreeMap::get(self, key).cloned().map(Into::into)
    }
}

/// Ordered `(column, value)` pairs; the first pair wins on duplicate names.
impl<K, V> Record for Vec<(K, V)>
where
    K: AsRef<str>,
    V: Clone + Into<Value>,
{
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.len());
        for (k, _) in self {
            if !keys.iter().any(|seen| seen == k.as_ref()) {
                keys.push(k.as_ref().to_string());
            }
        }
        keys
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.clone().into())
    }
}
