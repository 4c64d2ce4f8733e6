// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unstructured values: primitives, ordered sequences, key-ordered mappings.
//!
//! This is the only shape the engine ever accepts from a decoder or hands
//! to an encoder. It carries no type information of its own; the target
//! type is always supplied at the call site.

use std::collections::BTreeMap;

/// An unstructured value as produced by a wire-format decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Char(char),
    Str(String),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as char.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as sequence.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as mapping.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Mapping keys, in key order (empty for non-mappings).
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Map(m) => m.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Short shape name for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I64(_) => "int",
            Self::U64(_) => "uint",
            Self::F64(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
        }
    }

    /// Build a mapping from key/value pairs.
    pub fn map_of(pairs: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I64(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U64(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F64(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Self::Map(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_values() {
        let v = Value::from(42i64);
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_u64(), None);

        let v = Value::from("hello");
        assert_eq!(v.as_str(), Some("hello"));
        assert_eq!(v.shape(), "string");
    }

    #[test]
    fn test_seq_value() {
        let v = Value::from(vec![1i64, 2, 3]);
        let seq = v.as_seq().expect("sequence");
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[2].as_i64(), Some(3));
    }

    #[test]
    fn test_map_keys_ordered() {
        let v = Value::map_of([("b", Value::from(2i64)), ("a", Value::from(1i64))]);
        assert_eq!(v.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            v.as_map().and_then(|m| m.get("b")).and_then(Value::as_i64),
            Some(2)
        );
    }

    #[test]
    fn test_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(false).is_null());
    }
}
