// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured values: aggregate instances, enumerations, and typed
//! containers thereof.
//!
//! A [`Structured`] value carries the name of its own concrete type where
//! one exists (aggregates and enumerations), so unstructuring without an
//! explicit descriptor can dispatch on the runtime type, and so union
//! unstructuring never needs disambiguation.

use std::collections::HashMap;
use std::sync::Arc;

/// A structured value.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    // Primitives
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Char(char),
    Str(String),

    // Containers
    List(Vec<Structured>),
    Set(Vec<Structured>),
    Tuple(Vec<Structured>),
    Map(Vec<(Structured, Structured)>),
    Optional(Option<Box<Structured>>),

    // Named types
    Enum {
        type_name: Arc<str>,
        variant: String,
        value: i64,
    },
    Struct {
        type_name: Arc<str>,
        fields: HashMap<String, Structured>,
    },
}

impl Structured {
    /// An empty optional.
    pub fn none() -> Self {
        Self::Optional(None)
    }

    /// A filled optional.
    pub fn some(v: Structured) -> Self {
        Self::Optional(Some(Box::new(v)))
    }

    /// Build an aggregate instance from field name/value pairs.
    pub fn struct_of(
        type_name: impl Into<Arc<str>>,
        fields: impl IntoIterator<Item = (impl Into<String>, Structured)>,
    ) -> Self {
        Self::Struct {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build an enumeration value.
    pub fn enum_of(type_name: impl Into<Arc<str>>, variant: impl Into<String>, value: i64) -> Self {
        Self::Enum {
            type_name: type_name.into(),
            variant: variant.into(),
            value,
        }
    }

    /// Concrete runtime type name, if the value carries one.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Enum { type_name, .. } | Self::Struct { type_name, .. } => Some(type_name),
            _ => None,
        }
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

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get list/set/tuple elements.
    pub fn as_elements(&self) -> Option<&[Structured]> {
        match self {
            Self::List(v) | Self::Set(v) | Self::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get aggregate field by name.
    pub fn get_field(&self, name: &str) -> Option<&Structured> {
        match self {
            Self::Struct { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Set aggregate field. Returns false for non-aggregates.
    pub fn set_field(&mut self, name: impl Into<String>, value: Structured) -> bool {
        match self {
            Self::Struct { fields, .. } => {
                fields.insert(name.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Enum variant name.
    pub fn enum_variant(&self) -> Option<&str> {
        match self {
            Self::Enum { variant, .. } => Some(variant),
            _ => None,
        }
    }

    /// Short shape name for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I64(_) => "int",
            Self::U64(_) => "uint",
            Self::F64(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Optional(_) => "optional",
            Self::Enum { .. } => "enum",
            Self::Struct { .. } => "struct",
        }
    }
}

// Conversion traits
impl From<bool> for Structured {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Structured {
    fn from(v: i32) -> Self {
        Self::I64(i64::from(v))
    }
}

impl From<i64> for Structured {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for Structured {
    fn from(v: u32) -> Self {
        Self::U64(u64::from(v))
    }
}

impl From<u64> for Structured {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f64> for Structured {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<char> for Structured {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<String> for Structured {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Structured {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<T: Into<Structured>> From<Vec<T>> for Structured {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_value() {
        let mut v = Structured::struct_of("Point", [("x", 10i64.into())]);
        v.set_field("y", 20i64.into());

        assert_eq!(v.type_name(), Some("Point"));
        assert_eq!(v.get_field("x").and_then(Structured::as_i64), Some(10));
        assert_eq!(v.get_field("y").and_then(Structured::as_i64), Some(20));
        assert!(v.get_field("z").is_none());
    }

    #[test]
    fn test_struct_equality_ignores_insertion_order() {
        let a = Structured::struct_of("P", [("x", 1i64.into()), ("y", 2i64.into())]);
        let b = Structured::struct_of("P", [("y", 2i64.into()), ("x", 1i64.into())]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_optional() {
        assert_eq!(Structured::none(), Structured::Optional(None));
        let s = Structured::some(5i64.into());
        assert_eq!(s.shape(), "optional");
    }

    #[test]
    fn test_enum_value() {
        let v = Structured::enum_of("Color", "GREEN", 1);
        assert_eq!(v.enum_variant(), Some("GREEN"));
        assert_eq!(v.type_name(), Some("Color"));
    }

    #[test]
    fn test_list_from_vec() {
        let v = Structured::from(vec![1i64, 2, 3]);
        assert_eq!(v.as_elements().map(<[Structured]>::len), Some(3));
    }
}
