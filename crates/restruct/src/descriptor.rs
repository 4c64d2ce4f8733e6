// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.
//!
//! Descriptors are constructed once when a target type is first seen and
//! are immutable thereafter, so they are safe to share across threads.

use crate::structured::Structured;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    Str,
}

impl PrimitiveKind {
    /// Canonical spelling, used in type keys and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::Str => "string",
        }
    }

    /// Whether this kind stores an unsigned integer.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Whether this kind stores a signed integer.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Inclusive signed range for integer kinds (None for non-integers).
    pub fn signed_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::I8 => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            Self::I16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            Self::I32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            Self::I64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Inclusive unsigned upper bound for integer kinds (None for non-integers).
    pub fn unsigned_max(&self) -> Option<u64> {
        match self {
            Self::U8 => Some(u64::from(u8::MAX)),
            Self::U16 => Some(u64::from(u16::MAX)),
            Self::U32 => Some(u64::from(u32::MAX)),
            Self::U64 => Some(u64::MAX),
            _ => None,
        }
    }
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Primitive type.
    Primitive(PrimitiveKind),
    /// Optional wrapper.
    Optional(Arc<TypeDescriptor>),
    /// Ordered sequence producing a list.
    List(Arc<TypeDescriptor>),
    /// Sequence with set semantics.
    Set(Arc<TypeDescriptor>),
    /// Fixed-arity heterogeneous sequence.
    Tuple(Vec<Arc<TypeDescriptor>>),
    /// Mapping from key type to value type.
    Map(Arc<TypeDescriptor>, Arc<TypeDescriptor>),
    /// Aggregate with named fields.
    Struct(Vec<FieldDescriptor>),
    /// Enumeration.
    Enum(EnumDescriptor),
    /// Undiscriminated union of member types, in declaration order.
    Union(Vec<Arc<TypeDescriptor>>),
    /// Reference to a registered named type (enables recursion and
    /// forward references regardless of declaration order).
    Named(String),
    /// Alternate spelling of another type; collapsed by the normalizer.
    Alias(Arc<TypeDescriptor>),
    /// Unresolved generic parameter; normalization fails.
    Var(String),
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Type name (empty for anonymous container types).
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a primitive type descriptor.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(kind.name(), TypeKind::Primitive(kind))
    }

    /// Create a struct type descriptor.
    pub fn struct_type(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, TypeKind::Struct(fields))
    }

    /// Create an optional wrapper.
    pub fn optional_of(inner: Arc<TypeDescriptor>) -> Self {
        Self::new("", TypeKind::Optional(inner))
    }

    /// Create a list descriptor.
    pub fn list_of(elem: Arc<TypeDescriptor>) -> Self {
        Self::new("", TypeKind::List(elem))
    }

    /// Create a set descriptor.
    pub fn set_of(elem: Arc<TypeDescriptor>) -> Self {
        Self::new("", TypeKind::Set(elem))
    }

    /// Create a fixed-arity tuple descriptor.
    pub fn tuple_of(elems: Vec<Arc<TypeDescriptor>>) -> Self {
        Self::new("", TypeKind::Tuple(elems))
    }

    /// Create a mapping descriptor.
    pub fn map_of(key: Arc<TypeDescriptor>, value: Arc<TypeDescriptor>) -> Self {
        Self::new("", TypeKind::Map(key, value))
    }

    /// Create a union descriptor from members in declaration order.
    pub fn union_of(members: Vec<Arc<TypeDescriptor>>) -> Self {
        Self::new("", TypeKind::Union(members))
    }

    /// Create a reference to a registered named type.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: TypeKind::Named(name.clone()),
            name,
        }
    }

    /// Create an alias spelling of another type.
    pub fn alias(name: impl Into<String>, target: Arc<TypeDescriptor>) -> Self {
        Self::new(name, TypeKind::Alias(target))
    }

    /// Create an unresolved generic parameter.
    pub fn var(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: TypeKind::Var(name.clone()),
            name,
        }
    }

    /// Check if this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    /// Check if this is a struct type.
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Get fields if this is a struct.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match &self.kind {
            TypeKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Synthesize a default value for this descriptor, if one exists:
    /// zeroed primitives, empty containers, empty optionals, the first
    /// enum variant, and aggregates whose every field has a default or a
    /// defaultable type. `Named`, `Union`, and `Var` have none.
    pub fn default_value(&self) -> Option<Structured> {
        match &self.kind {
            TypeKind::Primitive(p) => Some(match p {
                PrimitiveKind::Bool => Structured::Bool(false),
                PrimitiveKind::F32 | PrimitiveKind::F64 => Structured::F64(0.0),
                PrimitiveKind::Char => Structured::Char('\0'),
                PrimitiveKind::Str => Structured::Str(String::new()),
                k if k.is_signed() => Structured::I64(0),
                _ => Structured::U64(0),
            }),
            TypeKind::Optional(_) => Some(Structured::none()),
            TypeKind::List(_) => Some(Structured::List(Vec::new())),
            TypeKind::Set(_) => Some(Structured::Set(Vec::new())),
            TypeKind::Map(_, _) => Some(Structured::Map(Vec::new())),
            TypeKind::Tuple(elems) => {
                let defaults = elems
                    .iter()
                    .map(|e| e.default_value())
                    .collect::<Option<Vec<_>>>()?;
                Some(Structured::Tuple(defaults))
            }
            TypeKind::Struct(fields) => {
                let mut out = std::collections::HashMap::with_capacity(fields.len());
                for field in fields {
                    let value = match &field.default {
                        Some(d) => d.clone(),
                        None => field.type_desc.default_value()?,
                    };
                    out.insert(field.name.clone(), value);
                }
                Some(Structured::Struct {
                    type_name: Arc::from(self.name.as_str()),
                    fields: out,
                })
            }
            TypeKind::Enum(e) => {
                let first = e.variants.first()?;
                Some(Structured::enum_of(
                    self.name.as_str(),
                    first.name.clone(),
                    first.value,
                ))
            }
            TypeKind::Alias(target) => target.default_value(),
            TypeKind::Union(_) | TypeKind::Named(_) | TypeKind::Var(_) => None,
        }
    }
}

/// Field descriptor for aggregate members.
///
/// Owned exclusively by its aggregate's descriptor; never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name on the structured side.
    pub name: String,
    /// Field type.
    pub type_desc: Arc<TypeDescriptor>,
    /// Default value used when the unstructured key is absent.
    pub default: Option<Structured>,
    /// Alternate unstructured key.
    pub rename: Option<String>,
    /// Omit the entry when the value equals the declared default.
    /// Opt-in per field, never implicit.
    pub omit_if_default: bool,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            type_desc,
            default: None,
            rename: None,
            omit_if_default: false,
        }
    }

    /// Set default value.
    pub fn with_default(mut self, default: Structured) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the unstructured key this field is written to and read from.
    pub fn renamed(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    /// Omit the entry when unstructuring a value equal to the default.
    pub fn omit_if_default(mut self) -> Self {
        self.omit_if_default = true;
        self
    }

    /// Key used on the unstructured side.
    pub fn wire_key(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// A field is required when it carries no default.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Enumeration type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    /// Enum variants.
    pub variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    /// Create enum descriptor.
    pub fn new(variants: Vec<EnumVariant>) -> Self {
        Self { variants }
    }

    /// Get variant by name.
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Get variant by value.
    pub fn variant_by_value(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

/// Enum variant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    /// Variant name.
    pub name: String,
    /// Variant value.
    pub value: i64,
}

impl EnumVariant {
    /// Create enum variant.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
