// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for TypeDescriptor.

use crate::descriptor::{
    EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind,
};
use crate::structured::Structured;
use std::sync::Arc;

/// Builder for creating aggregate TypeDescriptor instances.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    /// Create a new builder for a struct type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a primitive field.
    pub fn field(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let type_desc = Arc::new(TypeDescriptor::primitive(kind));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a field with a type descriptor.
    pub fn field_with_type(
        mut self,
        name: impl Into<String>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a fully configured field descriptor.
    pub fn field_desc(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::Str)
    }

    /// Add a primitive field with a default value.
    pub fn defaulted_field(
        mut self,
        name: impl Into<String>,
        kind: PrimitiveKind,
        default: Structured,
    ) -> Self {
        let type_desc = Arc::new(TypeDescriptor::primitive(kind));
        self.fields
            .push(FieldDescriptor::new(name, type_desc).with_default(default));
        self
    }

    /// Add an optional field of the given element type.
    pub fn optional_field(mut self, name: impl Into<String>, inner: Arc<TypeDescriptor>) -> Self {
        let type_desc = Arc::new(TypeDescriptor::optional_of(inner));
        self.fields.push(
            FieldDescriptor::new(name, type_desc).with_default(Structured::none()),
        );
        self
    }

    /// Add a list field.
    pub fn list_field(mut self, name: impl Into<String>, elem: Arc<TypeDescriptor>) -> Self {
        let type_desc = Arc::new(TypeDescriptor::list_of(elem));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a field referencing a registered named type.
    pub fn named_field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_desc = Arc::new(TypeDescriptor::named(type_name));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add an optional field referencing a registered named type.
    /// This is the shape recursive aggregates use for self-references.
    pub fn optional_named_field(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.optional_field(name, Arc::new(TypeDescriptor::named(type_name)))
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::struct_type(self.name, self.fields)
    }
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    variants: Vec<EnumVariant>,
    next_value: i64,
}

impl EnumBuilder {
    /// Create a new enum builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            next_value: 0,
        }
    }

    /// Add a variant with auto-incrementing value.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(EnumVariant::new(name, self.next_value));
        self.next_value += 1;
        self
    }

    /// Add a variant with explicit value.
    pub fn variant_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self.next_value = value + 1;
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(self.name, TypeKind::Enum(EnumDescriptor::new(self.variants)))
    }
}

/// Builder for undiscriminated union types.
#[derive(Debug)]
pub struct UnionBuilder {
    members: Vec<Arc<TypeDescriptor>>,
}

impl UnionBuilder {
    /// Create a new union builder.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add a member type.
    pub fn member(mut self, member: Arc<TypeDescriptor>) -> Self {
        self.members.push(member);
        self
    }

    /// Add a member referencing a registered named type.
    pub fn named_member(mut self, type_name: impl Into<String>) -> Self {
        self.members.push(Arc::new(TypeDescriptor::named(type_name)));
        self
    }

    /// Build the TypeDescriptor. Member declaration order is retained for
    /// disambiguation tie-breaking.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::union_of(self.members)
    }
}

impl Default for UnionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
