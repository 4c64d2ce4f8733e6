// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # restruct - Bidirectional structured/unstructured conversion
//!
//! A runtime conversion engine between structured values (typed
//! aggregates, enumerations, containers) and unstructured values (the
//! primitives/sequences/mappings shape that wire-format decoders produce),
//! driven by runtime type descriptors and a customizable hook registry.
//!
//! ## Quick Start
//!
//! ```rust
//! use restruct::{Converter, PrimitiveKind, TypeDescriptorBuilder, Value};
//!
//! let conv = Converter::new();
//! let point = TypeDescriptorBuilder::new("Point")
//!     .field("x", PrimitiveKind::F64)
//!     .field("y", PrimitiveKind::F64)
//!     .build();
//!
//! let raw = Value::map_of([("x", Value::F64(1.0)), ("y", Value::F64(2.0))]);
//! let value = conv.structure(&raw, &point)?;
//! assert_eq!(conv.unstructure(&value)?, raw);
//! # Ok::<(), restruct::ConvertError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                       Converter facade                       |
//! |   structure / unstructure / register_* (one registry each)   |
//! +--------------------------------------------------------------+
//! |                      Hook resolution                         |
//! |   predicate registry (recency order) | built-in rule table   |
//! |   hook factories | per-(direction, key) memoization cache    |
//! +--------------------------------------------------------------+
//! |                      Type machinery                          |
//! |   descriptors -> canonical type keys | named-type table      |
//! |   aggregate field plans | union fingerprint tables           |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Converter`] | Entry point: owns registry, type table, and cache |
//! | [`TypeDescriptor`] | Runtime description of a target type |
//! | [`Value`] | Unstructured value (decoder output / encoder input) |
//! | [`Structured`] | Structured value (aggregates, enums, containers) |
//! | [`TypeKey`] | Canonical, comparable identity of a descriptor |
//! | [`ConvertError`] | Error taxonomy for both directions |
//!
//! ## Customization
//!
//! Hooks registered on a converter take priority over the built-in rules,
//! most recently registered first. A hook handles one (direction, type)
//! pair; a hook factory produces specialized hooks for a whole family of
//! keys and may resolve sub-component hooks through the resolver handle
//! it is given. Recursive and mutually recursive aggregate types are
//! supported without special casing at the call site.

/// Fluent builders for type descriptors.
pub mod builder;
/// Converter facade tying registry, type table, and cache together.
pub mod converter;
/// Runtime type descriptors.
pub mod descriptor;
/// Error taxonomy.
pub mod error;
/// Canonical type keys and descriptor normalization.
pub mod key;
/// Hook registry and named-type table.
pub mod registry;
/// Hook resolution and built-in structural rules.
pub mod resolve;
/// Structured values.
pub mod structured;
/// Unstructured values.
pub mod value;

mod cache;
mod plan;
mod union;

pub use builder::{EnumBuilder, TypeDescriptorBuilder, UnionBuilder};
pub use converter::Converter;
pub use descriptor::{
    EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind,
};
pub use error::ConvertError;
pub use key::{normalize, SeqForm, TypeKey, UnionKey};
pub use registry::{Direction, Hook, HookRegistry, Registered, TypeTable};
pub use resolve::HookResolver;
pub use structured::Structured;
pub use value::Value;

/// Convenience alias for conversion results.
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests;
