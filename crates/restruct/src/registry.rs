// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hook registry and named-type table.
//!
//! The registry holds one ordered list of (predicate, hook-or-factory)
//! pairs per direction. Registration prepends, so the most recently
//! registered entry has the highest priority; overlapping predicates are
//! resolved by recency, never by specificity. This ordering is the
//! documented override contract.

use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::error::ConvertError;
use crate::key::TypeKey;
use crate::resolve::HookResolver;
use crate::structured::Structured;
use crate::value::Value;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Structure,
    Unstructure,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Unstructure => "unstructure",
        }
    }
}

/// A compiled structure hook.
pub type StructureFn = dyn Fn(&Value) -> Result<Structured, ConvertError> + Send + Sync;
/// A compiled unstructure hook.
pub type UnstructureFn = dyn Fn(&Structured) -> Result<Value, ConvertError> + Send + Sync;

/// A resolved, type-specific conversion function for one direction.
///
/// Hooks are pure: no shared mutable state across invocations besides the
/// cache that holds them.
#[derive(Clone)]
pub enum Hook {
    Structure(Arc<StructureFn>),
    Unstructure(Arc<UnstructureFn>),
}

impl Hook {
    /// Wrap a structure closure.
    pub fn structure(
        f: impl Fn(&Value) -> Result<Structured, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        Self::Structure(Arc::new(f))
    }

    /// Wrap an unstructure closure.
    pub fn unstructure(
        f: impl Fn(&Structured) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        Self::Unstructure(Arc::new(f))
    }

    /// Apply as a structure hook.
    pub fn apply_structure(&self, raw: &Value) -> Result<Structured, ConvertError> {
        match self {
            Self::Structure(f) => f(raw),
            Self::Unstructure(_) => Err(ConvertError::UnsupportedType {
                type_name: "<hook>".into(),
                reason: "hook registered for the opposite direction".into(),
            }),
        }
    }

    /// Apply as an unstructure hook.
    pub fn apply_unstructure(&self, value: &Structured) -> Result<Value, ConvertError> {
        match self {
            Self::Unstructure(f) => f(value),
            Self::Structure(_) => Err(ConvertError::UnsupportedType {
                type_name: "<hook>".into(),
                reason: "hook registered for the opposite direction".into(),
            }),
        }
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structure(_) => f.write_str("Hook::Structure"),
            Self::Unstructure(_) => f.write_str("Hook::Unstructure"),
        }
    }
}

/// A hook factory: invoked lazily with the concrete type key to produce a
/// specialized hook. The resolver handle is for sub-component resolution
/// only (e.g. a container factory resolving its element hook), never for
/// the factory's own key.
pub type FactoryFn =
    dyn for<'a> Fn(&TypeKey, &HookResolver<'a>) -> Result<Hook, ConvertError> + Send + Sync;

/// A registered entry: either a ready hook or a hook factory.
#[derive(Clone)]
pub enum Registered {
    Hook(Hook),
    Factory(Arc<FactoryFn>),
}

/// A boolean test over a type key.
pub type Predicate = Arc<dyn Fn(&TypeKey) -> bool + Send + Sync>;

/// Explicit union discriminator: receives the raw value and the union's
/// member keys in declared order, returns exactly one member key.
pub type DiscriminatorFn =
    Arc<dyn Fn(&Value, &[TypeKey]) -> Result<TypeKey, ConvertError> + Send + Sync>;

/// Aggregate construction invariant; rejection message becomes an
/// `AggregateConstruction` error.
pub type ValidatorFn = Arc<dyn Fn(&Structured) -> Result<(), String> + Send + Sync>;

/// Ordered hook registry, owned by exactly one converter.
pub struct HookRegistry {
    structure: Vec<(Predicate, Registered)>,
    unstructure: Vec<(Predicate, Registered)>,
    discriminators: HashMap<TypeKey, DiscriminatorFn>,
    validators: HashMap<String, ValidatorFn>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            structure: Vec::new(),
            unstructure: Vec::new(),
            discriminators: HashMap::new(),
            validators: HashMap::new(),
        }
    }

    /// Register a hook or factory for one direction. Most recent wins.
    pub fn register(&mut self, direction: Direction, predicate: Predicate, entry: Registered) {
        log::debug!("registering {} hook (priority 0)", direction.as_str());
        self.list_mut(direction).insert(0, (predicate, entry));
    }

    /// First registered entry whose predicate accepts the key, scanning
    /// most-recently-registered first.
    pub fn find(&self, direction: Direction, key: &TypeKey) -> Option<&Registered> {
        self.list(direction)
            .iter()
            .find(|(pred, _)| pred(key))
            .map(|(_, entry)| entry)
    }

    /// Install an explicit discriminator for one exact union key.
    pub fn set_discriminator(&mut self, key: TypeKey, f: DiscriminatorFn) {
        self.discriminators.insert(key, f);
    }

    /// Explicit discriminator for a union key, if any.
    pub fn discriminator(&self, key: &TypeKey) -> Option<&DiscriminatorFn> {
        self.discriminators.get(key)
    }

    /// Install a construction invariant for a named aggregate.
    pub fn set_validator(&mut self, aggregate: impl Into<String>, f: ValidatorFn) {
        self.validators.insert(aggregate.into(), f);
    }

    /// Construction invariant for a named aggregate, if any.
    pub fn validator(&self, aggregate: &str) -> Option<&ValidatorFn> {
        self.validators.get(aggregate)
    }

    fn list(&self, direction: Direction) -> &[(Predicate, Registered)] {
        match direction {
            Direction::Structure => &self.structure,
            Direction::Unstructure => &self.unstructure,
        }
    }

    fn list_mut(&mut self, direction: Direction) -> &mut Vec<(Predicate, Registered)> {
        match direction {
            Direction::Structure => &mut self.structure,
            Direction::Unstructure => &mut self.unstructure,
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TypeTable
// ---------------------------------------------------------------------------

/// Table of registered named type descriptors.
///
/// Descriptors are recorded once, on first sight, and immutable afterwards.
/// `Named` references resolve through this table, which is what makes
/// recursive and forward-referencing aggregates work regardless of
/// declaration order.
pub struct TypeTable {
    types: DashMap<Arc<str>, Arc<TypeDescriptor>>,
}

impl TypeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Record a named descriptor (insert-if-absent). Re-recording an
    /// identical descriptor is a no-op; a conflicting redefinition fails.
    pub fn record(&self, desc: &TypeDescriptor) -> Result<Arc<str>, ConvertError> {
        if desc.name.is_empty() {
            return Err(ConvertError::UnsupportedType {
                type_name: "<anonymous>".into(),
                reason: "named types require a non-empty name".into(),
            });
        }
        if matches!(desc.kind, TypeKind::Named(_) | TypeKind::Var(_)) {
            return Err(ConvertError::UnsupportedType {
                type_name: desc.name.clone(),
                reason: "references and type variables cannot be registered".into(),
            });
        }
        let name: Arc<str> = Arc::from(desc.name.as_str());
        match self.types.entry(name.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().as_ref() != desc {
                    return Err(ConvertError::UnsupportedType {
                        type_name: desc.name.clone(),
                        reason: "conflicting redefinition of a registered type".into(),
                    });
                }
                Ok(existing.key().clone())
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(desc.clone()));
                Ok(name)
            }
        }
    }

    /// Look up a registered descriptor by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Interned name handle for a registered type.
    pub fn intern(&self, name: &str) -> Arc<str> {
        match self.types.get(name) {
            Some(entry) => entry.key().clone(),
            None => Arc::from(name),
        }
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
