// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Converter facade.
//!
//! One converter owns one registry, one named-type table, and one hook
//! cache. Conversions take a read lock on the registry and a snapshot of
//! the cache; registrations take the write lock, mutate, and invalidate
//! the cache wholesale. A conversion overlapping a registration completes
//! against whichever state it captured, never a mixture.

use crate::cache::HookCache;
use crate::descriptor::TypeDescriptor;
use crate::error::ConvertError;
use crate::key::{normalize, TypeKey};
use crate::registry::{
    Direction, Hook, HookRegistry, Registered, TypeTable,
};
use crate::resolve::{render_runtime_map_key, HookResolver};
use crate::structured::Structured;
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Bidirectional conversion engine.
pub struct Converter {
    types: TypeTable,
    registry: RwLock<HookRegistry>,
    cache: HookCache,
}

impl Converter {
    /// Create a converter with empty registry and type table.
    pub fn new() -> Self {
        Self {
            types: TypeTable::new(),
            registry: RwLock::new(HookRegistry::new()),
            cache: HookCache::new(),
        }
    }

    /// Register a named type descriptor up front, making it available to
    /// `Named` references before any conversion mentions it inline.
    pub fn register_type(&self, desc: &TypeDescriptor) -> Result<(), ConvertError> {
        self.types.record(desc)?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Convert an unstructured value into a structured one.
    pub fn structure(
        &self,
        raw: &Value,
        desc: &TypeDescriptor,
    ) -> Result<Structured, ConvertError> {
        let registry = self.registry.read();
        let snapshot = self.cache.load();
        let key = normalize(desc, &self.types)?;
        let resolver = HookResolver::new(&registry, &self.types, &snapshot);
        let hook = resolver.resolve(Direction::Structure, &key)?;
        drop(registry);
        hook.apply_structure(raw)
    }

    /// Convert a structured value into an unstructured one, treating it
    /// as the given descriptor.
    pub fn unstructure_as(
        &self,
        value: &Structured,
        desc: &TypeDescriptor,
    ) -> Result<Value, ConvertError> {
        let registry = self.registry.read();
        let snapshot = self.cache.load();
        let key = normalize(desc, &self.types)?;
        let resolver = HookResolver::new(&registry, &self.types, &snapshot);
        let hook = resolver.resolve(Direction::Unstructure, &key)?;
        drop(registry);
        hook.apply_unstructure(value)
    }

    /// Convert a structured value into an unstructured one, dispatching
    /// on the value's own runtime shape. Aggregates and enumerations
    /// dispatch on their carried type name, which must be registered (or
    /// covered by a registered hook predicate).
    pub fn unstructure(&self, value: &Structured) -> Result<Value, ConvertError> {
        let registry = self.registry.read();
        let snapshot = self.cache.load();
        let resolver = HookResolver::new(&registry, &self.types, &snapshot);
        self.unstructure_runtime(value, &resolver)
    }

    fn unstructure_runtime(
        &self,
        value: &Structured,
        resolver: &HookResolver<'_>,
    ) -> Result<Value, ConvertError> {
        match value {
            Structured::Bool(b) => Ok(Value::Bool(*b)),
            Structured::I64(i) => Ok(Value::I64(*i)),
            Structured::U64(u) => Ok(Value::U64(*u)),
            Structured::F64(x) => Ok(Value::F64(*x)),
            Structured::Char(c) => Ok(Value::Char(*c)),
            Structured::Str(s) => Ok(Value::Str(s.clone())),
            Structured::List(items) | Structured::Set(items) | Structured::Tuple(items) => {
                let out = items
                    .iter()
                    .map(|item| self.unstructure_runtime(item, resolver))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Seq(out))
            }
            Structured::Map(pairs) => {
                let mut out = BTreeMap::new();
                for (k, v) in pairs {
                    out.insert(
                        render_runtime_map_key(k)?,
                        self.unstructure_runtime(v, resolver)?,
                    );
                }
                Ok(Value::Map(out))
            }
            Structured::Optional(None) => Ok(Value::Null),
            Structured::Optional(Some(inner)) => self.unstructure_runtime(inner, resolver),
            Structured::Enum { type_name, .. } => {
                let key = TypeKey::Enum(self.types.intern(type_name));
                let hook = resolver.resolve(Direction::Unstructure, &key)?;
                hook.apply_unstructure(value)
            }
            Structured::Struct { type_name, .. } => {
                let key = TypeKey::Aggregate(self.types.intern(type_name));
                let hook = resolver.resolve(Direction::Unstructure, &key)?;
                hook.apply_unstructure(value)
            }
        }
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    /// Register a structure hook behind a key predicate. The most
    /// recently registered matching hook wins.
    pub fn register_structure_hook(
        &self,
        predicate: impl Fn(&TypeKey) -> bool + Send + Sync + 'static,
        hook: impl Fn(&Value) -> Result<Structured, ConvertError> + Send + Sync + 'static,
    ) {
        self.register(
            Direction::Structure,
            Arc::new(predicate),
            Registered::Hook(Hook::structure(hook)),
        );
    }

    /// Register a structure hook for one exact type.
    pub fn register_structure_hook_for(
        &self,
        desc: &TypeDescriptor,
        hook: impl Fn(&Value) -> Result<Structured, ConvertError> + Send + Sync + 'static,
    ) -> Result<(), ConvertError> {
        let key = normalize(desc, &self.types)?;
        self.register(
            Direction::Structure,
            Arc::new(move |k: &TypeKey| *k == key),
            Registered::Hook(Hook::structure(hook)),
        );
        Ok(())
    }

    /// Register a structure hook factory behind a key predicate. The
    /// factory runs once per matching key; its product is cached.
    pub fn register_structure_factory(
        &self,
        predicate: impl Fn(&TypeKey) -> bool + Send + Sync + 'static,
        factory: impl for<'a> Fn(&TypeKey, &HookResolver<'a>) -> Result<Hook, ConvertError>
            + Send
            + Sync
            + 'static,
    ) {
        self.register(
            Direction::Structure,
            Arc::new(predicate),
            Registered::Factory(Arc::new(factory)),
        );
    }

    /// Register an unstructure hook behind a key predicate.
    pub fn register_unstructure_hook(
        &self,
        predicate: impl Fn(&TypeKey) -> bool + Send + Sync + 'static,
        hook: impl Fn(&Structured) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) {
        self.register(
            Direction::Unstructure,
            Arc::new(predicate),
            Registered::Hook(Hook::unstructure(hook)),
        );
    }

    /// Register an unstructure hook for one exact type.
    pub fn register_unstructure_hook_for(
        &self,
        desc: &TypeDescriptor,
        hook: impl Fn(&Structured) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) -> Result<(), ConvertError> {
        let key = normalize(desc, &self.types)?;
        self.register(
            Direction::Unstructure,
            Arc::new(move |k: &TypeKey| *k == key),
            Registered::Hook(Hook::unstructure(hook)),
        );
        Ok(())
    }

    /// Register an unstructure hook factory behind a key predicate.
    pub fn register_unstructure_factory(
        &self,
        predicate: impl Fn(&TypeKey) -> bool + Send + Sync + 'static,
        factory: impl for<'a> Fn(&TypeKey, &HookResolver<'a>) -> Result<Hook, ConvertError>
            + Send
            + Sync
            + 'static,
    ) {
        self.register(
            Direction::Unstructure,
            Arc::new(predicate),
            Registered::Factory(Arc::new(factory)),
        );
    }

    /// Install an explicit discriminator for a union type. Overrides
    /// automatic fingerprint disambiguation for that union.
    pub fn register_union_discriminator(
        &self,
        desc: &TypeDescriptor,
        f: impl Fn(&Value, &[TypeKey]) -> Result<TypeKey, ConvertError> + Send + Sync + 'static,
    ) -> Result<(), ConvertError> {
        let key = normalize(desc, &self.types)?;
        if !matches!(key, TypeKey::Union(_)) {
            return Err(ConvertError::UnsupportedType {
                type_name: key.to_string(),
                reason: "discriminators apply to union types only".into(),
            });
        }
        let mut registry = self.registry.write();
        registry.set_discriminator(key, Arc::new(f));
        self.cache.invalidate_all();
        Ok(())
    }

    /// Install a construction invariant for a named aggregate. Runs after
    /// every field of the aggregate structures successfully.
    pub fn register_validator(
        &self,
        aggregate: impl Into<String>,
        f: impl Fn(&Structured) -> Result<(), String> + Send + Sync + 'static,
    ) {
        let mut registry = self.registry.write();
        registry.set_validator(aggregate, Arc::new(f));
        self.cache.invalidate_all();
    }

    fn register(
        &self,
        direction: Direction,
        predicate: crate::registry::Predicate,
        entry: Registered,
    ) {
        let mut registry = self.registry.write();
        registry.register(direction, predicate, entry);
        // Invalidation happens under the write lock so readers that enter
        // afterwards always pair the new registry with a fresh cache.
        self.cache.invalidate_all();
    }

    /// Number of completed cache invalidations.
    pub fn cache_generation(&self) -> u64 {
        self.cache.generation()
    }

    /// Table of registered named types.
    pub fn types(&self) -> &TypeTable {
        &self.types
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}
