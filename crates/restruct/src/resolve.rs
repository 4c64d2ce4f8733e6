// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch resolver and built-in structural rules.
//!
//! Resolution order: the registry's predicate list (most recently
//! registered first), then the built-in rule table keyed by the type key's
//! shape. Every valid key shape has a built-in fallback, so resolution is
//! total over valid keys.
//!
//! A key whose resolution is already in progress on the current thread's
//! stack yields a forward-reference proxy that defers to the eventual
//! cache slot at call time. This is what makes self-referential and
//! mutually recursive aggregates resolve in bounded depth.

use crate::cache::{CacheSnapshot, HookSlot};
use crate::descriptor::{PrimitiveKind, TypeKind};
use crate::error::ConvertError;
use crate::key::{SeqForm, TypeKey};
use crate::registry::{Direction, Hook, HookRegistry, Registered, TypeTable};
use crate::structured::Structured;
use crate::value::Value;
use crate::{plan, union};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

thread_local! {
    /// Keys whose resolution is in progress on this thread.
    static IN_PROGRESS: RefCell<Vec<(Direction, TypeKey)>> = const { RefCell::new(Vec::new()) };
}

/// Resolver handle: one registry + type table + cache snapshot.
///
/// Handed to hook factories so they can resolve sub-component hooks; the
/// factory's own key is never re-entered through this handle.
pub struct HookResolver<'a> {
    registry: &'a HookRegistry,
    types: &'a TypeTable,
    cache: &'a CacheSnapshot,
}

impl<'a> HookResolver<'a> {
    pub(crate) fn new(
        registry: &'a HookRegistry,
        types: &'a TypeTable,
        cache: &'a CacheSnapshot,
    ) -> Self {
        Self {
            registry,
            types,
            cache,
        }
    }

    /// The named-type table backing `Named` references.
    pub fn types(&self) -> &TypeTable {
        self.types
    }

    pub(crate) fn registry(&self) -> &HookRegistry {
        self.registry
    }

    pub(crate) fn cache(&self) -> &CacheSnapshot {
        self.cache
    }

    /// Return the memoized hook for (direction, key), resolving on miss.
    pub fn resolve(&self, direction: Direction, key: &TypeKey) -> Result<Hook, ConvertError> {
        let slot = self
            .cache
            .hooks
            .entry((direction, key.clone()))
            .or_insert_with(|| Arc::new(HookSlot::new()))
            .clone();

        if let Some(hook) = slot.get() {
            return Ok(hook.clone());
        }

        let in_progress = IN_PROGRESS.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|(d, k)| *d == direction && k == key)
        });
        if in_progress {
            return Ok(forward_proxy(direction, key, slot));
        }

        IN_PROGRESS.with(|stack| stack.borrow_mut().push((direction, key.clone())));
        let resolved = self.resolve_uncached(direction, key);
        IN_PROGRESS.with(|stack| {
            stack.borrow_mut().pop();
        });

        let hook = resolved?;
        slot.fill(hook);
        log::trace!("resolved {} hook for {}", direction.as_str(), key);
        // Return the slot's hook so every caller (including forward
        // proxies taken during this resolution) shares one compiled hook.
        match slot.get() {
            Some(hook) => Ok(hook.clone()),
            None => Err(ConvertError::NoHookFound {
                direction: direction.as_str(),
                key: key.to_string(),
            }),
        }
    }

    /// Registry scan, then built-in fallback.
    fn resolve_uncached(&self, direction: Direction, key: &TypeKey) -> Result<Hook, ConvertError> {
        match self.registry.find(direction, key) {
            Some(Registered::Hook(hook)) => Ok(hook.clone()),
            Some(Registered::Factory(factory)) => factory(key, self),
            None => self.builtin(direction, key),
        }
    }

    /// Built-in structural rule table, keyed by the key's shape.
    fn builtin(&self, direction: Direction, key: &TypeKey) -> Result<Hook, ConvertError> {
        match key {
            TypeKey::Primitive(kind) => Ok(primitive_hook(direction, *kind)),
            TypeKey::Optional(inner) => {
                let inner_hook = self.resolve(direction, inner)?;
                Ok(optional_hook(direction, inner_hook))
            }
            TypeKey::Seq { elem, form } => {
                let elem_hook = self.resolve(direction, elem)?;
                Ok(seq_hook(direction, elem_hook, *form))
            }
            TypeKey::Tuple(elems) => {
                let hooks = elems
                    .iter()
                    .map(|e| self.resolve(direction, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(tuple_hook(direction, hooks))
            }
            TypeKey::Map(k, v) => {
                let key_kind = mapping_key_kind(k)?;
                let value_hook = self.resolve(direction, v)?;
                Ok(map_hook(direction, key_kind, value_hook))
            }
            TypeKey::Enum(name) => enum_hook(self, direction, name),
            TypeKey::Aggregate(name) => plan::compile(self, direction, name),
            TypeKey::Union(u) => union::compile(self, direction, key, u),
        }
    }
}

/// Proxy hook deferring to the eventual cache slot at call time.
fn forward_proxy(direction: Direction, key: &TypeKey, slot: Arc<HookSlot>) -> Hook {
    let key_text = key.to_string();
    match direction {
        Direction::Structure => Hook::structure(move |raw| match slot.get() {
            Some(hook) => hook.apply_structure(raw),
            None => Err(ConvertError::NoHookFound {
                direction: "structure",
                key: key_text.clone(),
            }),
        }),
        Direction::Unstructure => Hook::unstructure(move |value| match slot.get() {
            Some(hook) => hook.apply_unstructure(value),
            None => Err(ConvertError::NoHookFound {
                direction: "unstructure",
                key: key_text.clone(),
            }),
        }),
    }
}

// ---------------------------------------------------------------------------
// Built-in rules: primitives
// ---------------------------------------------------------------------------

fn coercion(expected: impl Into<String>, got: &str) -> ConvertError {
    ConvertError::Coercion {
        expected: expected.into(),
        got: got.to_string(),
    }
}

fn primitive_hook(direction: Direction, kind: PrimitiveKind) -> Hook {
    match direction {
        Direction::Structure => Hook::structure(move |raw| structure_primitive(kind, raw)),
        Direction::Unstructure => Hook::unstructure(move |value| unstructure_primitive(kind, value)),
    }
}

pub(crate) fn structure_primitive(
    kind: PrimitiveKind,
    raw: &Value,
) -> Result<Structured, ConvertError> {
    match kind {
        PrimitiveKind::Bool => raw
            .as_bool()
            .map(Structured::Bool)
            .ok_or_else(|| coercion(kind.name(), raw.shape())),
        k if k.is_signed() => {
            let v = match raw {
                Value::I64(i) => *i,
                Value::U64(u) => {
                    i64::try_from(*u).map_err(|_| coercion(k.name(), "out-of-range uint"))?
                }
                other => return Err(coercion(k.name(), other.shape())),
            };
            let (min, max) = k.signed_range().unwrap_or((i64::MIN, i64::MAX));
            if v < min || v > max {
                return Err(coercion(k.name(), "out-of-range int"));
            }
            Ok(Structured::I64(v))
        }
        k if k.is_unsigned() => {
            let v = match raw {
                Value::U64(u) => *u,
                Value::I64(i) if *i >= 0 => *i as u64,
                Value::I64(_) => return Err(coercion(k.name(), "negative int")),
                other => return Err(coercion(k.name(), other.shape())),
            };
            let max = k.unsigned_max().unwrap_or(u64::MAX);
            if v > max {
                return Err(coercion(k.name(), "out-of-range uint"));
            }
            Ok(Structured::U64(v))
        }
        PrimitiveKind::F32 | PrimitiveKind::F64 => {
            let v = match raw {
                Value::F64(x) => *x,
                Value::I64(i) => *i as f64,
                Value::U64(u) => *u as f64,
                other => return Err(coercion(kind.name(), other.shape())),
            };
            Ok(Structured::F64(v))
        }
        PrimitiveKind::Char => match raw {
            Value::Char(c) => Ok(Structured::Char(*c)),
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Structured::Char(c)),
                    _ => Err(coercion("char", "multi-character string")),
                }
            }
            other => Err(coercion("char", other.shape())),
        },
        PrimitiveKind::Str => raw
            .as_str()
            .map(|s| Structured::Str(s.to_string()))
            .ok_or_else(|| coercion("string", raw.shape())),
        // is_signed / is_unsigned guards above are exhaustive for integers
        _ => Err(coercion(kind.name(), raw.shape())),
    }
}

pub(crate) fn unstructure_primitive(
    kind: PrimitiveKind,
    value: &Structured,
) -> Result<Value, ConvertError> {
    match kind {
        PrimitiveKind::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| coercion(kind.name(), value.shape())),
        k if k.is_signed() => {
            let v = match value {
                Structured::I64(i) => *i,
                Structured::U64(u) => {
                    i64::try_from(*u).map_err(|_| coercion(k.name(), "out-of-range uint"))?
                }
                other => return Err(coercion(k.name(), other.shape())),
            };
            let (min, max) = k.signed_range().unwrap_or((i64::MIN, i64::MAX));
            if v < min || v > max {
                return Err(coercion(k.name(), "out-of-range int"));
            }
            Ok(Value::I64(v))
        }
        k if k.is_unsigned() => {
            let v = match value {
                Structured::U64(u) => *u,
                Structured::I64(i) if *i >= 0 => *i as u64,
                other => return Err(coercion(k.name(), other.shape())),
            };
            let max = k.unsigned_max().unwrap_or(u64::MAX);
            if v > max {
                return Err(coercion(k.name(), "out-of-range uint"));
            }
            Ok(Value::U64(v))
        }
        PrimitiveKind::F32 | PrimitiveKind::F64 => match value {
            Structured::F64(x) => Ok(Value::F64(*x)),
            Structured::I64(i) => Ok(Value::F64(*i as f64)),
            Structured::U64(u) => Ok(Value::F64(*u as f64)),
            other => Err(coercion(kind.name(), other.shape())),
        },
        PrimitiveKind::Char => match value {
            Structured::Char(c) => Ok(Value::Char(*c)),
            other => Err(coercion("char", other.shape())),
        },
        PrimitiveKind::Str => value
            .as_str()
            .map(|s| Value::Str(s.to_string()))
            .ok_or_else(|| coercion("string", value.shape())),
        _ => Err(coercion(kind.name(), value.shape())),
    }
}

// ---------------------------------------------------------------------------
// Built-in rules: containers
// ---------------------------------------------------------------------------

fn optional_hook(direction: Direction, inner: Hook) -> Hook {
    match direction {
        Direction::Structure => Hook::structure(move |raw| match raw {
            Value::Null => Ok(Structured::none()),
            other => Ok(Structured::some(inner.apply_structure(other)?)),
        }),
        Direction::Unstructure => Hook::unstructure(move |value| match value {
            Structured::Optional(None) => Ok(Value::Null),
            Structured::Optional(Some(v)) => inner.apply_unstructure(v),
            // Unstructuring a plain value "as" an optional supertype.
            other => inner.apply_unstructure(other),
        }),
    }
}

fn seq_hook(direction: Direction, elem: Hook, form: SeqForm) -> Hook {
    match direction {
        Direction::Structure => Hook::structure(move |raw| {
            let items = raw
                .as_seq()
                .ok_or_else(|| coercion("sequence", raw.shape()))?;
            let elems = items
                .iter()
                .map(|item| elem.apply_structure(item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match form {
                SeqForm::List => Structured::List(elems),
                SeqForm::Set => Structured::Set(elems),
            })
        }),
        Direction::Unstructure => Hook::unstructure(move |value| {
            let items = match value {
                Structured::List(v) | Structured::Set(v) => v,
                other => return Err(coercion("list or set", other.shape())),
            };
            let out = items
                .iter()
                .map(|item| elem.apply_unstructure(item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Seq(out))
        }),
    }
}

fn tuple_hook(direction: Direction, hooks: Vec<Hook>) -> Hook {
    let arity = hooks.len();
    match direction {
        Direction::Structure => Hook::structure(move |raw| {
            let items = raw
                .as_seq()
                .ok_or_else(|| coercion("sequence", raw.shape()))?;
            if items.len() != arity {
                return Err(coercion(
                    format!("sequence of {}", arity),
                    "wrong-arity sequence",
                ));
            }
            let elems = hooks
                .iter()
                .zip(items)
                .map(|(hook, item)| hook.apply_structure(item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Structured::Tuple(elems))
        }),
        Direction::Unstructure => Hook::unstructure(move |value| {
            let items = match value {
                Structured::Tuple(v) => v,
                other => return Err(coercion("tuple", other.shape())),
            };
            if items.len() != arity {
                return Err(coercion(format!("tuple of {}", arity), "wrong-arity tuple"));
            }
            let out = hooks
                .iter()
                .zip(items)
                .map(|(hook, item)| hook.apply_unstructure(item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Seq(out))
        }),
    }
}

/// Mapping keys travel as strings on the unstructured side, so only
/// string-convertible primitive key types are supported.
fn mapping_key_kind(key: &TypeKey) -> Result<PrimitiveKind, ConvertError> {
    match key {
        TypeKey::Primitive(p) if !matches!(p, PrimitiveKind::F32 | PrimitiveKind::F64) => Ok(*p),
        other => Err(ConvertError::UnsupportedType {
            type_name: other.to_string(),
            reason: "unsupported mapping key type".into(),
        }),
    }
}

fn map_hook(direction: Direction, key_kind: PrimitiveKind, value_hook: Hook) -> Hook {
    match direction {
        Direction::Structure => Hook::structure(move |raw| {
            let map = raw
                .as_map()
                .ok_or_else(|| coercion("mapping", raw.shape()))?;
            let mut pairs = Vec::with_capacity(map.len());
            for (k, v) in map {
                let key = map_key_from_str(key_kind, k)?;
                let value = value_hook.apply_structure(v)?;
                pairs.push((key, value));
            }
            Ok(Structured::Map(pairs))
        }),
        Direction::Unstructure => Hook::unstructure(move |value| {
            let pairs = match value {
                Structured::Map(pairs) => pairs,
                other => return Err(coercion("map", other.shape())),
            };
            let mut out = BTreeMap::new();
            for (k, v) in pairs {
                out.insert(map_key_to_string(key_kind, k)?, value_hook.apply_unstructure(v)?);
            }
            Ok(Value::Map(out))
        }),
    }
}

fn map_key_from_str(kind: PrimitiveKind, raw: &str) -> Result<Structured, ConvertError> {
    match kind {
        PrimitiveKind::Str => Ok(Structured::Str(raw.to_string())),
        PrimitiveKind::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Structured::Char(c)),
                _ => Err(coercion("char key", raw)),
            }
        }
        PrimitiveKind::Bool => match raw {
            "true" => Ok(Structured::Bool(true)),
            "false" => Ok(Structured::Bool(false)),
            _ => Err(coercion("bool key", raw)),
        },
        k if k.is_signed() => {
            let v: i64 = raw.parse().map_err(|_| coercion(k.name(), raw))?;
            structure_primitive(k, &Value::I64(v))
        }
        k if k.is_unsigned() => {
            let v: u64 = raw.parse().map_err(|_| coercion(k.name(), raw))?;
            structure_primitive(k, &Value::U64(v))
        }
        _ => Err(coercion("mapping key", kind.name())),
    }
}

fn map_key_to_string(kind: PrimitiveKind, key: &Structured) -> Result<String, ConvertError> {
    match unstructure_primitive(kind, key)? {
        Value::Str(s) => Ok(s),
        Value::Char(c) => Ok(c.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::I64(i) => Ok(i.to_string()),
        Value::U64(u) => Ok(u.to_string()),
        other => Err(coercion("mapping key", other.shape())),
    }
}

/// Render a structured primitive into a mapping key without a descriptor.
/// Used by descriptor-less unstructuring.
pub(crate) fn render_runtime_map_key(key: &Structured) -> Result<String, ConvertError> {
    match key {
        Structured::Str(s) => Ok(s.clone()),
        Structured::Char(c) => Ok(c.to_string()),
        Structured::Bool(b) => Ok(b.to_string()),
        Structured::I64(i) => Ok(i.to_string()),
        Structured::U64(u) => Ok(u.to_string()),
        other => Err(coercion("mapping key", other.shape())),
    }
}

// ---------------------------------------------------------------------------
// Built-in rules: enums
// ---------------------------------------------------------------------------

/// Enumerations travel as their variant name; variant values are also
/// accepted on input.
fn enum_hook(
    resolver: &HookResolver<'_>,
    direction: Direction,
    name: &Arc<str>,
) -> Result<Hook, ConvertError> {
    let desc = resolver
        .types()
        .lookup(name)
        .ok_or_else(|| ConvertError::UnknownType(name.to_string()))?;
    let TypeKind::Enum(enum_desc) = &desc.kind else {
        return Err(ConvertError::UnsupportedType {
            type_name: name.to_string(),
            reason: "registered type is not an enumeration".into(),
        });
    };
    let enum_desc = enum_desc.clone();
    let type_name = name.clone();

    Ok(match direction {
        Direction::Structure => Hook::structure(move |raw| {
            let variant = match raw {
                Value::Str(s) => enum_desc
                    .variant(s)
                    .ok_or_else(|| coercion(format!("variant of {}", type_name), s))?,
                Value::I64(i) => enum_desc
                    .variant_by_value(*i)
                    .ok_or_else(|| coercion(format!("variant of {}", type_name), "unknown value"))?,
                Value::U64(u) => {
                    let v = i64::try_from(*u)
                        .map_err(|_| coercion(format!("variant of {}", type_name), "uint"))?;
                    enum_desc
                        .variant_by_value(v)
                        .ok_or_else(|| coercion(format!("variant of {}", type_name), "unknown value"))?
                }
                other => return Err(coercion(format!("variant of {}", type_name), other.shape())),
            };
            Ok(Structured::enum_of(
                type_name.clone(),
                variant.name.clone(),
                variant.value,
            ))
        }),
        Direction::Unstructure => Hook::unstructure(move |value| match value {
            Structured::Enum { variant, .. } => {
                if enum_desc.variant(variant).is_none() {
                    return Err(coercion(format!("variant of {}", type_name), variant));
                }
                Ok(Value::Str(variant.clone()))
            }
            other => Err(coercion("enum", other.shape())),
        }),
    })
}
