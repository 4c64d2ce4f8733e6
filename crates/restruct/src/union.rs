// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Union disambiguation.
//!
//! Automatic disambiguation works over aggregate members: each member
//! contributes a fingerprint of its required wire keys, and a wire key
//! required by exactly one member is a unique marker for it. Candidates
//! are judged against the *sorted* member set, so unions differing only in
//! declaration order disambiguate identically. Where automatic
//! disambiguation cannot decide, an explicit discriminator registered for
//! the union key takes over; registered discriminators always win.

use crate::descriptor::TypeKind;
use crate::error::ConvertError;
use crate::key::{TypeKey, UnionKey};
use crate::registry::{Direction, Hook};
use crate::resolve::HookResolver;
use crate::value::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Disambiguation table for one union, built once and cached alongside
/// hooks (same invalidation regime).
pub(crate) struct UnionTable {
    entries: Vec<UnionEntry>,
    /// Wire keys required by exactly one member.
    unique: HashMap<String, usize>,
}

struct UnionEntry {
    key: TypeKey,
    /// Required wire keys (fields with no default).
    required: BTreeSet<String>,
}

impl UnionTable {
    /// Build a table from the union's sorted member keys. Every member
    /// must be a registered aggregate.
    pub(crate) fn build(
        resolver: &HookResolver<'_>,
        union: &UnionKey,
    ) -> Result<Self, ConvertError> {
        let mut entries = Vec::with_capacity(union.members().len());
        for member in union.members() {
            let TypeKey::Aggregate(name) = member else {
                return Err(ConvertError::UnsupportedType {
                    type_name: member.to_string(),
                    reason: "automatic union disambiguation requires aggregate members".into(),
                });
            };
            let desc = resolver
                .types()
                .lookup(name)
                .ok_or_else(|| ConvertError::UnknownType(name.to_string()))?;
            let TypeKind::Struct(fields) = &desc.kind else {
                return Err(ConvertError::UnsupportedType {
                    type_name: name.to_string(),
                    reason: "registered type is not an aggregate".into(),
                });
            };
            let required = fields
                .iter()
                .filter(|f| f.is_required())
                .map(|f| f.wire_key().to_string())
                .collect::<BTreeSet<_>>();
            entries.push(UnionEntry {
                key: member.clone(),
                required,
            });
        }

        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for key in &entry.required {
                counts
                    .entry(key)
                    .and_modify(|(n, _)| *n += 1)
                    .or_insert((1, idx));
            }
        }
        let unique = counts
            .into_iter()
            .filter(|(_, (n, _))| *n == 1)
            .map(|(key, (_, idx))| (key.to_string(), idx))
            .collect();

        Ok(Self { entries, unique })
    }

    /// Pick the single member matching the input's key set.
    fn classify(&self, union_name: &str, input_keys: &BTreeSet<String>) -> Result<usize, ConvertError> {
        let eligible: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.required.is_subset(input_keys))
            .map(|(idx, _)| idx)
            .collect();

        match eligible.as_slice() {
            [] => Err(self.no_match(union_name, input_keys)),
            [idx] => Ok(*idx),
            _ => {
                // Unique-marker tie-break: a present key required by
                // exactly one eligible member decides for it.
                let mut marked: Option<usize> = None;
                for key in input_keys {
                    if let Some(idx) = self.unique.get(key) {
                        if !eligible.contains(idx) {
                            continue;
                        }
                        match marked {
                            None => marked = Some(*idx),
                            Some(prev) if prev == *idx => {}
                            Some(_) => return Err(self.ambiguous(union_name, &eligible, input_keys)),
                        }
                    }
                }
                marked.ok_or_else(|| self.ambiguous(union_name, &eligible, input_keys))
            }
        }
    }

    fn candidates(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.to_string()).collect()
    }

    fn no_match(&self, union_name: &str, input_keys: &BTreeSet<String>) -> ConvertError {
        ConvertError::NoMatchingUnionMember {
            union: union_name.to_string(),
            candidates: self.candidates(),
            input_keys: input_keys.iter().cloned().collect(),
        }
    }

    fn ambiguous(
        &self,
        union_name: &str,
        eligible: &[usize],
        input_keys: &BTreeSet<String>,
    ) -> ConvertError {
        ConvertError::AmbiguousUnion {
            union: union_name.to_string(),
            candidates: eligible
                .iter()
                .map(|idx| self.entries[*idx].key.to_string())
                .collect(),
            input_keys: input_keys.iter().cloned().collect(),
        }
    }
}

/// Compile the hook for a union key.
pub(crate) fn compile(
    resolver: &HookResolver<'_>,
    direction: Direction,
    key: &TypeKey,
    union: &UnionKey,
) -> Result<Hook, ConvertError> {
    match direction {
        Direction::Structure => compile_structure(resolver, key, union),
        Direction::Unstructure => compile_unstructure(resolver, key, union),
    }
}

fn compile_structure(
    resolver: &HookResolver<'_>,
    key: &TypeKey,
    union: &UnionKey,
) -> Result<Hook, ConvertError> {
    let union_name = key.to_string();

    // An explicit discriminator sidesteps the fingerprint table entirely,
    // so non-aggregate members are fine on this path.
    if let Some(discriminator) = resolver.registry().discriminator(key) {
        let discriminator = discriminator.clone();
        let declared = union.declared().to_vec();
        let mut hooks = HashMap::with_capacity(declared.len());
        for member in &declared {
            hooks.insert(member.clone(), resolver.resolve(Direction::Structure, member)?);
        }
        return Ok(Hook::structure(move |raw| {
            let member = discriminator(raw, &declared)?;
            let hook = hooks
                .get(&member)
                .ok_or_else(|| ConvertError::NoMatchingUnionMember {
                    union: union_name.clone(),
                    candidates: declared.iter().map(ToString::to_string).collect(),
                    input_keys: Vec::new(),
                })?;
            hook.apply_structure(raw)
        }));
    }

    let table = cached_table(resolver, key, union)?;
    let hooks = table
        .entries
        .iter()
        .map(|e| resolver.resolve(Direction::Structure, &e.key))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Hook::structure(move |raw| {
        let map = raw.as_map().ok_or_else(|| ConvertError::Coercion {
            expected: union_name.clone(),
            got: raw.shape().to_string(),
        })?;
        let input_keys: BTreeSet<String> = map.keys().cloned().collect();
        let idx = table.classify(&union_name, &input_keys)?;
        hooks[idx].apply_structure(raw)
    }))
}

fn compile_unstructure(
    resolver: &HookResolver<'_>,
    key: &TypeKey,
    union: &UnionKey,
) -> Result<Hook, ConvertError> {
    let union_name = key.to_string();
    let members = union.declared().to_vec();
    let mut hooks = Vec::with_capacity(members.len());
    for member in &members {
        hooks.push(resolver.resolve(Direction::Unstructure, member)?);
    }

    Ok(Hook::unstructure(move |value| {
        // Structured values carry their own type name; nominal dispatch
        // needs no fingerprints.
        if let Some(type_name) = value.type_name() {
            if let Some(idx) = members
                .iter()
                .position(|m| m.nominal_name() == Some(type_name))
            {
                return hooks[idx].apply_unstructure(value);
            }
        }
        // Non-nominal values: first member (declared order) that accepts.
        for hook in &hooks {
            if let Ok(out) = hook.apply_unstructure(value) {
                return Ok(out);
            }
        }
        Err(ConvertError::NoMatchingUnionMember {
            union: union_name.clone(),
            candidates: members.iter().map(ToString::to_string).collect(),
            input_keys: Vec::new(),
        })
    }))
}

/// Union tables are cached per key in the active snapshot. The build is
/// deterministic, so a racing duplicate build is harmless.
fn cached_table(
    resolver: &HookResolver<'_>,
    key: &TypeKey,
    union: &UnionKey,
) -> Result<Arc<UnionTable>, ConvertError> {
    if let Some(table) = resolver.cache().unions.get(key) {
        return Ok(table.value().clone());
    }
    let table = Arc::new(UnionTable::build(resolver, union)?);
    resolver
        .cache()
        .unions
        .insert(key.clone(), table.clone());
    Ok(table)
}
