// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type key normalization.
//!
//! A [`TypeKey`] is the canonical, comparable identifier for a type
//! descriptor. Two descriptors that are structurally identical normalize
//! to the same key, which makes keys usable for cache lookup and
//! predicate matching. Normalization collapses equivalent spellings:
//! nested optionals, aliases, and single-member unions.

use crate::descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
use crate::error::ConvertError;
use crate::registry::TypeTable;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What a canonical sequence key produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqForm {
    List,
    Set,
}

/// Canonical type key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Primitive(PrimitiveKind),
    Optional(Arc<TypeKey>),
    Seq { elem: Arc<TypeKey>, form: SeqForm },
    Tuple(Vec<TypeKey>),
    Map(Arc<TypeKey>, Arc<TypeKey>),
    Enum(Arc<str>),
    Aggregate(Arc<str>),
    Union(UnionKey),
}

impl TypeKey {
    /// Shape tag used by the built-in structural rule table.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Optional(_) => "optional",
            Self::Seq { .. } => "sequence",
            Self::Tuple(_) => "tuple",
            Self::Map(_, _) => "map",
            Self::Enum(_) => "enum",
            Self::Aggregate(_) => "aggregate",
            Self::Union(_) => "union",
        }
    }

    /// Aggregate or enum type name, if nominal.
    pub fn nominal_name(&self) -> Option<&str> {
        match self {
            Self::Enum(n) | Self::Aggregate(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Optional(inner) => write!(f, "optional<{}>", inner),
            Self::Seq { elem, form } => match form {
                SeqForm::List => write!(f, "list<{}>", elem),
                SeqForm::Set => write!(f, "set<{}>", elem),
            },
            Self::Tuple(elems) => {
                f.write_str("tuple<")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                f.write_str(">")
            }
            Self::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            Self::Enum(n) | Self::Aggregate(n) => f.write_str(n),
            Self::Union(u) => {
                f.write_str("union<")?;
                for (i, m) in u.declared().iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", m)?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Canonical key for a union of member keys.
///
/// Equality and hashing use the deduplicated member *set*; the declared
/// order is retained separately for disambiguation tie-breaking and does
/// not participate in identity.
#[derive(Debug, Clone)]
pub struct UnionKey {
    members: Vec<TypeKey>,
    declared: Vec<TypeKey>,
}

impl UnionKey {
    /// Build from members in declaration order. Duplicates are dropped
    /// from both views (first occurrence wins in the declared view).
    pub fn new(declared: Vec<TypeKey>) -> Self {
        let mut unique: Vec<TypeKey> = Vec::with_capacity(declared.len());
        for m in declared {
            if !unique.contains(&m) {
                unique.push(m);
            }
        }
        let mut members = unique.clone();
        members.sort_by_key(ToString::to_string);
        Self {
            members,
            declared: unique,
        }
    }

    /// Members in canonical (sorted) order.
    pub fn members(&self) -> &[TypeKey] {
        &self.members
    }

    /// Members in original declaration order.
    pub fn declared(&self) -> &[TypeKey] {
        &self.declared
    }
}

impl PartialEq for UnionKey {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for UnionKey {}

impl Hash for UnionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.members.hash(state);
    }
}

/// Normalize a type descriptor into its canonical [`TypeKey`].
///
/// Named aggregate and enum descriptors encountered during normalization
/// are recorded in the type table on first sight (insert-if-absent), so a
/// descriptor passed inline at a call site is usable for `Named`
/// references afterwards.
pub fn normalize(desc: &TypeDescriptor, types: &TypeTable) -> Result<TypeKey, ConvertError> {
    let mut seen = Vec::new();
    normalize_inner(desc, types, &mut seen)
}

fn normalize_inner(
    desc: &TypeDescriptor,
    types: &TypeTable,
    seen: &mut Vec<String>,
) -> Result<TypeKey, ConvertError> {
    match &desc.kind {
        TypeKind::Primitive(p) => Ok(TypeKey::Primitive(*p)),
        TypeKind::Optional(inner) => {
            let inner = normalize_inner(inner, types, seen)?;
            // optional<optional<T>> collapses to optional<T>
            match inner {
                TypeKey::Optional(_) => Ok(inner),
                _ => Ok(TypeKey::Optional(Arc::new(inner))),
            }
        }
        TypeKind::List(elem) => Ok(TypeKey::Seq {
            elem: Arc::new(normalize_inner(elem, types, seen)?),
            form: SeqForm::List,
        }),
        TypeKind::Set(elem) => Ok(TypeKey::Seq {
            elem: Arc::new(normalize_inner(elem, types, seen)?),
            form: SeqForm::Set,
        }),
        TypeKind::Tuple(elems) => {
            let keys = elems
                .iter()
                .map(|e| normalize_inner(e, types, seen))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeKey::Tuple(keys))
        }
        TypeKind::Map(k, v) => Ok(TypeKey::Map(
            Arc::new(normalize_inner(k, types, seen)?),
            Arc::new(normalize_inner(v, types, seen)?),
        )),
        TypeKind::Struct(_) => {
            let name = types.record(desc)?;
            Ok(TypeKey::Aggregate(name))
        }
        TypeKind::Enum(_) => {
            let name = types.record(desc)?;
            Ok(TypeKey::Enum(name))
        }
        TypeKind::Union(members) => {
            let keys = members
                .iter()
                .map(|m| normalize_inner(m, types, seen))
                .collect::<Result<Vec<_>, _>>()?;
            let union = UnionKey::new(keys);
            // A single-member union reduces to that member.
            if union.members().len() == 1 {
                return Ok(union.declared()[0].clone());
            }
            Ok(TypeKey::Union(union))
        }
        TypeKind::Named(name) => {
            if seen.iter().any(|s| s == name) {
                return Err(ConvertError::UnsupportedType {
                    type_name: name.clone(),
                    reason: "cyclic alias chain".into(),
                });
            }
            let target = types
                .lookup(name)
                .ok_or_else(|| ConvertError::UnknownType(name.clone()))?;
            match &target.kind {
                // Nominal cut: no inlining, so recursive aggregates
                // normalize in constant depth.
                TypeKind::Struct(_) => Ok(TypeKey::Aggregate(types.intern(name))),
                TypeKind::Enum(_) => Ok(TypeKey::Enum(types.intern(name))),
                _ => {
                    seen.push(name.clone());
                    let key = normalize_inner(&target, types, seen);
                    seen.pop();
                    key
                }
            }
        }
        TypeKind::Alias(target) => normalize_inner(target, types, seen),
        TypeKind::Var(name) => Err(ConvertError::UnsupportedType {
            type_name: name.clone(),
            reason: "unresolved type variable".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeDescriptorBuilder;

    fn prim(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive(kind))
    }

    #[test]
    fn test_optional_collapse() {
        let types = TypeTable::new();
        let nested = TypeDescriptor::optional_of(Arc::new(TypeDescriptor::optional_of(prim(
            PrimitiveKind::I64,
        ))));
        let flat = TypeDescriptor::optional_of(prim(PrimitiveKind::I64));

        let a = normalize(&nested, &types).expect("normalize");
        let b = normalize(&flat, &types).expect("normalize");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "optional<i64>");
    }

    #[test]
    fn test_alias_collapse() {
        let types = TypeTable::new();
        let list = Arc::new(TypeDescriptor::list_of(prim(PrimitiveKind::U32)));
        let alias = TypeDescriptor::alias("U32Vec", list.clone());

        let a = normalize(&alias, &types).expect("normalize");
        let b = normalize(&list, &types).expect("normalize");
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_member_union_reduces() {
        let types = TypeTable::new();
        let union = TypeDescriptor::union_of(vec![prim(PrimitiveKind::I64), prim(PrimitiveKind::I64)]);
        let key = normalize(&union, &types).expect("normalize");
        assert_eq!(key, TypeKey::Primitive(PrimitiveKind::I64));
    }

    #[test]
    fn test_union_member_order_is_not_identity() {
        let types = TypeTable::new();
        for name in ["A", "B"] {
            types
                .record(&TypeDescriptorBuilder::new(name).build())
                .expect("record");
        }
        let ab = TypeDescriptor::union_of(vec![
            Arc::new(TypeDescriptor::named("A")),
            Arc::new(TypeDescriptor::named("B")),
        ]);
        let ba = TypeDescriptor::union_of(vec![
            Arc::new(TypeDescriptor::named("B")),
            Arc::new(TypeDescriptor::named("A")),
        ]);

        let k1 = normalize(&ab, &types).expect("normalize");
        let k2 = normalize(&ba, &types).expect("normalize");
        assert_eq!(k1, k2);

        // Declared order survives for tie-breaking.
        match (&k1, &k2) {
            (TypeKey::Union(u1), TypeKey::Union(u2)) => {
                assert_ne!(u1.declared()[0].to_string(), u2.declared()[0].to_string());
            }
            _ => panic!("Expected union keys"),
        }
    }

    #[test]
    fn test_unresolved_var_fails() {
        let types = TypeTable::new();
        let var = TypeDescriptor::var("T");
        let err = normalize(&var, &types).expect_err("must fail");
        assert!(matches!(err, ConvertError::UnsupportedType { .. }));
    }

    #[test]
    fn test_unknown_named_fails() {
        let types = TypeTable::new();
        let named = TypeDescriptor::named("Ghost");
        let err = normalize(&named, &types).expect_err("must fail");
        assert_eq!(err, ConvertError::UnknownType("Ghost".into()));
    }

    #[test]
    fn test_struct_normalizes_nominally_and_records() {
        let types = TypeTable::new();
        let desc = TypeDescriptorBuilder::new("Point")
            .field("x", PrimitiveKind::F64)
            .build();

        let key = normalize(&desc, &types).expect("normalize");
        assert_eq!(key, TypeKey::Aggregate("Point".into()));
        assert!(types.lookup("Point").is_some());

        // Same spelling again maps to the same key.
        let again = normalize(&desc, &types).expect("normalize");
        assert_eq!(key, again);
    }
}
