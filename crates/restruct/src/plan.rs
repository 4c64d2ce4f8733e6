// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Aggregate field plans.
//!
//! An aggregate hook is compiled once per (direction, type) from the
//! registered descriptor: one row per field carrying the resolved
//! sub-hook, the wire key, and the default. The per-value path is then a
//! straight walk over the rows with no descriptor lookups. Field hooks
//! for self-referential aggregates come back as forward proxies, which is
//! what bounds compilation depth.

use crate::descriptor::TypeKind;
use crate::error::ConvertError;
use crate::key::normalize;
use crate::registry::{Direction, Hook, ValidatorFn};
use crate::resolve::HookResolver;
use crate::structured::Structured;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

struct FieldRow {
    /// Field name on the structured side.
    name: String,
    /// Key on the unstructured side (rename-aware).
    wire_key: String,
    hook: Hook,
    default: Option<Structured>,
    omit_if_default: bool,
}

/// Compile the hook for a registered aggregate.
pub(crate) fn compile(
    resolver: &HookResolver<'_>,
    direction: Direction,
    name: &Arc<str>,
) -> Result<Hook, ConvertError> {
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

    let mut rows = Vec::with_capacity(fields.len());
    for field in fields {
        let key = normalize(&field.type_desc, resolver.types())?;
        rows.push(FieldRow {
            name: field.name.clone(),
            wire_key: field.wire_key().to_string(),
            hook: resolver.resolve(direction, &key)?,
            default: field.default.clone(),
            omit_if_default: field.omit_if_default,
        });
    }
    log::trace!(
        "compiled {} plan for {} ({} fields)",
        direction.as_str(),
        name,
        rows.len()
    );

    let type_name = name.clone();
    Ok(match direction {
        Direction::Structure => {
            let validator = resolver.registry().validator(name).cloned();
            Hook::structure(move |raw| structure_fields(&type_name, &rows, &validator, raw))
        }
        Direction::Unstructure => {
            Hook::unstructure(move |value| unstructure_fields(&type_name, &rows, value))
        }
    })
}

fn structure_fields(
    type_name: &Arc<str>,
    rows: &[FieldRow],
    validator: &Option<ValidatorFn>,
    raw: &Value,
) -> Result<Structured, ConvertError> {
    let map = raw.as_map().ok_or_else(|| ConvertError::Coercion {
        expected: format!("mapping for {}", type_name),
        got: raw.shape().to_string(),
    })?;

    let mut fields = std::collections::HashMap::with_capacity(rows.len());
    for row in rows {
        // Keys not named by any row are ignored.
        let value = match map.get(&row.wire_key) {
            Some(raw_field) => row.hook.apply_structure(raw_field)?,
            None => match &row.default {
                Some(default) => default.clone(),
                None => {
                    return Err(ConvertError::RequiredFieldMissing {
                        aggregate: type_name.to_string(),
                        field: row.name.clone(),
                    })
                }
            },
        };
        fields.insert(row.name.clone(), value);
    }

    let value = Structured::Struct {
        type_name: type_name.clone(),
        fields,
    };
    if let Some(check) = validator {
        check(&value).map_err(|message| ConvertError::AggregateConstruction {
            aggregate: type_name.to_string(),
            message,
        })?;
    }
    Ok(value)
}

fn unstructure_fields(
    type_name: &Arc<str>,
    rows: &[FieldRow],
    value: &Structured,
) -> Result<Value, ConvertError> {
    let Structured::Struct { fields, .. } = value else {
        return Err(ConvertError::Coercion {
            expected: type_name.to_string(),
            got: value.shape().to_string(),
        });
    };

    let mut out = BTreeMap::new();
    for row in rows {
        let field_value = match fields.get(&row.name) {
            Some(v) => v,
            None => match &row.default {
                Some(default) => default,
                None => {
                    return Err(ConvertError::RequiredFieldMissing {
                        aggregate: type_name.to_string(),
                        field: row.name.clone(),
                    })
                }
            },
        };
        if row.omit_if_default && row.default.as_ref() == Some(field_value) {
            continue;
        }
        out.insert(row.wire_key.clone(), row.hook.apply_unstructure(field_value)?);
    }
    Ok(Value::Map(out))
}
