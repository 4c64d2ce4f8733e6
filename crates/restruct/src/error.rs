// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for structure/unstructure operations.
//!
//! All failures are local: they propagate immediately to the caller with
//! enough context (type name, field name, offending value) to diagnose.
//! Nothing is retried internally and nothing is silently swallowed; the
//! only intentionally silent case is ignoring unrecognized mapping keys
//! during aggregate structuring.

use std::fmt;

/// Errors produced by the conversion engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The type descriptor contains a construct the engine has no rule for
    /// (unresolved generic parameter, cyclic alias chain, conflicting
    /// redefinition of a named type).
    UnsupportedType { type_name: String, reason: String },
    /// A `Named` reference points at a type that was never registered.
    UnknownType(String),
    /// No hook could be resolved for the given key. Only reachable for
    /// keys whose shape has no built-in fallback.
    NoHookFound { direction: &'static str, key: String },
    /// Aggregate structuring: a required field is absent and has no default.
    RequiredFieldMissing { aggregate: String, field: String },
    /// Union structuring: more than one member matches the input.
    AmbiguousUnion {
        union: String,
        candidates: Vec<String>,
        input_keys: Vec<String>,
    },
    /// Union structuring: no member matches the input.
    NoMatchingUnionMember {
        union: String,
        candidates: Vec<String>,
        input_keys: Vec<String>,
    },
    /// A leaf value's shape does not match the expected primitive or
    /// container shape (e.g. string where integer expected).
    Coercion { expected: String, got: String },
    /// All fields structured individually, but the aggregate's own
    /// construction invariant rejected them.
    AggregateConstruction { aggregate: String, message: String },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType { type_name, reason } => {
                write!(f, "Unsupported type {}: {}", type_name, reason)
            }
            Self::UnknownType(name) => write!(f, "Unknown type: {} (not registered)", name),
            Self::NoHookFound { direction, key } => {
                write!(f, "No {} hook found for {}", direction, key)
            }
            Self::RequiredFieldMissing { aggregate, field } => {
                write!(f, "Required field missing: {}.{}", aggregate, field)
            }
            Self::AmbiguousUnion {
                union,
                candidates,
                input_keys,
            } => write!(
                f,
                "Ambiguous union {}: candidates [{}], input keys [{}]",
                union,
                candidates.join(", "),
                input_keys.join(", ")
            ),
            Self::NoMatchingUnionMember {
                union,
                candidates,
                input_keys,
            } => write!(
                f,
                "No matching union member for {}: candidates [{}], input keys [{}]",
                union,
                candidates.join(", "),
                input_keys.join(", ")
            ),
            Self::Coercion { expected, got } => {
                write!(f, "Type coercion failed: expected {}, got {}", expected, got)
            }
            Self::AggregateConstruction { aggregate, message } => {
                write!(f, "Construction of {} rejected: {}", aggregate, message)
            }
        }
    }
}

impl std::error::Error for ConvertError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_missing_field() {
        let err = ConvertError::RequiredFieldMissing {
            aggregate: "Point".into(),
            field: "x".into(),
        };
        assert_eq!(err.to_string(), "Required field missing: Point.x");
    }

    #[test]
    fn test_display_ambiguous_union() {
        let err = ConvertError::AmbiguousUnion {
            union: "union<A|B>".into(),
            candidates: vec!["A".into(), "B".into()],
            input_keys: vec!["kind_a".into(), "kind_b".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("A, B"));
        assert!(msg.contains("kind_a, kind_b"));
    }
}
