// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine-level integration tests.

use crate::{
    ConvertError, Converter, Hook, PrimitiveKind, SeqForm, Structured, TypeDescriptor,
    TypeDescriptorBuilder, TypeKey, UnionBuilder, Value,
};
use std::sync::Arc;

fn prim(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::primitive(kind))
}

#[test]
fn test_nested_aggregate_round_trip() {
    let conv = Converter::new();
    let inner = TypeDescriptorBuilder::new("Inner")
        .field("n", PrimitiveKind::I64)
        .build();
    conv.register_type(&inner).expect("register");
    let outer = TypeDescriptorBuilder::new("Outer")
        .string_field("label")
        .named_field("inner", "Inner")
        .list_field("values", prim(PrimitiveKind::U32))
        .build();

    let raw = Value::map_of([
        ("label", Value::from("box")),
        ("inner", Value::map_of([("n", Value::I64(-3))])),
        ("values", Value::from(vec![1u32, 2, 3])),
    ]);

    let value = conv.structure(&raw, &outer).expect("structure");
    assert_eq!(value.type_name(), Some("Outer"));
    assert_eq!(
        value.get_field("inner").and_then(|v| v.get_field("n")),
        Some(&Structured::I64(-3))
    );

    assert_eq!(conv.unstructure_as(&value, &outer).expect("back"), raw);
    assert_eq!(conv.unstructure(&value).expect("back"), raw);
}

#[test]
fn test_defaults_and_renames() {
    let conv = Converter::new();
    let desc = TypeDescriptorBuilder::new("Config")
        .field_desc(
            crate::FieldDescriptor::new("retries", prim(PrimitiveKind::U32))
                .with_default(Structured::U64(3)),
        )
        .field_desc(crate::FieldDescriptor::new("host", prim(PrimitiveKind::Str)).renamed("addr"))
        .build();

    // Absent defaulted field, renamed key on the wire, extra key ignored.
    let raw = Value::map_of([
        ("addr", Value::from("localhost")),
        ("unknown", Value::Bool(true)),
    ]);
    let value = conv.structure(&raw, &desc).expect("structure");
    assert_eq!(value.get_field("retries"), Some(&Structured::U64(3)));
    assert_eq!(
        value.get_field("host"),
        Some(&Structured::Str("localhost".into()))
    );

    // The rename applies on output too; the default is written out since
    // omit_if_default is not set.
    let back = conv.unstructure(&value).expect("unstructure");
    assert_eq!(
        back,
        Value::map_of([("addr", Value::from("localhost")), ("retries", Value::U64(3))])
    );
}

#[test]
fn test_omit_if_default_round_trip() {
    let conv = Converter::new();
    let desc = TypeDescriptorBuilder::new("Flags")
        .field_desc(
            crate::FieldDescriptor::new("verbose", prim(PrimitiveKind::Bool))
                .with_default(Structured::Bool(false))
                .omit_if_default(),
        )
        .field("id", PrimitiveKind::U64)
        .build();

    let raw = Value::map_of([("id", Value::U64(7))]);
    let value = conv.structure(&raw, &desc).expect("structure");
    assert_eq!(value.get_field("verbose"), Some(&Structured::Bool(false)));

    // Round-trips to the sparse form, not to an expanded one.
    assert_eq!(conv.unstructure(&value).expect("back"), raw);

    // A non-default value survives.
    let raw2 = Value::map_of([("id", Value::U64(7)), ("verbose", Value::Bool(true))]);
    let value2 = conv.structure(&raw2, &desc).expect("structure");
    assert_eq!(conv.unstructure(&value2).expect("back"), raw2);
}

#[test]
fn test_required_field_missing_names_the_field() {
    let conv = Converter::new();
    let desc = TypeDescriptorBuilder::new("Point")
        .field("x", PrimitiveKind::F64)
        .field("y", PrimitiveKind::F64)
        .build();

    let err = conv
        .structure(&Value::map_of([("x", Value::F64(1.0))]), &desc)
        .expect_err("must fail");
    assert_eq!(
        err,
        ConvertError::RequiredFieldMissing {
            aggregate: "Point".into(),
            field: "y".into(),
        }
    );
}

#[test]
fn test_recursive_aggregate_deep_round_trip() {
    let conv = Converter::new();
    let desc = TypeDescriptorBuilder::new("Node")
        .field("value", PrimitiveKind::I64)
        .optional_named_field("next", "Node")
        .build();
    conv.register_type(&desc).expect("register");

    // Six levels deep.
    let mut raw = Value::map_of([("value", Value::I64(0)), ("next", Value::Null)]);
    for depth in 1..6 {
        raw = Value::map_of([("value", Value::I64(depth)), ("next", raw)]);
    }

    let value = conv.structure(&raw, &desc).expect("structure");
    let mut cursor = &value;
    for depth in (1..6).rev() {
        assert_eq!(cursor.get_field("value"), Some(&Structured::I64(depth)));
        let Some(Structured::Optional(Some(next))) = cursor.get_field("next") else {
            panic!("Expected filled next at depth {}", depth);
        };
        cursor = next;
    }
    assert_eq!(cursor.get_field("value"), Some(&Structured::I64(0)));

    assert_eq!(conv.unstructure(&value).expect("back"), raw);
}

#[test]
fn test_mutually_recursive_aggregates() {
    let conv = Converter::new();
    let forest = TypeDescriptorBuilder::new("Forest")
        .list_field("trees", Arc::new(TypeDescriptor::named("Tree")))
        .build();
    let tree = TypeDescriptorBuilder::new("Tree")
        .field("id", PrimitiveKind::U32)
        .optional_named_field("subforest", "Forest")
        .build();
    // Registration order does not matter for Named references.
    conv.register_type(&forest).expect("register");
    conv.register_type(&tree).expect("register");

    let raw = Value::map_of([(
        "trees",
        Value::Seq(vec![Value::map_of([
            ("id", Value::U64(1)),
            (
                "subforest",
                Value::map_of([(
                    "trees",
                    Value::Seq(vec![Value::map_of([
                        ("id", Value::U64(2)),
                        ("subforest", Value::Null),
                    ])]),
                )]),
            ),
        ])]),
    )]);

    let value = conv.structure(&raw, &forest).expect("structure");
    assert_eq!(conv.unstructure(&value).expect("back"), raw);
}

#[test]
fn test_union_disambiguation_is_deterministic() {
    let conv = Converter::new();
    let circle = TypeDescriptorBuilder::new("Circle")
        .field("radius", PrimitiveKind::F64)
        .build();
    let square = TypeDescriptorBuilder::new("Square")
        .field("side", PrimitiveKind::F64)
        .build();
    conv.register_type(&circle).expect("register");
    conv.register_type(&square).expect("register");

    let ab = UnionBuilder::new()
        .named_member("Circle")
        .named_member("Square")
        .build();
    let ba = UnionBuilder::new()
        .named_member("Square")
        .named_member("Circle")
        .build();

    let raw = Value::map_of([("side", Value::F64(4.0))]);
    let v1 = conv.structure(&raw, &ab).expect("structure");
    let v2 = conv.structure(&raw, &ba).expect("structure");
    assert_eq!(v1, v2);
    assert_eq!(v1.type_name(), Some("Square"));

    // Unstructuring a union value dispatches nominally.
    assert_eq!(conv.unstructure_as(&v1, &ab).expect("back"), raw);
}

#[test]
fn test_union_ambiguity_and_no_match() {
    let conv = Converter::new();
    let a = TypeDescriptorBuilder::new("A").field("x", PrimitiveKind::I64).build();
    let b = TypeDescriptorBuilder::new("B").field("x", PrimitiveKind::I64).build();
    conv.register_type(&a).expect("register");
    conv.register_type(&b).expect("register");

    let union = UnionBuilder::new().named_member("A").named_member("B").build();
    let raw = Value::map_of([("x", Value::I64(1))]);
    let err = conv.structure(&raw, &union).expect_err("ambiguous");
    assert!(matches!(err, ConvertError::AmbiguousUnion { .. }));

    let raw = Value::map_of([("y", Value::I64(1))]);
    let err = conv.structure(&raw, &union).expect_err("no match");
    assert!(matches!(err, ConvertError::NoMatchingUnionMember { .. }));
}

#[test]
fn test_discriminator_overrides_fingerprints() {
    let conv = Converter::new();
    let a = TypeDescriptorBuilder::new("A").field("x", PrimitiveKind::I64).build();
    let b = TypeDescriptorBuilder::new("B").field("x", PrimitiveKind::I64).build();
    conv.register_type(&a).expect("register");
    conv.register_type(&b).expect("register");
    let union = UnionBuilder::new().named_member("A").named_member("B").build();

    // Identical fingerprints, so only the discriminator can decide.
    conv.register_union_discriminator(&union, |raw, members| {
        let pick = if raw.as_map().and_then(|m| m.get("x")).and_then(Value::as_i64)
            == Some(0)
        {
            "A"
        } else {
            "B"
        };
        members
            .iter()
            .find(|m| m.nominal_name() == Some(pick))
            .cloned()
            .ok_or(ConvertError::UnknownType(pick.into()))
    })
    .expect("register discriminator");

    let v = conv
        .structure(&Value::map_of([("x", Value::I64(0))]), &union)
        .expect("structure");
    assert_eq!(v.type_name(), Some("A"));
    let v = conv
        .structure(&Value::map_of([("x", Value::I64(9))]), &union)
        .expect("structure");
    assert_eq!(v.type_name(), Some("B"));
}

#[test]
fn test_enum_round_trip_by_name_and_value() {
    let conv = Converter::new();
    let desc = crate::EnumBuilder::new("Color")
        .variant("RED")
        .variant("GREEN")
        .variant("BLUE")
        .build();
    conv.register_type(&desc).expect("register");

    let by_name = conv
        .structure(&Value::from("GREEN"), &desc)
        .expect("structure");
    let by_value = conv.structure(&Value::I64(1), &desc).expect("structure");
    assert_eq!(by_name, by_value);
    assert_eq!(by_name.enum_variant(), Some("GREEN"));

    // Enumerations travel as their variant name.
    assert_eq!(conv.unstructure(&by_name).expect("back"), Value::from("GREEN"));

    let err = conv
        .structure(&Value::from("MAGENTA"), &desc)
        .expect_err("unknown variant");
    assert!(matches!(err, ConvertError::Coercion { .. }));
}

#[test]
fn test_containers_round_trip() {
    let conv = Converter::new();
    let desc = TypeDescriptor::map_of(
        prim(PrimitiveKind::U32),
        Arc::new(TypeDescriptor::tuple_of(vec![
            prim(PrimitiveKind::Str),
            Arc::new(TypeDescriptor::optional_of(prim(PrimitiveKind::I64))),
        ])),
    );

    let raw = Value::map_of([
        ("1", Value::Seq(vec![Value::from("a"), Value::I64(5)])),
        ("2", Value::Seq(vec![Value::from("b"), Value::Null])),
    ]);
    let value = conv.structure(&raw, &desc).expect("structure");
    assert_eq!(conv.unstructure_as(&value, &desc).expect("back"), raw);

    let err = conv
        .structure(
            &Value::map_of([("1", Value::Seq(vec![Value::from("a")]))]),
            &desc,
        )
        .expect_err("wrong arity");
    assert!(matches!(err, ConvertError::Coercion { .. }));
}

#[test]
fn test_set_descriptor_produces_set_values() {
    let conv = Converter::new();
    let desc = TypeDescriptor::set_of(prim(PrimitiveKind::U32));
    let value = conv
        .structure(&Value::from(vec![3u32, 1, 2]), &desc)
        .expect("structure");
    assert!(matches!(value, Structured::Set(_)));
    assert_eq!(
        conv.unstructure_as(&value, &desc).expect("back"),
        Value::from(vec![3u32, 1, 2])
    );
}

#[test]
fn test_factory_specializes_per_key() {
    let conv = Converter::new();
    // Doubles every integer inside any list of i64.
    conv.register_structure_factory(
        |key| {
            matches!(key, TypeKey::Seq { elem, form: SeqForm::List }
                if **elem == TypeKey::Primitive(PrimitiveKind::I64))
        },
        |_key: &TypeKey, _resolver: &crate::HookResolver| {
            Ok(Hook::structure(|raw| {
                let items = raw.as_seq().ok_or_else(|| ConvertError::Coercion {
                    expected: "sequence".into(),
                    got: raw.shape().to_string(),
                })?;
                let doubled = items
                    .iter()
                    .map(|v| {
                        v.as_i64().map(|i| Structured::I64(i * 2)).ok_or_else(|| {
                            ConvertError::Coercion {
                                expected: "i64".into(),
                                got: v.shape().to_string(),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Structured::List(doubled))
            }))
        },
    );

    let desc = TypeDescriptor::list_of(prim(PrimitiveKind::I64));
    let value = conv
        .structure(&Value::from(vec![1i64, 2, 3]), &desc)
        .expect("structure");
    assert_eq!(
        value,
        Structured::List(vec![
            Structured::I64(2),
            Structured::I64(4),
            Structured::I64(6)
        ])
    );

    // Other element types still use the built-in rule.
    let other = TypeDescriptor::list_of(prim(PrimitiveKind::U32));
    let value = conv
        .structure(&Value::from(vec![1u32]), &other)
        .expect("structure");
    assert_eq!(value, Structured::List(vec![Structured::U64(1)]));
}

#[test]
fn test_custom_hook_overrides_builtin_then_extends() {
    let conv = Converter::new();
    let desc = TypeDescriptor::primitive(PrimitiveKind::Str);

    // Built-in rejects integers where a string is expected...
    assert!(conv.structure(&Value::I64(7), &desc).is_err());

    // ...until a lenient hook takes over.
    conv.register_structure_hook_for(&desc, |raw| match raw {
        Value::Str(s) => Ok(Structured::Str(s.clone())),
        Value::I64(i) => Ok(Structured::Str(i.to_string())),
        other => Err(ConvertError::Coercion {
            expected: "string".into(),
            got: other.shape().to_string(),
        }),
    })
    .expect("register");

    assert_eq!(
        conv.structure(&Value::I64(7), &desc),
        Ok(Structured::Str("7".into()))
    );
}

#[test]
fn test_primitive_unstructure_is_idempotent() {
    let conv = Converter::new();
    let cases = [
        (PrimitiveKind::Bool, Value::Bool(true)),
        (PrimitiveKind::I32, Value::I64(-7)),
        (PrimitiveKind::U16, Value::U64(42)),
        (PrimitiveKind::F64, Value::F64(2.5)),
        (PrimitiveKind::Char, Value::Char('x')),
        (PrimitiveKind::Str, Value::from("ok")),
    ];
    for (kind, raw) in cases {
        let desc = TypeDescriptor::primitive(kind);
        let value = conv.structure(&raw, &desc).expect("structure");
        let once = conv.unstructure_as(&value, &desc).expect("unstructure");
        assert_eq!(once, raw);
        // Re-structuring the unstructured output is a fixpoint.
        let again = conv.structure(&once, &desc).expect("structure");
        assert_eq!(again, value);
        assert_eq!(conv.unstructure(&value).expect("runtime"), raw);
    }
}

#[test]
fn test_unknown_named_type() {
    let conv = Converter::new();
    let desc = TypeDescriptor::named("Phantom");
    let err = conv
        .structure(&Value::map_of([("x", Value::I64(1))]), &desc)
        .expect_err("must fail");
    assert_eq!(err, ConvertError::UnknownType("Phantom".into()));
}

#[test]
fn test_concurrent_conversions_and_registrations() {
    let conv = Arc::new(Converter::new());
    let desc = TypeDescriptorBuilder::new("Sample")
        .field("seq", PrimitiveKind::U64)
        .build();
    conv.register_type(&desc).expect("register");

    let mut handles = Vec::new();
    for t in 0..4u64 {
        let conv = conv.clone();
        let desc = desc.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..200u64 {
                let raw = Value::map_of([("seq", Value::U64(t * 1000 + i))]);
                let value = conv.structure(&raw, &desc).expect("structure");
                assert_eq!(conv.unstructure(&value).expect("back"), raw);
            }
        }));
    }
    // Interleave registrations to exercise invalidation.
    for _ in 0..10 {
        conv.register_unstructure_hook(|_| false, |_| Ok(Value::Null));
    }
    for handle in handles {
        handle.join().expect("thread");
    }
    assert!(conv.cache_generation() >= 10);
}
