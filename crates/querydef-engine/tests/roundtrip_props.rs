#![forbid(unsafe_code)]
//! Property-based tests for the quantified invariants: serialization
//! round-trips, `set` idempotence, cardinality truncation, conflict
//! symmetry, and the complement byte-length rule.

use std::collections::BTreeSet;

use proptest::collection::{btree_set, vec as prop_vec};
use proptest::prelude::*;

use querydef_engine::query::RawQuery;
use querydef_engine::registry::{Registry, RegistryBuilder};
use querydef_engine::template::{set_complement, TemplateSpec};
use querydef_engine::value::Value;
use querydef_engine::value_type::{IntType, SetOf, StrType};

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_atom() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn arb_letter_subset() -> impl Strategy<Value = BTreeSet<char>> {
    btree_set(proptest::char::range('a', 'z'), 0..=26)
}

fn mixed_registry() -> Registry {
    RegistryBuilder::new()
        .param(TemplateSpec::new("q").max(1))
        .param(TemplateSpec::new("page").value_type(IntType).max(1))
        .param(TemplateSpec::new("tags"))
        .build()
        .expect("mixed registry builds")
}

fn letter_set_registry() -> Registry {
    RegistryBuilder::new()
        .param(
            TemplateSpec::new("foo")
                .composite(SetOf::new(StrType))
                .universe_value(Value::set(
                    ('a'..='z').map(|c| Value::Str(c.to_string())),
                ))
                .complement(set_complement),
        )
        .build()
        .expect("letter registry builds")
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn round_trip_is_identity(
        q in proptest::option::of(arb_atom()),
        page in proptest::option::of(0i64..=99_999),
        tags in prop_vec(arb_atom(), 0..5),
    ) {
        let registry = mixed_registry();
        let mut raw = RawQuery::new();
        if let Some(q) = q {
            raw.push("q", q);
        }
        if let Some(page) = page {
            raw.push("page", page.to_string());
        }
        for tag in tags {
            raw.push("tags", tag);
        }

        let instance = registry.process(&raw).unwrap();
        let reparsed = registry
            .process(&RawQuery::parse(&instance.as_string()))
            .unwrap();
        prop_assert_eq!(reparsed.content(), instance.content());
        prop_assert_eq!(reparsed.as_string(), instance.as_string());
    }

    #[test]
    fn set_is_idempotent(
        first in arb_atom(),
        second in arb_atom(),
        page in 0i64..=99_999,
    ) {
        let registry = mixed_registry();
        let base = registry
            .process(&RawQuery::parse(&format!("q={first}")))
            .unwrap();

        let mut overrides = RawQuery::new();
        overrides.push("q", second);
        overrides.push("page", page.to_string());

        let once = base.clone_with(overrides.clone()).unwrap();
        let twice = once.clone_with(overrides).unwrap();
        prop_assert_eq!(once.content(), twice.content());
        prop_assert_eq!(once.as_string(), twice.as_string());
    }

    #[test]
    fn truncation_respects_shift_direction(
        atoms in prop_vec(arb_atom(), 0..8),
        shift in any::<bool>(),
    ) {
        let registry = RegistryBuilder::new()
            .param(TemplateSpec::new("k").max(2).shift(shift))
            .build()
            .unwrap();
        let mut raw = RawQuery::new();
        raw.insert_list("k", atoms.clone());
        let instance = registry.process(&raw).unwrap();

        let expected: Vec<Value> = if atoms.len() > 2 {
            let keep = if shift {
                &atoms[atoms.len() - 2..]
            } else {
                &atoms[..2]
            };
            keep.iter().map(|s| Value::from(s.as_str())).collect()
        } else {
            atoms.iter().map(|s| Value::from(s.as_str())).collect()
        };

        if expected.is_empty() {
            prop_assert!(!instance.exists("k"));
        } else {
            prop_assert_eq!(instance.get("k"), Some(&Value::Seq(expected)));
        }
    }

    #[test]
    fn conflict_symmetry(
        declare_on_a in any::<bool>(),
        has_a in any::<bool>(),
        has_b in any::<bool>(),
    ) {
        let mut a = TemplateSpec::new("a").max(1);
        let mut b = TemplateSpec::new("b").max(1);
        if declare_on_a {
            a = a.conflicts(["b"]);
        } else {
            b = b.conflicts(["a"]);
        }
        let registry = RegistryBuilder::new().param(a).param(b).build().unwrap();

        let mut raw = RawQuery::new();
        if has_a {
            raw.push("a", "1");
        }
        if has_b {
            raw.push("b", "2");
        }
        let result = registry.process(&raw);
        // Failure iff both sides are present, regardless of which
        // template declared the edge.
        prop_assert_eq!(result.is_err(), has_a && has_b);
    }

    #[test]
    fn complement_rewrite_round_trips_and_picks_shorter_form(
        members in arb_letter_subset(),
    ) {
        let registry = letter_set_registry();
        let mut raw = RawQuery::new();
        raw.insert_list("foo", members.iter().map(|c| c.to_string()));
        let instance = registry.process(&raw).unwrap();
        let serialized = instance.as_string();

        // Round-trip holds whichever branch was chosen.
        let reparsed = registry
            .process(&RawQuery::parse(&serialized))
            .unwrap();
        prop_assert_eq!(reparsed.content(), instance.content());

        // The chosen branch obeys the byte-length rule.
        let direct = members
            .iter()
            .map(|c| format!("foo={c}"))
            .collect::<Vec<_>>()
            .join("&");
        let complement = ('a'..='z')
            .filter(|c| !members.contains(c))
            .map(|c| format!("foo={c}"))
            .collect::<Vec<_>>()
            .join("&");
        let reserved_pair = "&complement=foo";

        if members.is_empty() {
            prop_assert!(!instance.exists("foo"));
            prop_assert_eq!(serialized, String::new());
        } else if serialized.ends_with(reserved_pair) {
            prop_assert!(!complement.is_empty());
            prop_assert!(complement.len() + reserved_pair.len() < direct.len());
            prop_assert_eq!(serialized, format!("{complement}{reserved_pair}"));
        } else {
            prop_assert!(
                complement.is_empty()
                    || complement.len() + reserved_pair.len() >= direct.len()
            );
            prop_assert_eq!(serialized, direct);
        }
    }
}
