//! Property-Based Tests
//!
//! Invariants of validation, filtering, indexing and export checked with
//! proptest over generated records and specs.

use kml_filter::{
    extract, filter, load, render, unique_values, FilterSpec, Record, ValidationError,
};
use proptest::prelude::*;

/// Optional attribute drawn from a small alphabet so values repeat often
fn attribute() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Ca-c ]{1,4}|Centro|Norte|São João|<&\"'>")
        .prop_map(|v| v.filter(|s| !s.is_empty()))
}

fn record() -> impl Strategy<Value = Record> {
    (attribute(), attribute(), attribute(), attribute(), attribute()).prop_map(
        |(client, status, neighborhood, reference, cross_street)| Record {
            client,
            status,
            neighborhood,
            reference,
            cross_street,
        },
    )
}

fn records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record(), 0..24)
}

proptest! {
    /// Property: names outside CLIENTE/SITUAÇÃO/BAIRRO are always rejected
    #[test]
    fn proptest_unknown_field_rejected(name in "\\PC{0,12}", recs in records()) {
        let upper = name.to_uppercase();
        prop_assume!(!["CLIENTE", "SITUAÇÃO", "BAIRRO"].contains(&upper.as_str()));
        prop_assert_eq!(
            unique_values(&recs, &name),
            Err(ValidationError::UnknownField(name.clone()))
        );
    }

    /// Property: canonical names are accepted in any letter case
    #[test]
    fn proptest_canonical_field_any_case(
        idx in 0usize..3,
        mask in prop::collection::vec(any::<bool>(), 8),
        recs in records(),
    ) {
        let canonical = ["CLIENTE", "SITUAÇÃO", "BAIRRO"][idx];
        let name: String = canonical
            .chars()
            .zip(mask.iter().cycle())
            .map(|(c, lower)| if *lower { c.to_lowercase().next().unwrap() } else { c })
            .collect();
        prop_assert!(unique_values(&recs, &name).is_ok());
    }

    /// Property: without substring filters validation never fails
    #[test]
    fn proptest_exact_filters_always_valid(
        client in attribute(),
        status in attribute(),
        neighborhood in attribute(),
    ) {
        let spec = FilterSpec { client, status, neighborhood, ..FilterSpec::default() };
        prop_assert!(spec.validate().is_ok());
    }

    /// Property: 1-2 character substring filters fail, 3+ never fail on length
    #[test]
    fn proptest_substring_length_rule(needle in "\\PC{1,8}", on_reference in any::<bool>()) {
        let spec = if on_reference {
            FilterSpec { reference: Some(needle.clone()), ..FilterSpec::default() }
        } else {
            FilterSpec { cross_street: Some(needle.clone()), ..FilterSpec::default() }
        };
        let result = spec.validate();
        if needle.chars().count() < 3 {
            let is_too_short = matches!(result, Err(ValidationError::FilterTooShort { .. }));
            prop_assert!(is_too_short);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// Property: the empty spec is the identity filter
    #[test]
    fn proptest_empty_spec_identity(recs in records()) {
        let out: Vec<&Record> = filter(&recs, &FilterSpec::default()).unwrap().collect();
        prop_assert!(out.into_iter().eq(recs.iter()));
    }

    /// Property: filtering yields an order-preserving subsequence
    #[test]
    fn proptest_filter_is_subsequence(recs in records(), status in attribute()) {
        let spec = FilterSpec { status: status.clone(), ..FilterSpec::default() };
        let out: Vec<&Record> = filter(&recs, &spec).unwrap().collect();
        let mut rest = recs.iter();
        for hit in &out {
            prop_assert!(rest.any(|r| std::ptr::eq(r, *hit)));
            if let Some(status) = &status {
                prop_assert_eq!(hit.status.as_ref(), Some(status));
            }
        }
    }

    /// Property: unique values are distinct and in first-occurrence order
    #[test]
    fn proptest_unique_values_distinct(recs in records()) {
        let values = unique_values(&recs, "bairro").unwrap();
        let mut expected: Vec<String> = Vec::new();
        for r in &recs {
            let v = r.neighborhood.clone().unwrap_or_default();
            if !expected.contains(&v) {
                expected.push(v);
            }
        }
        prop_assert_eq!(values, expected);
    }

    /// Property: export then reload reproduces the records in order
    #[test]
    fn proptest_export_round_trip(recs in records()) {
        let bytes = render(&recs).unwrap();
        let reloaded = extract(&load(bytes.as_slice()).unwrap());
        prop_assert_eq!(reloaded, recs);
    }
}
