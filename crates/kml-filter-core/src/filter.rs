//! Filter specification, validation and evaluation
//!
//! `client`, `status` and `neighborhood` match exactly (case-sensitive);
//! `reference` and `cross_street` match as case-insensitive substrings and
//! must be at least [`MIN_SUBSTRING_LEN`] characters long. Empty fields do
//! not constrain anything.
//!
//! ```
//! use kml_filter::{FilterSpec, Record, filter};
//!
//! let records = vec![Record { neighborhood: Some("Centro".into()), ..Record::default() }];
//! let spec = FilterSpec { neighborhood: Some("Centro".into()), ..FilterSpec::default() };
//! assert_eq!(filter(&records, &spec)?.count(), 1);
//! # Ok::<(), kml_filter::ValidationError>(())
//! ```

use crate::error::ValidationError;
use crate::record::{Field, Record};
use serde::{Deserialize, Serialize};

/// Minimum length of a substring filter, in characters
pub const MIN_SUBSTRING_LEN: usize = 3;

/// Caller-supplied query over [`Record`] attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Exact `CLIENTE`
    pub client: Option<String>,
    /// Exact `SITUAÇÃO`
    pub status: Option<String>,
    /// Exact `BAIRRO`
    pub neighborhood: Option<String>,
    /// Substring of `REFERENCIA`, ignoring case
    pub reference: Option<String>,
    /// Substring of `RUA/CRUZAMENTO`, ignoring case
    pub cross_street: Option<String>,
}

impl FilterSpec {
    /// Check substring filter lengths
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FilterTooShort`] naming the first substring
    /// filter that is non-empty but shorter than [`MIN_SUBSTRING_LEN`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            (Field::Reference, &self.reference),
            (Field::CrossStreet, &self.cross_street),
        ] {
            if let Some(value) = non_empty(value) {
                if value.chars().count() < MIN_SUBSTRING_LEN {
                    return Err(ValidationError::FilterTooShort {
                        field: field.key(),
                        min: MIN_SUBSTRING_LEN,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and build a reusable predicate
    ///
    /// # Errors
    ///
    /// See [`FilterSpec::validate`].
    pub fn compile(&self) -> Result<RecordFilter, ValidationError> {
        self.validate()?;

        let mut clauses = Vec::new();
        for (field, value) in [
            (Field::Client, &self.client),
            (Field::Status, &self.status),
            (Field::Neighborhood, &self.neighborhood),
        ] {
            if let Some(value) = non_empty(value) {
                clauses.push(Clause::Equals(field, value.to_string()));
            }
        }
        for (field, value) in [
            (Field::Reference, &self.reference),
            (Field::CrossStreet, &self.cross_street),
        ] {
            if let Some(value) = non_empty(value) {
                clauses.push(Clause::Contains(field, value.chars().map(fold_case).collect()));
            }
        }
        Ok(RecordFilter { clauses })
    }

    /// Whether no field constrains the result
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.client,
            &self.status,
            &self.neighborhood,
            &self.reference,
            &self.cross_street,
        ]
        .into_iter()
        .all(|value| non_empty(value).is_none())
    }
}

#[inline]
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Equals(Field, String),
    /// Needle is stored case-folded, one `char` per input `char`
    Contains(Field, Box<[char]>),
}

impl Clause {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Equals(field, expected) => record.get(*field) == Some(expected.as_str()),
            Self::Contains(field, needle) => record
                .get(*field)
                .is_some_and(|value| contains_ignore_case(value, needle)),
        }
    }
}

/// Simple (one-to-one) upper-case mapping
///
/// Characters whose upper case expands to several characters, such as `ß`,
/// map to themselves, so both final and medial sigma fold to `Σ` while `ß`
/// only matches `ß`.
#[inline]
fn fold_case(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Whether `haystack` contains `needle` (already folded) ignoring case
fn contains_ignore_case(haystack: &str, needle: &[char]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.char_indices().any(|(start, _)| {
        let mut rest = haystack[start..].chars();
        needle
            .iter()
            .all(|&n| rest.next().is_some_and(|c| fold_case(c) == n))
    })
}

/// A validated [`FilterSpec`], ready to test records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    clauses: Vec<Clause>,
}

impl RecordFilter {
    /// Whether `record` satisfies every clause
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }

    /// Lazily select matching records, preserving order
    pub fn apply<'a, I>(self, records: I) -> impl Iterator<Item = &'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().filter(move |record| self.matches(record))
    }
}

/// Validate `spec` and lazily select the matching records
///
/// # Errors
///
/// Returns [`ValidationError::FilterTooShort`] when a substring filter is
/// shorter than [`MIN_SUBSTRING_LEN`].
pub fn filter<'a>(
    records: &'a [Record],
    spec: &FilterSpec,
) -> Result<impl Iterator<Item = &'a Record>, ValidationError> {
    Ok(spec.compile()?.apply(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::default()
                .with(Field::Client, "X")
                .with(Field::Neighborhood, "Centro")
                .with(Field::Reference, "Avenida Brasil"),
            Record::default()
                .with(Field::Client, "Y")
                .with(Field::Neighborhood, "Centro"),
            Record::default()
                .with(Field::Client, "X")
                .with(Field::Neighborhood, "Norte")
                .with(Field::CrossStreet, "Rua das Flores x Rua B"),
        ]
    }

    fn clients<'a>(records: impl Iterator<Item = &'a Record>) -> Vec<&'a str> {
        records.map(|r| r.client.as_deref().unwrap_or("")).collect()
    }

    #[test]
    fn test_empty_spec_is_identity() {
        let records = sample();
        let spec = FilterSpec::default();
        assert!(spec.is_empty());
        let all: Vec<_> = filter(&records, &spec).unwrap().collect();
        assert_eq!(all.len(), 3);
        assert!(all.iter().zip(&records).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn test_exact_match_neighborhood() {
        let records = sample();
        let spec = FilterSpec {
            neighborhood: Some("Centro".into()),
            ..FilterSpec::default()
        };
        assert_eq!(clients(filter(&records, &spec).unwrap()), ["X", "Y"]);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let records = sample();
        let spec = FilterSpec {
            neighborhood: Some("centro".into()),
            ..FilterSpec::default()
        };
        assert_eq!(filter(&records, &spec).unwrap().count(), 0);
    }

    #[test]
    fn test_conjunction() {
        let records = sample();
        let spec = FilterSpec {
            client: Some("X".into()),
            neighborhood: Some("Norte".into()),
            ..FilterSpec::default()
        };
        let hits: Vec<_> = filter(&records, &spec).unwrap().collect();
        assert_eq!(hits, [&records[2]]);
    }

    #[test]
    fn test_substring_ignores_case_and_skips_absent() {
        let records = sample();
        let spec = FilterSpec {
            reference: Some("AVENIDA".into()),
            ..FilterSpec::default()
        };
        let hits: Vec<_> = filter(&records, &spec).unwrap().collect();
        assert_eq!(hits, [&records[0]]);

        let spec = FilterSpec {
            cross_street: Some("flores".into()),
            ..FilterSpec::default()
        };
        let hits: Vec<_> = filter(&records, &spec).unwrap().collect();
        assert_eq!(hits, [&records[2]]);
    }

    #[test]
    fn test_short_substring_rejected() {
        let records = sample();
        let spec = FilterSpec {
            reference: Some("av".into()),
            ..FilterSpec::default()
        };
        assert_eq!(
            filter(&records, &spec).err(),
            Some(ValidationError::FilterTooShort {
                field: "REFERENCIA",
                min: 3
            })
        );

        let spec = FilterSpec {
            cross_street: Some("r".into()),
            ..FilterSpec::default()
        };
        assert_eq!(
            spec.validate(),
            Err(ValidationError::FilterTooShort {
                field: "RUA/CRUZAMENTO",
                min: 3
            })
        );
    }

    #[test]
    fn test_short_reference_rejected_where_longer_matches() {
        let records = vec![
            Record::default()
                .with(Field::Client, "A")
                .with(Field::Reference, "Avenida Brasil"),
            Record::default().with(Field::Client, "B"),
        ];
        let short = FilterSpec {
            reference: Some("av".into()),
            ..FilterSpec::default()
        };
        assert!(matches!(
            filter(&records, &short),
            Err(ValidationError::FilterTooShort { field: "REFERENCIA", min: 3 })
        ));

        let longer = FilterSpec {
            reference: Some("ave".into()),
            ..FilterSpec::default()
        };
        assert_eq!(clients(filter(&records, &longer).unwrap()), ["A"]);
    }

    #[test]
    fn test_contains_ignore_case_folding() {
        let folded = |s: &str| s.chars().map(fold_case).collect::<Vec<_>>();
        assert!(contains_ignore_case("Praça da SÉ", &folded("sé")));
        assert!(contains_ignore_case("ΟΔΟΣ", &folded("οδος")));
        assert!(contains_ignore_case("οδοσ", &folded("ΟΔΟς")));
        assert!(contains_ignore_case("Straße 1", &folded("STRAßE")));
        assert!(!contains_ignore_case("Straße 1", &folded("STRASSE")));
        assert!(!contains_ignore_case("ab", &folded("abc")));
        assert!(contains_ignore_case("", &[]));
    }

    #[test]
    fn test_length_counts_characters() {
        let spec = FilterSpec {
            reference: Some("çãé".into()),
            ..FilterSpec::default()
        };
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_empty_strings_do_not_constrain() {
        let records = sample();
        let spec = FilterSpec {
            client: Some(String::new()),
            reference: Some(String::new()),
            cross_street: Some(String::new()),
            ..FilterSpec::default()
        };
        assert!(spec.is_empty());
        assert_eq!(filter(&records, &spec).unwrap().count(), 3);
    }

    #[test]
    fn test_deserialize_partial_spec() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"neighborhood":"Centro","crossStreet":"Rua"}"#).unwrap();
        assert_eq!(spec.neighborhood.as_deref(), Some("Centro"));
        assert_eq!(spec.cross_street.as_deref(), Some("Rua"));
        assert_eq!(spec.client, None);
    }
}
