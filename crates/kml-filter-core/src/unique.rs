//! Distinct attribute values in first-occurrence order

use crate::error::ValidationError;
use crate::record::{Field, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Distinct values of `field` across `records`
///
/// Absent values show up once as `""`, at the position of the first record
/// that lacks the attribute.
#[must_use]
pub fn distinct_values(records: &[Record], field: Field) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| record.get(field).unwrap_or_default())
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

/// Distinct values of a field named by the caller
///
/// `field_name` is one of `CLIENTE`, `SITUAÇÃO` or `BAIRRO`, in any case.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownField`] for any other name.
pub fn unique_values(records: &[Record], field_name: &str) -> Result<Vec<String>, ValidationError> {
    let field = Field::indexable(field_name)?;
    Ok(distinct_values(records, field))
}

/// Filter options for every indexable attribute at once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFilters {
    /// Distinct `CLIENTE` values
    pub clientes: Vec<String>,
    /// Distinct `SITUAÇÃO` values
    pub situacoes: Vec<String>,
    /// Distinct `BAIRRO` values
    pub bairros: Vec<String>,
}

impl AvailableFilters {
    /// Collect the distinct values of all indexable attributes
    #[must_use]
    pub fn collect(records: &[Record]) -> Self {
        Self {
            clientes: distinct_values(records, Field::Client),
            situacoes: distinct_values(records, Field::Status),
            bairros: distinct_values(records, Field::Neighborhood),
        }
    }
}
