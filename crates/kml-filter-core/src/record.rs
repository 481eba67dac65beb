//! The five-attribute placemark projection and its closed field set

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A placemark projected onto the attributes used for filtering and export
///
/// Missing and empty attributes are both `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// `CLIENTE`
    pub client: Option<String>,
    /// `SITUAÇÃO`
    pub status: Option<String>,
    /// `BAIRRO`
    pub neighborhood: Option<String>,
    /// `REFERENCIA`
    pub reference: Option<String>,
    /// `RUA/CRUZAMENTO`
    pub cross_street: Option<String>,
}

impl Record {
    /// Value of one attribute
    #[inline]
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Client => &self.client,
            Field::Status => &self.status,
            Field::Neighborhood => &self.neighborhood,
            Field::Reference => &self.reference,
            Field::CrossStreet => &self.cross_street,
        };
        value.as_deref()
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Client => &mut self.client,
            Field::Status => &mut self.status,
            Field::Neighborhood => &mut self.neighborhood,
            Field::Reference => &mut self.reference,
            Field::CrossStreet => &mut self.cross_street,
        }
    }

    /// Set one attribute; an empty string clears it
    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value.filter(|v| !v.is_empty());
    }

    /// Builder-style [`Record::set`]
    #[must_use]
    pub fn with(mut self, field: Field, value: &str) -> Self {
        self.set(field, Some(value.to_string()));
        self
    }
}

/// Record attribute, keyed by its `ExtendedData` name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `CLIENTE`
    Client,
    /// `SITUAÇÃO`
    Status,
    /// `BAIRRO`
    Neighborhood,
    /// `REFERENCIA`
    Reference,
    /// `RUA/CRUZAMENTO`
    CrossStreet,
}

impl Field {
    /// All attributes in export order
    pub const ALL: [Self; 5] = [
        Self::Client,
        Self::Status,
        Self::Neighborhood,
        Self::Reference,
        Self::CrossStreet,
    ];

    /// Attributes that support distinct-value lookup
    pub const INDEXABLE: [Self; 3] = [Self::Client, Self::Status, Self::Neighborhood];

    /// The case-sensitive `ExtendedData` key
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Client => "CLIENTE",
            Self::Status => "SITUAÇÃO",
            Self::Neighborhood => "BAIRRO",
            Self::Reference => "REFERENCIA",
            Self::CrossStreet => "RUA/CRUZAMENTO",
        }
    }

    /// Exact, case-sensitive key lookup used during extraction
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Resolve a caller-supplied name to an indexable field, ignoring case
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownField`] for anything other than
    /// `CLIENTE`, `SITUAÇÃO` or `BAIRRO`.
    pub fn indexable(name: &str) -> Result<Self, ValidationError> {
        let upper = name.to_uppercase();
        Self::INDEXABLE
            .into_iter()
            .find(|field| field.key() == upper)
            .ok_or_else(|| ValidationError::UnknownField(name.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
