//! Error types for loading, querying and exporting placemarks

use std::io;
use thiserror::Error;

/// Errors raised while loading the backing KML/KMZ document
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// KMZ archive error
    #[error("KMZ archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The stream has no `<kml>` root element
    #[error("Missing <kml> root element")]
    MissingRoot,

    /// Well-formed XML that does not fit the KML schema family
    #[error("Invalid KML structure: {0}")]
    InvalidStructure(String),
}

/// Rejected caller input for a filter or a field lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A substring filter shorter than the minimum length
    #[error("The '{field}' filter must have at least {min} characters")]
    FilterTooShort {
        /// Attribute key of the offending filter (`REFERENCIA`, `RUA/CRUZAMENTO`)
        field: &'static str,
        /// Minimum accepted length, in characters
        min: usize,
    },

    /// A field name outside the indexable set
    #[error("Unknown field: '{0}' (expected CLIENTE, SITUAÇÃO or BAIRRO)")]
    UnknownField(String),
}

/// Errors raised while writing an exported document
#[derive(Debug, Error)]
pub enum ExportError {
    /// I/O error (disk full, permission denied, directory missing)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML serialization error
    #[error("XML writing error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Any error produced by this crate
#[derive(Debug, Error)]
pub enum Error {
    /// Document could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Caller input was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Export failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result type for kml-filter operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_too_short_names_field() {
        let err = ValidationError::FilterTooShort {
            field: "REFERENCIA",
            min: 3,
        };
        assert_eq!(
            err.to_string(),
            "The 'REFERENCIA' filter must have at least 3 characters"
        );
    }

    #[test]
    fn test_umbrella_is_transparent() {
        let err: Error = ValidationError::UnknownField("CIDADE".to_string()).into();
        assert!(err.to_string().contains("CIDADE"));
        assert!(matches!(err, Error::Validation(_)));
    }
}
