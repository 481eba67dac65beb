//! Immutable placemark snapshot and the operations served from it

use crate::document::{self, KmlDocument};
use crate::error::{ExportError, LoadError, ValidationError};
use crate::export::Exporter;
use crate::extract::extract;
use crate::filter::{filter, FilterSpec};
use crate::record::Record;
use crate::unique::{unique_values, AvailableFilters};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Records extracted once from the backing document, plus export settings
///
/// Cloning is cheap and clones share the same records, so one snapshot can
/// be handed to any number of concurrent readers.
#[derive(Debug, Clone)]
pub struct PlacemarkService {
    records: Arc<[Record]>,
    exporter: Exporter,
}

impl PlacemarkService {
    /// Build a snapshot from records already in memory
    pub fn new(records: impl Into<Arc<[Record]>>, exporter: Exporter) -> Self {
        Self {
            records: records.into(),
            exporter,
        }
    }

    /// Build a snapshot from a parsed document
    #[must_use]
    pub fn from_document(doc: &KmlDocument, exporter: Exporter) -> Self {
        Self::new(extract(doc), exporter)
    }

    /// Load and extract a KML/KMZ file
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file is missing or malformed.
    pub fn open<P: AsRef<Path>>(path: P, exporter: Exporter) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let service = Self::from_document(&document::load_path(path)?, exporter);
        log::info!(
            "Loaded {} placemarks from {}",
            service.records.len(),
            path.display()
        );
        Ok(service)
    }

    /// Load and extract a KML byte stream
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the stream is unreadable or malformed.
    pub fn from_reader<R: BufRead>(reader: R, exporter: Exporter) -> Result<Self, LoadError> {
        Ok(Self::from_document(&document::load(reader)?, exporter))
    }

    /// All records in document order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Export settings
    #[inline]
    #[must_use]
    pub const fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Records matching `spec`, lazily, in document order
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FilterTooShort`] for a too-short substring filter.
    pub fn filter_records(
        &self,
        spec: &FilterSpec,
    ) -> Result<impl Iterator<Item = &Record>, ValidationError> {
        filter(&self.records, spec)
    }

    /// Distinct values of `CLIENTE`, `SITUAÇÃO` or `BAIRRO`
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownField`] for any other field name.
    pub fn unique_values(&self, field_name: &str) -> Result<Vec<String>, ValidationError> {
        unique_values(&self.records, field_name)
    }

    /// Distinct values of all three indexable fields
    #[must_use]
    pub fn available_filters(&self) -> AvailableFilters {
        AvailableFilters::collect(&self.records)
    }

    /// Write `records` to a new KML file
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if the file cannot be written.
    pub fn export_records<'a, I>(&self, records: I) -> Result<PathBuf, ExportError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        self.exporter.export(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<kml><Document>
        <Placemark><ExtendedData>
          <Data name="CLIENTE"><value>X</value></Data>
          <Data name="BAIRRO"><value>Centro</value></Data>
        </ExtendedData></Placemark>
        <Folder><Placemark><ExtendedData>
          <Data name="CLIENTE"><value>Y</value></Data>
          <Data name="BAIRRO"><value>Centro</value></Data>
        </ExtendedData></Placemark></Folder>
        <Placemark><ExtendedData>
          <Data name="CLIENTE"><value>X</value></Data>
          <Data name="BAIRRO"><value>Norte</value></Data>
        </ExtendedData></Placemark>
    </Document></kml>"#;

    fn service() -> PlacemarkService {
        PlacemarkService::from_reader(DOC.as_bytes(), Exporter::default()).unwrap()
    }

    #[test]
    fn test_service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlacemarkService>();
    }

    #[test]
    fn test_filter_then_export() {
        let service = service();
        let dir = tempfile::tempdir().unwrap();
        let service = PlacemarkService::new(service.records().to_vec(), Exporter::with_dir(dir.path()));

        let spec = FilterSpec {
            client: Some("X".into()),
            ..FilterSpec::default()
        };
        let path = service
            .export_records(service.filter_records(&spec).unwrap())
            .unwrap();

        let exported = PlacemarkService::open(&path, Exporter::default()).unwrap();
        assert_eq!(exported.unique_values("bairro").unwrap(), ["Centro", "Norte"]);
        assert_eq!(service.records().len(), 3, "export must not touch the snapshot");
    }

    #[test]
    fn test_clones_share_records() {
        let a = service();
        let b = a.clone();
        assert!(std::ptr::eq(a.records(), b.records()));
    }

    #[test]
    fn test_available_filters() {
        let filters = service().available_filters();
        assert_eq!(filters.clientes, ["X", "Y"]);
        assert_eq!(filters.bairros, ["Centro", "Norte"]);
        assert_eq!(filters.situacoes, [""]);
    }
}
