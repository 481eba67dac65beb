//! Record export to a fresh KML document
//!
//! Every exported placemark carries the same five `ExtendedData` entries, in
//! a fixed order, so the file loads back into identical records.
//!
//! ```no_run
//! use kml_filter::{Exporter, Record};
//!
//! let records = vec![Record::default()];
//! let path = Exporter::default().export(&records)?;
//! println!("Wrote {}", path.display());
//! # Ok::<(), kml_filter::ExportError>(())
//! ```

use crate::document::{Container, Data, ExtendedData, Feature, KmlDocument, Placemark};
use crate::error::ExportError;
use crate::record::{Field, Record};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// OGC KML 2.2 namespace written on the root element
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Stem of exported file names; each export appends a unique suffix
pub const EXPORT_FILE_STEM: &str = "FilteredPlacemarks";

/// Build the export tree: one `Document` holding a placemark per record
pub fn build_document<'a, I>(records: I) -> KmlDocument
where
    I: IntoIterator<Item = &'a Record>,
{
    let features = records
        .into_iter()
        .map(|record| {
            let data = Field::ALL
                .into_iter()
                .map(|field| Data::new(field.key(), record.get(field).unwrap_or_default()))
                .collect();
            Feature::Placemark(Placemark {
                name: Some(record.client.clone().unwrap_or_default()),
                extended_data: Some(ExtendedData { data }),
            })
        })
        .collect();

    KmlDocument::new(Feature::Document(Container {
        name: None,
        features,
    }))
}

/// Serialize a document tree as indented KML
///
/// # Errors
///
/// Returns [`ExportError::Xml`] if writing to `out` fails.
pub fn write_document<W: Write>(doc: &KmlDocument, out: W) -> Result<(), ExportError> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
    ))?;
    if let Some(feature) = &doc.feature {
        write_feature(&mut writer, feature)?;
    }
    writer.write_event(Event::End(BytesEnd::new("kml")))?;
    Ok(())
}

fn write_feature<W: Write>(writer: &mut Writer<W>, feature: &Feature) -> Result<(), ExportError> {
    match feature {
        Feature::Document(container) => write_container(writer, "Document", container),
        Feature::Folder(container) => write_container(writer, "Folder", container),
        Feature::Placemark(placemark) => write_placemark(writer, placemark),
    }
}

fn write_container<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    container: &Container,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if let Some(name) = &container.name {
        write_text_element(writer, "name", name)?;
    }
    for feature in &container.features {
        write_feature(writer, feature)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_placemark<W: Write>(
    writer: &mut Writer<W>,
    placemark: &Placemark,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
    if let Some(name) = &placemark.name {
        write_text_element(writer, "name", name)?;
    }
    if let Some(extended) = &placemark.extended_data {
        writer.write_event(Event::Start(BytesStart::new("ExtendedData")))?;
        for data in &extended.data {
            writer.write_event(Event::Start(
                BytesStart::new("Data").with_attributes([("name", data.name.as_str())]),
            ))?;
            if let Some(value) = &data.value {
                write_text_element(writer, "value", value)?;
            }
            writer.write_event(Event::End(BytesEnd::new("Data")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ExtendedData")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}

/// `<tag>text</tag>` on one line; the text event is written even when empty
fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Render records as KML bytes without touching the filesystem
///
/// # Errors
///
/// Returns [`ExportError::Xml`] if serialization fails.
pub fn render<'a, I>(records: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut bytes = Vec::new();
    write_document(&build_document(records), &mut bytes)?;
    Ok(bytes)
}

/// Writes exported documents into a directory
///
/// Each call to [`Exporter::export`] produces a new
/// `FilteredPlacemarks-<uuid>.kml`, so concurrent exports never share a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exporter {
    dir: PathBuf,
}

impl Default for Exporter {
    /// Export into the system temporary directory
    fn default() -> Self {
        Self::with_dir(std::env::temp_dir())
    }
}

impl Exporter {
    /// Export into `dir`, which must already exist
    #[inline]
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `records` to a new KML file and return its path
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be written.
    pub fn export<'a, I>(&self, records: I) -> Result<PathBuf, ExportError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let doc = build_document(records);
        let count = doc.root_container().map_or(0, |c| c.features.len());

        let mut bytes = Vec::new();
        write_document(&doc, &mut bytes)?;

        let path = self
            .dir
            .join(format!("{EXPORT_FILE_STEM}-{}.kml", Uuid::new_v4()));
        fs::write(&path, bytes)?;

        log::info!("Exported {count} placemarks to {}", path.display());
        Ok(path)
    }
}
