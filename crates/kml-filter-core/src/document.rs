//! KML document tree and loader
//!
//! Reads a KML (or zipped KMZ) byte stream into a small in-memory tree that
//! keeps only what placemark extraction needs:
//! - `Document` and `Folder` containers, nested to any depth
//! - `Placemark` leaves with their display name
//! - `ExtendedData/Data` name/value pairs
//!
//! Anything else (styles, geometry, overlays, network links, schema data) is
//! skipped as a whole subtree.
//!
//! ## Example
//!
//! ```no_run
//! use kml_filter::document::load_path;
//!
//! let doc = load_path("content/DIRECIONADORES1.kml")?;
//! println!("Root is a container: {}", doc.root_container().is_some());
//! # Ok::<(), kml_filter::LoadError>(())
//! ```

use crate::error::LoadError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

/// Deepest `Document`/`Folder` nesting accepted by the loader
pub const MAX_DEPTH: usize = 512;

/// Parsed KML document: the `<kml>` root and its single top-level feature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmlDocument {
    /// Top-level feature, `None` for an empty `<kml/>`
    pub feature: Option<Feature>,
}

impl KmlDocument {
    /// Wrap a feature in a document root
    #[inline]
    #[must_use]
    pub const fn new(feature: Feature) -> Self {
        Self {
            feature: Some(feature),
        }
    }

    /// The top-level container, if the root feature is a `Document` or `Folder`
    #[inline]
    #[must_use]
    pub fn root_container(&self) -> Option<&Container> {
        self.feature.as_ref().and_then(Feature::as_container)
    }
}

/// A KML feature this crate understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    /// `<Document>` container
    Document(Container),
    /// `<Folder>` container
    Folder(Container),
    /// `<Placemark>` leaf
    Placemark(Placemark),
}

impl Feature {
    /// Borrow the container behind a `Document` or `Folder`
    #[inline]
    #[must_use]
    pub const fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Document(container) | Self::Folder(container) => Some(container),
            Self::Placemark(_) => None,
        }
    }
}

/// Body shared by `Document` and `Folder`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    /// Container `<name>`
    pub name: Option<String>,
    /// Child features in document order
    pub features: Vec<Feature>,
}

/// A point of interest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    /// Display `<name>`
    pub name: Option<String>,
    /// `<ExtendedData>` block, if present
    pub extended_data: Option<ExtendedData>,
}

/// Ordered `<Data>` entries of a placemark
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedData {
    /// Entries in document order
    pub data: Vec<Data>,
}

/// One `<Data name="...">` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    /// The `name` attribute
    pub name: String,
    /// Text of the `<value>` child, `None` when the child is missing
    pub value: Option<String>,
}

impl Data {
    /// Create a data entry
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Load a KML document from any buffered byte stream
///
/// # Errors
///
/// Returns [`LoadError::Xml`] for malformed XML, [`LoadError::MissingRoot`]
/// when there is no `<kml>` element, and [`LoadError::InvalidStructure`] for
/// a foreign root element, a truncated document, or containers nested
/// deeper than [`MAX_DEPTH`].
///
/// Input in the encoding named by its XML declaration (for example
/// `ISO-8859-1`) is decoded to UTF-8; undeclared input is read as UTF-8.
pub fn load<R: BufRead>(reader: R) -> Result<KmlDocument, LoadError> {
    let doc = KmlParser::new(reader).parse_document()?;
    log::debug!(
        "Loaded KML document (root container: {})",
        doc.root_container().is_some()
    );
    Ok(doc)
}

/// Load a KML document from a string
///
/// # Errors
///
/// Same as [`load`].
#[inline]
pub fn load_str(xml: &str) -> Result<KmlDocument, LoadError> {
    load(xml.as_bytes())
}

/// Load a KML or KMZ file
///
/// Files with a `.kmz` extension are opened as ZIP archives and the embedded
/// `doc.kml` (or the first `.kml` entry) is parsed.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be opened, [`LoadError::Zip`]
/// for a broken KMZ archive, and any error from [`load`].
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<KmlDocument, LoadError> {
    let path = path.as_ref();

    let is_kmz = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("kmz"));

    let file = File::open(path)?;
    log::debug!("Opening {} ({})", path.display(), if is_kmz { "KMZ" } else { "KML" });

    if is_kmz {
        load_kmz(file)
    } else {
        load(BufReader::new(file))
    }
}

/// Load the KML document embedded in a KMZ archive
///
/// # Errors
///
/// Returns [`LoadError::Zip`] if the archive cannot be read and
/// [`LoadError::InvalidStructure`] if it holds no `.kml` entry.
pub fn load_kmz<R: Read + Seek>(archive: R) -> Result<KmlDocument, LoadError> {
    let mut zip = zip::ZipArchive::new(archive)?;

    let mut kml_entry = None;
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        let name = entry.name();
        if name.eq_ignore_ascii_case("doc.kml") {
            kml_entry = Some(i);
            break;
        }
        if kml_entry.is_none()
            && Path::new(name)
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("kml"))
        {
            kml_entry = Some(i);
        }
    }

    let index = kml_entry
        .ok_or_else(|| LoadError::InvalidStructure("No KML file found in KMZ archive".into()))?;

    let mut content = Vec::new();
    zip.by_index(index)?.read_to_end(&mut content)?;
    load(content.as_slice())
}

/// Owned summary of one XML event, detached from the read buffer
enum Node {
    Open(Tag),
    Empty(Tag),
    Close,
    Text(String),
    Eof,
    Skip,
}

struct Tag {
    qname: Vec<u8>,
    local: Vec<u8>,
    name_attr: Option<String>,
}

impl Tag {
    fn from_start<R>(start: &BytesStart<'_>, reader: &Reader<R>) -> Result<Self, LoadError> {
        let mut name_attr = None;
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.local_name().as_ref() == b"name" {
                name_attr = Some(attr.decode_and_unescape_value(reader)?.into_owned());
            }
        }
        Ok(Self {
            qname: start.name().as_ref().to_vec(),
            local: start.local_name().as_ref().to_vec(),
            name_attr,
        })
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.qname).into_owned()
    }
}

struct KmlParser<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
}

impl<R: BufRead> KmlParser<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
            depth: 0,
        }
    }

    fn next(&mut self) -> Result<Node, LoadError> {
        let decoder = self.reader.decoder();
        let node = match self.reader.read_event_into(&mut self.buf)? {
            Event::Start(e) => Node::Open(Tag::from_start(&e, &self.reader)?),
            Event::Empty(e) => Node::Empty(Tag::from_start(&e, &self.reader)?),
            Event::End(_) => Node::Close,
            Event::Text(e) => Node::Text(e.unescape()?.into_owned()),
            Event::CData(e) => Node::Text(decoder.decode(&e)?.into_owned()),
            Event::Eof => Node::Eof,
            _ => Node::Skip,
        };
        self.buf.clear();
        Ok(node)
    }

    /// Consume the rest of an element whose start tag was just read
    fn skip(&mut self, tag: &Tag) -> Result<(), LoadError> {
        self.reader
            .read_to_end_into(QName(&tag.qname), &mut self.buf)?;
        self.buf.clear();
        Ok(())
    }

    fn truncated(tag: &str) -> LoadError {
        LoadError::InvalidStructure(format!("Unexpected end of document inside <{tag}>"))
    }

    fn parse_document(&mut self) -> Result<KmlDocument, LoadError> {
        loop {
            match self.next()? {
                Node::Open(tag) if tag.local == b"kml" => {
                    let feature = self.parse_kml_body()?;
                    self.finish()?;
                    return Ok(KmlDocument { feature });
                }
                Node::Empty(tag) if tag.local == b"kml" => {
                    self.finish()?;
                    return Ok(KmlDocument::default());
                }
                Node::Open(tag) | Node::Empty(tag) => {
                    return Err(LoadError::InvalidStructure(format!(
                        "Expected <kml> root element, found <{}>",
                        tag.display()
                    )));
                }
                Node::Eof => return Err(LoadError::MissingRoot),
                Node::Close | Node::Text(_) | Node::Skip => {}
            }
        }
    }

    /// Drain trailing events so errors after `</kml>` still surface
    fn finish(&mut self) -> Result<(), LoadError> {
        loop {
            match self.next()? {
                Node::Eof => return Ok(()),
                Node::Open(tag) | Node::Empty(tag) => {
                    return Err(LoadError::InvalidStructure(format!(
                        "Unexpected <{}> after </kml>",
                        tag.display()
                    )));
                }
                Node::Close | Node::Text(_) | Node::Skip => {}
            }
        }
    }

    fn parse_kml_body(&mut self) -> Result<Option<Feature>, LoadError> {
        let mut root = None;
        loop {
            match self.next()? {
                Node::Open(tag) => {
                    if root.is_some() {
                        log::warn!("Ignoring extra top-level <{}>", tag.display());
                        self.skip(&tag)?;
                    } else {
                        root = self.parse_feature(&tag, false)?;
                    }
                }
                Node::Empty(tag) => {
                    if root.is_none() {
                        root = self.parse_feature(&tag, true)?;
                    }
                }
                Node::Close => return Ok(root),
                Node::Eof => return Err(Self::truncated("kml")),
                Node::Text(_) | Node::Skip => {}
            }
        }
    }

    /// Parse a feature element, or skip it when it is not one we model
    fn parse_feature(&mut self, tag: &Tag, empty: bool) -> Result<Option<Feature>, LoadError> {
        let feature = match tag.local.as_slice() {
            b"Document" if empty => Feature::Document(Container::default()),
            b"Folder" if empty => Feature::Folder(Container::default()),
            b"Placemark" if empty => Feature::Placemark(Placemark::default()),
            b"Document" => Feature::Document(self.parse_container(tag)?),
            b"Folder" => Feature::Folder(self.parse_container(tag)?),
            b"Placemark" => Feature::Placemark(self.parse_placemark(tag)?),
            _ => {
                if !empty {
                    self.skip(tag)?;
                }
                return Ok(None);
            }
        };
        Ok(Some(feature))
    }

    fn parse_container(&mut self, open: &Tag) -> Result<Container, LoadError> {
        if self.depth >= MAX_DEPTH {
            return Err(LoadError::InvalidStructure(format!(
                "Containers nested deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let container = self.parse_container_body(open);
        self.depth -= 1;
        container
    }

    fn parse_container_body(&mut self, open: &Tag) -> Result<Container, LoadError> {
        let mut container = Container::default();
        loop {
            match self.next()? {
                Node::Open(tag) if tag.local == b"name" => {
                    container.name = Some(self.read_text(&tag)?);
                }
                Node::Empty(tag) if tag.local == b"name" => {
                    container.name = Some(String::new());
                }
                Node::Open(tag) => {
                    if let Some(feature) = self.parse_feature(&tag, false)? {
                        container.features.push(feature);
                    }
                }
                Node::Empty(tag) => {
                    if let Some(feature) = self.parse_feature(&tag, true)? {
                        container.features.push(feature);
                    }
                }
                Node::Close => return Ok(container),
                Node::Eof => return Err(Self::truncated(&open.display())),
                Node::Text(_) | Node::Skip => {}
            }
        }
    }

    fn parse_placemark(&mut self, open: &Tag) -> Result<Placemark, LoadError> {
        let mut placemark = Placemark::default();
        loop {
            match self.next()? {
                Node::Open(tag) => match tag.local.as_slice() {
                    b"name" => placemark.name = Some(self.read_text(&tag)?),
                    b"ExtendedData" => {
                        placemark.extended_data = Some(self.parse_extended_data(&tag)?);
                    }
                    _ => self.skip(&tag)?,
                },
                Node::Empty(tag) => match tag.local.as_slice() {
                    b"name" => placemark.name = Some(String::new()),
                    b"ExtendedData" => placemark.extended_data = Some(ExtendedData::default()),
                    _ => {}
                },
                Node::Close => return Ok(placemark),
                Node::Eof => return Err(Self::truncated(&open.display())),
                Node::Text(_) | Node::Skip => {}
            }
        }
    }

    fn parse_extended_data(&mut self, open: &Tag) -> Result<ExtendedData, LoadError> {
        let mut extended = ExtendedData::default();
        loop {
            match self.next()? {
                Node::Open(tag) if tag.local == b"Data" => {
                    let value = self.parse_data_value(&tag)?;
                    if let Some(name) = tag.name_attr {
                        extended.data.push(Data { name, value });
                    } else {
                        log::debug!("Skipping <Data> without a name attribute");
                    }
                }
                Node::Empty(tag) if tag.local == b"Data" => {
                    if let Some(name) = tag.name_attr {
                        extended.data.push(Data { name, value: None });
                    }
                }
                // SchemaData and foreign-namespace extensions are not projected
                Node::Open(tag) => self.skip(&tag)?,
                Node::Close => return Ok(extended),
                Node::Eof => return Err(Self::truncated(&open.display())),
                Node::Empty(_) | Node::Text(_) | Node::Skip => {}
            }
        }
    }

    fn parse_data_value(&mut self, open: &Tag) -> Result<Option<String>, LoadError> {
        let mut value = None;
        loop {
            match self.next()? {
                Node::Open(tag) if tag.local == b"value" => value = Some(self.read_text(&tag)?),
                Node::Empty(tag) if tag.local == b"value" => value = Some(String::new()),
                Node::Open(tag) => self.skip(&tag)?,
                Node::Close => return Ok(value),
                Node::Eof => return Err(Self::truncated(&open.display())),
                Node::Empty(_) | Node::Text(_) | Node::Skip => {}
            }
        }
    }

    /// Collect text and CDATA verbatim up to the matching end tag
    fn read_text(&mut self, open: &Tag) -> Result<String, LoadError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Node::Text(chunk) => text.push_str(&chunk),
                Node::Open(tag) => self.skip(&tag)?,
                Node::Close => return Ok(text),
                Node::Eof => return Err(Self::truncated(&open.display())),
                Node::Empty(_) | Node::Skip => {}
            }
        }
    }
}
