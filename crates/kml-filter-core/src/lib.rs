//! # kml-filter-core
//!
//! Placemark extraction, filtering and KML export.
//!
//! A KML document is loaded once, its placemarks are projected into
//! [`Record`]s, and the resulting snapshot answers three kinds of queries:
//! attribute filters, distinct-value lookups and re-export of a subset as a
//! new KML file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kml_filter::{Exporter, FilterSpec, PlacemarkService};
//!
//! let service = PlacemarkService::open("content/DIRECIONADORES1.kml", Exporter::default())?;
//!
//! // Filter options
//! let bairros = service.unique_values("BAIRRO")?;
//! println!("Neighborhoods: {bairros:?}");
//!
//! // Query
//! let spec = FilterSpec {
//!     neighborhood: Some("Centro".into()),
//!     reference: Some("avenida".into()),
//!     ..FilterSpec::default()
//! };
//! let hits: Vec<_> = service.filter_records(&spec)?.collect();
//!
//! // Download
//! let path = service.export_records(hits)?;
//! println!("Exported to {}", path.display());
//! # Ok::<(), kml_filter::Error>(())
//! ```
//!
//! ## Record Attributes
//!
//! | Field | `ExtendedData` key | Filter |
//! |-------|--------------------|--------|
//! | `client` | `CLIENTE` | exact |
//! | `status` | `SITUAÇÃO` | exact |
//! | `neighborhood` | `BAIRRO` | exact |
//! | `reference` | `REFERENCIA` | substring, ignores case, ≥ 3 chars |
//! | `cross_street` | `RUA/CRUZAMENTO` | substring, ignores case, ≥ 3 chars |
//!
//! Missing and empty attributes are both `None`. A substring filter never
//! matches a record that lacks the attribute.
//!
//! ## Document Model
//!
//! `kml → Document | Folder` with containers nested to any depth. Placemarks
//! are visited depth-first in document order; only `<name>` and
//! `ExtendedData/Data` are kept. KMZ archives are read through their
//! embedded `doc.kml`.
//!
//! ## Error Handling
//!
//! ```no_run
//! use kml_filter::{Error, Exporter, PlacemarkService, ValidationError};
//!
//! let service = PlacemarkService::open("map.kml", Exporter::default())?;
//! match service.unique_values("CIDADE") {
//!     Ok(values) => println!("{values:?}"),
//!     Err(ValidationError::UnknownField(name)) => println!("No such field: {name}"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! # Ok::<(), Error>(())
//! ```

pub mod document;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod record;
pub mod service;
pub mod unique;

pub use document::{load, load_path, KmlDocument, MAX_DEPTH};
pub use error::{Error, ExportError, LoadError, Result, ValidationError};
pub use export::{render, Exporter};
pub use extract::extract;
pub use filter::{filter, FilterSpec, RecordFilter, MIN_SUBSTRING_LEN};
pub use record::{Field, Record};
pub use service::PlacemarkService;
pub use unique::{unique_values, AvailableFilters};
