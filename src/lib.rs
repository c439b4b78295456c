//! # toolcatalog
//!
//! Places products from a folder-based tool catalog into a CAD document.
//!
//! The catalog is a tree of product JSON files. Each product can be shown on
//! several holder fixtures; its mesh is authored in the pose of a reference
//! holder and a per-holder transform moves it into the pose for any other
//! holder. Geometry comes from 3MF files.
//!
//! ## Pipeline
//!
//! - [`catalog`] loads products and derives ids and taxonomy from folders
//! - [`resolver`] composes the holder transform for a product and holder
//! - [`placement`] encodes and decodes stored placement strings
//! - [`definition`] finds or creates shared definitions by identity key
//! - [`insert`] places tools, holders and packaging and replays collections
//!
//! ## Example
//!
//! ```no_run
//! use toolcatalog::{CatalogStore, Document, InsertRequest, Inserter, Settings, ThreeMfSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("settings.json")?;
//! let mut catalog = CatalogStore::new(settings.catalog_config());
//! catalog.reload()?;
//!
//! let inserter = Inserter::new(ThreeMfSource, settings.insert_options());
//! let mut doc = Document::new();
//! if let Some(product) = catalog.products().first() {
//!     let holder = product.holders.first();
//!     inserter.insert(&mut doc, &InsertRequest::new(product).with_holder(holder))?;
//! }
//! doc.write_to_file("layout.3mf")?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod collection;
pub mod config;
pub mod definition;
pub mod document;
pub mod error;
pub mod insert;
pub mod locate;
pub mod model;
pub mod opc;
pub mod parser;
pub mod placement;
pub mod resolver;
pub mod transform;
mod writer;

pub use catalog::{
    CatalogConfig, CatalogStore, Filters, Holder, HolderTransform, LoadReport, Product,
};
pub use collection::{Collection, CollectionItem, capture_collection};
pub use config::{BlockLinkMode, InsertMode, PathMapping, Settings};
pub use definition::{
    DefinitionRequest, DefinitionResolver, GeometrySource, Resolution, ThreeMfSource,
    definition_key,
};
pub use document::{Document, DocumentHost};
pub use error::{Error, Result};
pub use insert::{
    BatchProgress, BatchReport, CancellationToken, InsertOptions, InsertOutcome, InsertRequest,
    Inserter, Placed,
};
pub use model::{GeometryObject, Mesh, Model};
pub use placement::{DecodedPlacement, PlacementEntry};
pub use resolver::{ResolvedPlacement, resolve};
pub use transform::Transform;
