//! Definition resolution and deduplication
//!
//! Every definition lookup and registration goes through [`definition_key`],
//! so the key a definition is stored under is the key later lookups use.

use crate::catalog::Holder;
use crate::document::{DefinitionId, DefinitionSource, Document};
use crate::error::{Error, Result};
use crate::model::{GeometryObject, Model};
use crate::transform::Transform;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identity key of a definition
///
/// The file's base name alone, or `"{base}_{variant}_{color}"` when a holder
/// variant is given. A missing color leaves the trailing segment empty.
pub fn definition_key(file_base_name: &str, variant: Option<&str>, color: Option<&str>) -> String {
    match variant.filter(|v| !v.is_empty()) {
        Some(variant) => format!("{}_{}_{}", file_base_name, variant, color.unwrap_or("")),
        None => file_base_name.to_string(),
    }
}

/// [`definition_key`] for a geometry file and an optional holder
pub fn definition_key_for_path(path: &Path, holder: Option<&Holder>) -> String {
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    definition_key(
        &base,
        holder.map(|h| h.variant.as_str()),
        holder.map(|h| h.color.as_str()),
    )
}

/// Reads geometry files into standalone objects
///
/// Implementations must return owned copies; nothing in the result may refer
/// back into the file once the call returns.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use toolcatalog::{GeometryObject, GeometrySource, Result};
///
/// struct Empty;
///
/// impl GeometrySource for Empty {
///     fn read_geometry(&self, _path: &Path) -> Result<Vec<GeometryObject>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait GeometrySource: Send + Sync {
    /// Read every geometry object of a file, in millimetres
    ///
    /// # Arguments
    ///
    /// * `path` - The geometry file
    fn read_geometry(&self, path: &Path) -> Result<Vec<GeometryObject>>;
}

impl<S: GeometrySource + ?Sized> GeometrySource for &S {
    fn read_geometry(&self, path: &Path) -> Result<Vec<GeometryObject>> {
        (**self).read_geometry(path)
    }
}

/// Reads 3MF packages and flattens their build
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeMfSource;

impl GeometrySource for ThreeMfSource {
    fn read_geometry(&self, path: &Path) -> Result<Vec<GeometryObject>> {
        let objects = Model::from_file(path)?.flatten()?;
        if objects.is_empty() {
            return Err(Error::InvalidModel(format!(
                "{} contains no geometry",
                path.display()
            )));
        }
        Ok(objects)
    }
}

/// What to resolve: a file, the key to register it under, and how
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRequest {
    /// Geometry file
    pub path: PathBuf,
    /// Identity key
    pub key: String,
    /// Transform applied to the geometry before registration
    pub bake: Transform,
    /// Register the definition as linked to `path`
    pub link: bool,
}

impl DefinitionRequest {
    /// Request `path` under `key`, embedded and unbaked
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            bake: Transform::identity(),
            link: false,
        }
    }

    /// Bake `transform` into newly registered geometry
    pub fn baked(mut self, transform: Transform) -> Self {
        self.bake = transform;
        self
    }

    /// Set the link policy
    pub fn linked(mut self, link: bool) -> Self {
        self.link = link;
        self
    }
}

/// A resolved definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// The definition
    pub id: DefinitionId,
    /// Whether this call registered it
    pub created: bool,
    /// The pose baked into the definition's geometry
    ///
    /// May differ from the request's when an existing definition was reused.
    pub baked: Transform,
}

/// Finds or creates definitions in a document
#[derive(Debug, Clone, Default)]
pub struct DefinitionResolver<S> {
    source: S,
}

impl<S: GeometrySource> DefinitionResolver<S> {
    /// A resolver reading geometry through `source`
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The geometry source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the definition registered under the request's key, creating it
    /// from the file when the document has none
    ///
    /// An existing definition is returned without touching the file. Read
    /// failures come back as [`Error::DefinitionCreation`].
    pub fn resolve(&self, doc: &mut Document, request: &DefinitionRequest) -> Result<Resolution> {
        if let Some(existing) = lookup(doc, &request.key) {
            return Ok(existing);
        }
        let objects = self.read(request)?;
        register(doc, request, objects)
    }

    /// Read the request's geometry without touching any document
    pub fn read(&self, request: &DefinitionRequest) -> Result<Vec<GeometryObject>> {
        self.source
            .read_geometry(&request.path)
            .map_err(|e| Error::definition_creation(&request.key, &request.path, e))
    }
}

/// The definition already registered under `key`, if any
pub fn lookup(doc: &Document, key: &str) -> Option<Resolution> {
    let existing = doc.find_definition(key)?;
    debug!(key, "reusing definition");
    Some(Resolution {
        id: existing.id,
        created: false,
        baked: existing.baked,
    })
}

/// Register geometry read earlier under the request's key
///
/// When the key is already taken the existing definition wins and `objects`
/// is discarded.
pub fn register(
    doc: &mut Document,
    request: &DefinitionRequest,
    objects: Vec<GeometryObject>,
) -> Result<Resolution> {
    if let Some(existing) = lookup(doc, &request.key) {
        return Ok(existing);
    }

    let objects = if request.bake.is_identity() {
        objects
    } else {
        objects.iter().map(|o| o.transformed(&request.bake)).collect()
    };
    let source = if request.link {
        DefinitionSource::Linked {
            path: request.path.clone(),
        }
    } else {
        DefinitionSource::Embedded
    };

    let count = objects.len();
    let id = doc
        .add_definition(request.key.clone(), objects, source, request.bake)
        .map_err(|e| Error::definition_creation(&request.key, &request.path, e))?;
    info!(key = %request.key, objects = count, linked = request.link, "created definition");

    Ok(Resolution {
        id,
        created: true,
        baked: request.bake,
    })
}
