//! Placing catalog products into a document
//!
//! [`Inserter::insert`] places one product interactively: the tool mesh with
//! the holder transform applied at instance level, plus optional holder and
//! packaging. [`Inserter::replay_collection`] places every stored item of a
//! collection with the holder transform baked into the tool definition. Both
//! share definitions through the same identity keys.
//!
//! Replay reads geometry on a scoped background thread and hands each
//! prepared item to the calling thread, which is the only one that touches
//! the document.

use crate::catalog::{CatalogStore, Holder, Product};
use crate::collection::{Collection, CollectionItem};
use crate::config::{BlockLinkMode, InsertMode, PathMapping};
use crate::definition::{self, DefinitionRequest, DefinitionResolver, GeometrySource, definition_key_for_path};
use crate::document::{Document, DocumentHost, InstanceId, ObjectId, Tags};
use crate::error::{Error, Result};
use crate::locate::{locate_holder_mesh, locate_packaging_mesh, locate_tool_mesh};
use crate::model::GeometryObject;
use crate::placement;
use crate::resolver;
use crate::transform::Transform;
use chrono::{SecondsFormat, Utc};
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use tracing::{debug, info, warn};

/// Tag naming what kind of block an instance is
pub const TAG_BLOCK_TYPE: &str = "BoschBlockType";
/// Tag holding the product id
pub const TAG_PRODUCT_ID: &str = "BoschProductId";
/// Tag holding the product name
pub const TAG_PRODUCT_NAME: &str = "BoschProductName";
/// Tag holding the product SKU
pub const TAG_PRODUCT_SKU: &str = "BoschProductSKU";
/// Tag holding the tool mesh file
pub const TAG_PRODUCT_FILE: &str = "BoschProductFile";
/// Tag holding the holder variant
pub const TAG_HOLDER_VARIANT: &str = "BoschHolderVariant";
/// Tag holding the holder color
pub const TAG_HOLDER_COLOR: &str = "BoschHolderColor";
/// Tag holding the holder article code
pub const TAG_HOLDER_COD: &str = "BoschHolderCod";
/// Tag recording whether packaging was requested
pub const TAG_INCLUDES_PACKAGING: &str = "BoschIncludesPackaging";
/// Tag holding the RFC 3339 insertion time
pub const TAG_INSERTED_AT: &str = "BoschInsertedAt";

/// Items prepared ahead of the document thread
const PREFETCH_DEPTH: usize = 2;

/// Kind of placed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// The product itself
    Tool,
    /// A holder fixture
    Holder,
    /// A packaging box
    Packaging,
}

impl BlockType {
    /// Value stored under [`TAG_BLOCK_TYPE`]
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Tool => "Tool",
            BlockType::Holder => "Holder",
            BlockType::Packaging => "Packaging",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion settings
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOptions {
    /// Block instance or exploded group
    pub mode: InsertMode,
    /// Link policy for new definitions
    pub link_mode: BlockLinkMode,
    /// Packaging position in the tool's frame, in millimetres
    pub packaging_offset: Vector3<f64>,
    /// X spacing of items without stored placements
    pub grid_spacing: f64,
    /// Prefix rewrites for catalog paths
    pub path_mappings: Vec<PathMapping>,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            mode: InsertMode::Block,
            link_mode: BlockLinkMode::Embedded,
            packaging_offset: Vector3::new(500.0, 0.0, 0.0),
            grid_spacing: 1200.0,
            path_mappings: Vec::new(),
        }
    }
}

impl InsertOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the insert mode
    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the link policy
    pub fn with_link_mode(mut self, link_mode: BlockLinkMode) -> Self {
        self.link_mode = link_mode;
        self
    }

    /// Set the packaging offset
    pub fn with_packaging_offset(mut self, offset: Vector3<f64>) -> Self {
        self.packaging_offset = offset;
        self
    }

    /// Set the fallback grid spacing
    pub fn with_grid_spacing(mut self, spacing: f64) -> Self {
        self.grid_spacing = spacing;
        self
    }

    /// Set the path mappings
    pub fn with_path_mappings(mut self, mappings: Vec<PathMapping>) -> Self {
        self.path_mappings = mappings;
        self
    }

    fn link(&self) -> bool {
        self.link_mode == BlockLinkMode::Linked
    }
}

/// One interactive insertion
#[derive(Debug, Clone, Copy)]
pub struct InsertRequest<'a> {
    /// The product to place
    pub product: &'a Product,
    /// Holder to show it with
    pub holder: Option<&'a Holder>,
    /// Also place the packaging box
    pub include_packaging: bool,
    /// Insertion point
    pub point: Point3<f64>,
    /// Rotation about the insertion point
    pub rotation: Transform,
}

impl<'a> InsertRequest<'a> {
    /// Place `product` at the origin without holder or packaging
    pub fn new(product: &'a Product) -> Self {
        Self {
            product,
            holder: None,
            include_packaging: false,
            point: Point3::origin(),
            rotation: Transform::identity(),
        }
    }

    /// Show with a holder
    pub fn with_holder(mut self, holder: Option<&'a Holder>) -> Self {
        self.holder = holder;
        self
    }

    /// Include the packaging box
    pub fn with_packaging(mut self, include: bool) -> Self {
        self.include_packaging = include;
        self
    }

    /// Insert at `point`
    pub fn at(mut self, point: Point3<f64>) -> Self {
        self.point = point;
        self
    }

    /// Rotate about the insertion point
    pub fn with_rotation(mut self, rotation: Transform) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotation followed by the move to the insertion point
    pub fn world_transform(&self) -> Transform {
        self.rotation.then(&Transform::translation(self.point.coords))
    }
}

/// What a placement produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placed {
    /// A block instance
    Instance(InstanceId),
    /// Loose objects collected in a group
    Group {
        /// Group index
        index: usize,
        /// The objects
        members: Vec<ObjectId>,
    },
}

/// Result of an interactive insertion
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    /// The tool
    pub tool: Placed,
    /// Mesh file the tool was read from
    pub tool_path: PathBuf,
    /// The holder, when requested and found
    pub holder: Option<Placed>,
    /// The packaging, when requested and found
    pub packaging: Option<Placed>,
    /// Holder and packaging problems that did not stop the insertion
    pub warnings: Vec<String>,
}

/// Cooperative cancellation shared between a caller and a running batch
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress after each placed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// Entries handled so far, failed ones included
    pub completed: usize,
    /// Entries in the batch
    pub total: usize,
    /// Entries placed successfully so far
    pub inserted: usize,
    /// Product of the entry just handled
    pub product_id: String,
}

/// An entry that could not be placed
#[derive(Debug)]
pub struct BatchFailure {
    /// Index of the collection item
    pub item: usize,
    /// Index of the placement within the item, `None` for grid-placed items
    pub entry: Option<usize>,
    /// Product id stored in the item
    pub product_id: String,
    /// Why it failed
    pub error: Error,
}

/// Outcome of a collection replay
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Entries placed
    pub inserted: usize,
    /// Entries in the batch
    pub total: usize,
    /// Entries that failed
    pub failures: Vec<BatchFailure>,
    /// Holder and packaging problems
    pub warnings: Vec<String>,
    /// Whether the batch stopped early on request
    pub cancelled: bool,
}

impl BatchReport {
    /// `"inserted/total"`
    pub fn summary(&self) -> String {
        format!("{}/{}", self.inserted, self.total)
    }
}

/// A definition to resolve and where to put it
#[derive(Debug)]
struct Part {
    block: BlockType,
    request: DefinitionRequest,
    geometry: Option<Vec<GeometryObject>>,
    world: Transform,
    pose: Transform,
}

#[derive(Debug)]
struct PlannedEntry {
    item: usize,
    entry: Option<usize>,
    world: Transform,
}

/// An entry with its files located and geometry read
#[derive(Debug)]
struct PreparedEntry {
    item: usize,
    entry: Option<usize>,
    product_id: String,
    tool: Result<Part>,
    tags: Tags,
    group_name: String,
    accessories: Vec<std::result::Result<Part, String>>,
}

/// Places catalog products into documents
#[derive(Debug, Clone, Default)]
pub struct Inserter<S> {
    resolver: DefinitionResolver<S>,
    options: InsertOptions,
}

impl<S: GeometrySource> Inserter<S> {
    /// An inserter reading geometry through `source`
    pub fn new(source: S, options: InsertOptions) -> Self {
        Self {
            resolver: DefinitionResolver::new(source),
            options,
        }
    }

    /// The options in use
    pub fn options(&self) -> &InsertOptions {
        &self.options
    }

    /// The definition resolver in use
    pub fn resolver(&self) -> &DefinitionResolver<S> {
        &self.resolver
    }

    /// Place one product with optional holder and packaging
    ///
    /// Fails when no document is active, when no tool mesh can be found or
    /// when the tool definition cannot be created. Missing holder or
    /// packaging files only add warnings.
    pub fn insert<H>(&self, host: &mut H, request: &InsertRequest<'_>) -> Result<InsertOutcome>
    where
        H: DocumentHost + ?Sized,
    {
        let doc = host.active_document().ok_or(Error::NoActiveDocument)?;
        let product = request.product;
        let world = request.world_transform();
        let group_name = group_name(product, request.holder);

        let tool = self.tool_part(product, request.holder, world, false)?;
        let tool_path = tool.request.path.clone();
        let mut tags = tool_tags(product, request.holder, &tool_path, request.include_packaging);
        stamp(&mut tags);
        let tool = self.place_part(doc, tool, &tags, &group_name)?;

        let mut warnings = Vec::new();
        let holder = request.holder.and_then(|h| {
            let part = self.holder_part(h, world);
            self.place_accessory(doc, part, &group_name, &mut warnings)
        });
        let packaging = if request.include_packaging {
            let part = self.packaging_part(product, packaging_world(&world, &self.options));
            self.place_accessory(doc, part, &group_name, &mut warnings)
        } else {
            None
        };

        info!(
            product = %product.id,
            holder = request.holder.map(|h| h.key()).unwrap_or_default(),
            packaging = packaging.is_some(),
            "inserted product"
        );

        Ok(InsertOutcome {
            tool,
            tool_path,
            holder,
            packaging,
            warnings,
        })
    }

    /// Place every entry of a stored collection
    ///
    /// Each placement entry of each item counts once in the total; items
    /// without placements are laid out along X every `grid_spacing`
    /// millimetres. Entries that fail are recorded in the report and the
    /// batch goes on. `progress` runs on the calling thread after every
    /// entry, and `cancel` is checked between entries.
    ///
    /// Only a missing active document fails the whole call.
    pub fn replay_collection<H, F>(
        &self,
        host: &mut H,
        catalog: &CatalogStore,
        collection: &Collection,
        cancel: &CancellationToken,
        mut progress: F,
    ) -> Result<BatchReport>
    where
        H: DocumentHost + ?Sized,
        F: FnMut(&BatchProgress),
    {
        let doc = host.active_document().ok_or(Error::NoActiveDocument)?;
        let plan = self.plan(collection);
        let known: HashSet<String> = doc.definitions().iter().map(|d| d.name.clone()).collect();
        let mut report = BatchReport {
            total: plan.len(),
            ..BatchReport::default()
        };
        info!(collection = %collection.name, entries = report.total, "replaying collection");

        let (tx, rx) = mpsc::sync_channel::<PreparedEntry>(PREFETCH_DEPTH);
        thread::scope(|scope| {
            scope.spawn(move || {
                let mut known = known;
                for planned in plan {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let prepared = self.prepare_entry(catalog, collection, planned, &mut known);
                    if tx.send(prepared).is_err() {
                        break;
                    }
                }
            });

            let mut completed = 0;
            for prepared in rx {
                if cancel.is_cancelled() {
                    break;
                }
                let product_id = prepared.product_id.clone();
                self.place_entry(doc, prepared, &mut report);
                completed += 1;
                progress(&BatchProgress {
                    completed,
                    total: report.total,
                    inserted: report.inserted,
                    product_id,
                });
            }
            report.cancelled = cancel.is_cancelled() && completed < report.total;
        });

        info!(
            collection = %collection.name,
            inserted = report.inserted,
            total = report.total,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "collection replay finished"
        );
        Ok(report)
    }

    fn plan(&self, collection: &Collection) -> Vec<PlannedEntry> {
        let mut plan = Vec::new();
        for (index, item) in collection.items.iter().enumerate() {
            let placements = placement::decode_optional(item.transforms.as_deref());
            if placements.is_empty() {
                let x = index as f64 * self.options.grid_spacing;
                plan.push(PlannedEntry {
                    item: index,
                    entry: None,
                    world: Transform::translation(Vector3::new(x, 0.0, 0.0)),
                });
            } else {
                plan.extend(placements.iter().enumerate().map(|(entry, p)| PlannedEntry {
                    item: index,
                    entry: Some(entry),
                    world: p.world_transform(),
                }));
            }
        }
        plan
    }

    /// Locate files and read geometry for one entry; runs off the document thread
    fn prepare_entry(
        &self,
        catalog: &CatalogStore,
        collection: &Collection,
        planned: PlannedEntry,
        known: &mut HashSet<String>,
    ) -> PreparedEntry {
        let item: &CollectionItem = &collection.items[planned.item];
        let mut prepared = PreparedEntry {
            item: planned.item,
            entry: planned.entry,
            product_id: item.product_id.clone(),
            tool: Err(Error::ProductNotFound(item.product_id.clone())),
            tags: Tags::new(),
            group_name: String::new(),
            accessories: Vec::new(),
        };

        let Some(product) = catalog.product_by_id(&item.product_id) else {
            return prepared;
        };
        let holder = item.holder_key.as_deref().and_then(|key| {
            let found = product.find_holder(key);
            if found.is_none() {
                debug!(product = %product.id, key, "holder key not found; placing without holder");
            }
            found
        });
        let world = planned.world;
        prepared.group_name = group_name(product, holder);

        prepared.tool = self
            .tool_part(product, holder, world, true)
            .and_then(|mut part| {
                self.prefetch(&mut part, known)?;
                Ok(part)
            });
        if let Ok(tool) = &prepared.tool {
            prepared.tags = tool_tags(product, holder, &tool.request.path, item.include_packaging);
        } else {
            return prepared;
        }

        if let Some(holder) = holder {
            let part = self
                .holder_part(holder, world)
                .and_then(|mut part| self.prefetch(&mut part, known).map(|_| part).map_err(|e| e.to_string()));
            prepared.accessories.push(part);
        }
        if item.include_packaging {
            let part = self
                .packaging_part(product, packaging_world(&world, &self.options))
                .and_then(|mut part| self.prefetch(&mut part, known).map(|_| part).map_err(|e| e.to_string()));
            prepared.accessories.push(part);
        }
        prepared
    }

    fn prefetch(&self, part: &mut Part, known: &mut HashSet<String>) -> Result<()> {
        if known.contains(&part.request.key) {
            return Ok(());
        }
        part.geometry = Some(self.resolver.read(&part.request)?);
        known.insert(part.request.key.clone());
        Ok(())
    }

    /// Place one prepared entry; runs on the document thread
    fn place_entry(&self, doc: &mut Document, prepared: PreparedEntry, report: &mut BatchReport) {
        let PreparedEntry {
            item,
            entry,
            product_id,
            tool,
            mut tags,
            group_name,
            accessories,
        } = prepared;

        let placed = tool.and_then(|tool| {
            stamp(&mut tags);
            self.place_part(doc, tool, &tags, &group_name)
        });
        if let Err(error) = placed {
            warn!(item, ?entry, product = %product_id, %error, "collection entry failed");
            report.failures.push(BatchFailure {
                item,
                entry,
                product_id,
                error,
            });
            return;
        }
        report.inserted += 1;

        for part in accessories {
            self.place_accessory(doc, part, &group_name, &mut report.warnings);
        }
    }

    fn tool_part(
        &self,
        product: &Product,
        holder: Option<&Holder>,
        world: Transform,
        bake: bool,
    ) -> Result<Part> {
        let resolved = resolver::resolve(product, holder);
        let path = locate_tool_mesh(product, holder, &self.options.path_mappings)
            .ok_or_else(|| Error::ToolMeshNotFound(product.id.clone()))?;
        let key = definition_key_for_path(&path, holder);
        let mut request = DefinitionRequest::new(path, key).linked(self.options.link());
        if bake {
            request = request.baked(resolved.transform);
        }
        Ok(Part {
            block: BlockType::Tool,
            request,
            geometry: None,
            world,
            pose: resolved.transform,
        })
    }

    fn holder_part(&self, holder: &Holder, world: Transform) -> std::result::Result<Part, String> {
        let path = locate_holder_mesh(holder, &self.options.path_mappings)
            .ok_or_else(|| format!("Holder mesh not found for {}", holder.key()))?;
        Ok(self.accessory_part(BlockType::Holder, path, world))
    }

    fn packaging_part(&self, product: &Product, world: Transform) -> std::result::Result<Part, String> {
        let path = product
            .packaging
            .as_ref()
            .and_then(|p| locate_packaging_mesh(p, &self.options.path_mappings))
            .ok_or_else(|| format!("Packaging mesh not found for {}", product.id))?;
        Ok(self.accessory_part(BlockType::Packaging, path, world))
    }

    fn accessory_part(&self, block: BlockType, path: PathBuf, world: Transform) -> Part {
        let key = definition_key_for_path(&path, None);
        Part {
            block,
            request: DefinitionRequest::new(path, key).linked(self.options.link()),
            geometry: None,
            world,
            pose: Transform::identity(),
        }
    }

    fn place_accessory(
        &self,
        doc: &mut Document,
        part: std::result::Result<Part, String>,
        group_name: &str,
        warnings: &mut Vec<String>,
    ) -> Option<Placed> {
        let part = match part {
            Ok(part) => part,
            Err(message) => {
                warn!("{}", message);
                warnings.push(message);
                return None;
            }
        };
        let block = part.block;
        let mut tags = Tags::new();
        tags.insert(TAG_BLOCK_TYPE.to_string(), block.as_str().to_string());
        match self.place_part(doc, part, &tags, group_name) {
            Ok(placed) => Some(placed),
            Err(error) => {
                let message = format!("{} insertion failed: {}", block, error);
                warn!("{}", message);
                warnings.push(message);
                None
            }
        }
    }

    fn place_part(&self, doc: &mut Document, part: Part, tags: &Tags, group_name: &str) -> Result<Placed> {
        let resolution = match part.geometry {
            Some(objects) => definition::register(doc, &part.request, objects)?,
            None => self.resolver.resolve(doc, &part.request)?,
        };
        let transform = instance_transform(&part.world, &part.pose, &resolution.baked);

        match self.options.mode {
            InsertMode::Block => {
                let id = doc.add_instance(resolution.id, transform)?;
                if let Some(instance) = doc.instance_mut(id) {
                    instance.tags = tags.clone();
                }
                Ok(Placed::Instance(id))
            }
            InsertMode::Group => {
                let geometry: Vec<GeometryObject> = doc
                    .definition(resolution.id)
                    .map(|d| d.objects.iter().map(|o| o.transformed(&transform)).collect())
                    .unwrap_or_default();
                let members: Vec<ObjectId> = geometry
                    .into_iter()
                    .map(|g| {
                        let id = doc.add_object(g);
                        if let Some(object) = doc.object_mut(id) {
                            object.tags = tags.clone();
                        }
                        id
                    })
                    .collect();
                let name = format!("{}_{}", group_name, part.block);
                let index = doc.add_group(name, members.clone());
                Ok(Placed::Group { index, members })
            }
        }
    }
}

/// Instance transform that shows `pose`-adjusted geometry at `world` from a
/// definition whose geometry already carries `baked`
fn instance_transform(world: &Transform, pose: &Transform, baked: &Transform) -> Transform {
    if pose == baked {
        return *world;
    }
    match baked.try_inverse() {
        Some(unbake) => *world * *pose * unbake,
        None => {
            warn!("baked definition pose is singular; ignoring it");
            *world * *pose
        }
    }
}

/// Packaging placement, with the offset taken in the tool's own frame
fn packaging_world(world: &Transform, options: &InsertOptions) -> Transform {
    *world * Transform::translation(options.packaging_offset)
}

fn group_name(product: &Product, holder: Option<&Holder>) -> String {
    let millis = Utc::now().timestamp_millis();
    match holder {
        Some(h) => format!("{}_{}_{}", product.product_name, h.variant, millis),
        None => format!("{}_{}", product.product_name, millis),
    }
}

fn tool_tags(product: &Product, holder: Option<&Holder>, tool_path: &std::path::Path, include_packaging: bool) -> Tags {
    let mut tags = Tags::new();
    let mut put = |k: &str, v: String| {
        tags.insert(k.to_string(), v);
    };
    put(TAG_BLOCK_TYPE, BlockType::Tool.as_str().to_string());
    put(TAG_PRODUCT_ID, product.id.clone());
    put(TAG_PRODUCT_NAME, product.product_name.clone());
    put(TAG_PRODUCT_SKU, product.sku.clone().unwrap_or_default());
    put(TAG_PRODUCT_FILE, tool_path.display().to_string());
    if let Some(h) = holder {
        put(TAG_HOLDER_VARIANT, h.variant.clone());
        put(TAG_HOLDER_COLOR, h.color.clone());
        put(TAG_HOLDER_COD, h.cod_articol.clone().unwrap_or_default());
    }
    put(TAG_INCLUDES_PACKAGING, include_packaging.to_string());
    tags
}

fn stamp(tags: &mut Tags) {
    tags.insert(
        TAG_INSERTED_AT.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_instance_transform_shapes_agree() {
        let world = Transform::translation(Vector3::new(100.0, 0.0, 0.0));
        let h = Transform::rotation_z_degrees(90.0).then(&Transform::translation(Vector3::new(0.0, 0.0, 10.0)));
        let p = Point3::new(1.0, 0.0, 0.0);

        // Unbaked definition, holder transform on the instance
        let a = instance_transform(&world, &h, &Transform::identity()).transform_point(&p);
        // Baked definition: geometry already moved by h
        let baked_point = h.transform_point(&p);
        let b = instance_transform(&world, &h, &h).transform_point(&baked_point);
        assert_relative_eq!(a, b, epsilon = 1e-12);
        assert_relative_eq!(a, Point3::new(100.0, 1.0, 10.0), epsilon = 1e-12);

        // Baked definition reused by a caller that wants no pose
        let c = instance_transform(&world, &Transform::identity(), &h).transform_point(&baked_point);
        assert_relative_eq!(c, Point3::new(101.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_tool_tags() {
        let product = Product {
            id: "PRO_Drills_GSR".into(),
            product_name: "GSR".into(),
            ..Product::default()
        };
        let holder = Holder {
            variant: "Tego".into(),
            color: "Black".into(),
            cod_articol: Some("1600A".into()),
            ..Holder::default()
        };
        let tags = tool_tags(&product, Some(&holder), std::path::Path::new("/x/GSR_Mesh_Tego.3mf"), true);
        assert_eq!(tags[TAG_BLOCK_TYPE], "Tool");
        assert_eq!(tags[TAG_PRODUCT_ID], "PRO_Drills_GSR");
        assert_eq!(tags[TAG_PRODUCT_SKU], "");
        assert_eq!(tags[TAG_HOLDER_COD], "1600A");
        assert_eq!(tags[TAG_INCLUDES_PACKAGING], "true");
        assert!(!tags.contains_key(TAG_INSERTED_AT));

        let bare = tool_tags(&product, None, std::path::Path::new("/x/a.3mf"), false);
        assert!(!bare.contains_key(TAG_HOLDER_VARIANT));
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_report_summary() {
        let report = BatchReport {
            inserted: 3,
            total: 5,
            ..BatchReport::default()
        };
        assert_eq!(report.summary(), "3/5");
    }
}
