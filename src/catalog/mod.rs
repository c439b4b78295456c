//! Catalog store: loads one product per JSON file below a root folder
//!
//! # Example
//!
//! ```no_run
//! use toolcatalog::catalog::{CatalogConfig, CatalogStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = CatalogStore::new(CatalogConfig::new("/mnt/catalog"));
//! let report = store.reload()?;
//! println!("{} products, {} skipped", report.loaded, report.failures.len());
//! # Ok(())
//! # }
//! ```

mod product;
pub mod search;
mod taxonomy;

pub use product::{
    DEFAULT_REFERENCE_HOLDER, Holder, HolderTransform, Packaging, PreviewImage, PreviewRefs,
    Product, ProductMetadata,
};
pub use search::{CategoryNode, Filters, SortDirection, SortKey};
pub use taxonomy::{CATEGORY_SEPARATOR, Taxonomy, derive_taxonomy, product_id, relative_segments};

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Folders never scanned for products
pub const DEFAULT_HIDDEN_FOLDERS: [&str; 5] = [
    "_public-collections",
    "_holders",
    "_templates",
    "_archive",
    "_backup",
];

/// Where and how to load the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Catalog root folder
    pub root: PathBuf,
    /// Folder names skipped at any depth, compared ignoring case
    pub hidden_folders: Vec<String>,
}

impl CatalogConfig {
    /// Configuration for `root` with the default hidden folders
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hidden_folders: DEFAULT_HIDDEN_FOLDERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Also skip folders with this name
    pub fn with_hidden_folder(mut self, name: impl Into<String>) -> Self {
        self.hidden_folders.push(name.into());
        self
    }

    /// Replace the hidden folder list
    pub fn with_hidden_folders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_folders = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a folder name is on the hidden list
    pub fn is_hidden_folder(&self, name: &str) -> bool {
        self.hidden_folders
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}

/// A product file that could not be loaded
#[derive(Debug)]
pub struct LoadFailure {
    /// The offending file or folder
    pub path: PathBuf,
    /// Why it was skipped
    pub error: Error,
}

/// Outcome of a catalog load pass
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of products loaded
    pub loaded: usize,
    /// Number of hidden folders pruned from the scan
    pub hidden_folders_skipped: usize,
    /// Files skipped because they could not be read or parsed
    pub failures: Vec<LoadFailure>,
}

/// Products and report from one load pass
#[derive(Debug)]
pub struct LoadedCatalog {
    /// Products in file-name order
    pub products: Vec<Product>,
    /// What happened while loading
    pub report: LoadReport,
}

/// Load every product below the configured root
///
/// A missing root fails the whole load. Files that fail to read or parse are
/// recorded in the report and skipped. This does only read-only file I/O and
/// can run on a background thread; hand the result to
/// [`CatalogStore::replace`] afterwards.
pub fn load_products(config: &CatalogConfig) -> Result<LoadedCatalog> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(Error::CatalogRootNotFound(root.clone()));
    }

    let mut products = Vec::new();
    let mut report = LoadReport::default();
    let mut hidden = 0usize;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let skip = entry.depth() > 0
                && entry.file_type().is_dir()
                && config.is_hidden_folder(&entry.file_name().to_string_lossy());
            if skip {
                debug!(path = %entry.path().display(), "skipping hidden folder");
                hidden += 1;
            }
            !skip
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                warn!(path = %path.display(), error = %e, "catalog scan error");
                report.failures.push(LoadFailure {
                    path,
                    error: Error::Io(e.into()),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_json_file(entry.path()) {
            continue;
        }

        match load_product_file(root, entry.path()) {
            Ok(product) => {
                debug!(id = %product.id, path = %entry.path().display(), "loaded product");
                products.push(product);
            }
            Err(error) => {
                warn!(path = %entry.path().display(), %error, "skipping product file");
                report.failures.push(LoadFailure {
                    path: entry.path().to_path_buf(),
                    error,
                });
            }
        }
    }

    report.loaded = products.len();
    report.hidden_folders_skipped = hidden;
    info!(
        root = %root.display(),
        loaded = report.loaded,
        failed = report.failures.len(),
        "catalog loaded"
    );

    Ok(LoadedCatalog { products, report })
}

/// Read one product file and fill in the fields derived from its location
pub fn load_product_file(root: &Path, path: &Path) -> Result<Product> {
    let json = fs::read_to_string(path)?;
    let mut product = Product::from_json_str(&json)?;

    let folder = path.parent().unwrap_or(root).to_path_buf();
    let segments = relative_segments(root, &folder);
    taxonomy::complete_product(&mut product, &segments);
    product.folder_path = folder;

    Ok(product)
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// The current product set
///
/// Reloading replaces the whole set; products are never edited in place.
#[derive(Debug)]
pub struct CatalogStore {
    config: CatalogConfig,
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl CatalogStore {
    /// An empty store for `config`
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            products: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A store holding an already loaded product set
    pub fn from_products(config: CatalogConfig, products: Vec<Product>) -> Self {
        let mut store = Self::new(config);
        store.set_products(products);
        store
    }

    /// Load from disk, replacing the current set
    ///
    /// On error the current set is kept.
    pub fn reload(&mut self) -> Result<LoadReport> {
        let loaded = load_products(&self.config)?;
        Ok(self.replace(loaded))
    }

    /// Install the result of a [`load_products`] call made elsewhere
    pub fn replace(&mut self, loaded: LoadedCatalog) -> LoadReport {
        self.set_products(loaded.products);
        loaded.report
    }

    fn set_products(&mut self, products: Vec<Product>) {
        let mut index = HashMap::with_capacity(products.len());
        for (i, product) in products.iter().enumerate() {
            if index.contains_key(&product.id) {
                warn!(id = %product.id, "duplicate product id; keeping the first");
                continue;
            }
            index.insert(product.id.clone(), i);
        }
        self.products = products;
        self.index = index;
    }

    /// The configuration this store loads from
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// All products
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look a product up by id
    pub fn product_by_id(&self, id: &str) -> Option<&Product> {
        self.index.get(id).map(|&i| &self.products[i])
    }

    /// Products passing `filters`, in the filters' order
    pub fn search(&self, filters: &Filters) -> Vec<&Product> {
        search::filter_and_sort(&self.products, filters)
    }

    /// Category tree over every product's path segments
    pub fn category_tree(&self) -> CategoryNode {
        search::build_category_tree(&self.products)
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the store holds no products
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
