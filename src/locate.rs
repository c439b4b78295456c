//! Locating mesh files for products, holders and packaging

use crate::catalog::{Holder, Packaging, Product};
use crate::config::{PathMapping, map_path};
use crate::resolver::target_holder_key;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Extension of catalog mesh files
pub const MESH_EXTENSION: &str = "3mf";

/// Find the tool mesh for `product` shown with `holder`
///
/// When the product has a holder transform for the target variant, the
/// reference-pose mesh is used and the transform moves it into place.
/// Otherwise a mesh modelled in the holder's pose is looked up by name. The
/// `previews.mesh3d` path is the last resort either way.
pub fn locate_tool_mesh(
    product: &Product,
    holder: Option<&Holder>,
    mappings: &[PathMapping],
) -> Option<PathBuf> {
    let target = target_holder_key(product, holder);
    let folder = product.folder_path.as_path();
    let name = product.product_name.as_str();

    if product.holder_transform(target).is_some() {
        let reference = product.reference_holder_name();
        let candidates = [
            format!("{name}_Mesh_{reference}.{MESH_EXTENSION}"),
            format!("{name}_mesh_{reference}.{MESH_EXTENSION}"),
            format!("{name}_mesh.{MESH_EXTENSION}"),
            format!("{name}_Mesh.{MESH_EXTENSION}"),
        ];
        if let Some(path) = first_existing(folder, &candidates) {
            debug!(product = %product.id, path = %path.display(), target, "using reference mesh");
            return Some(path);
        }
        if let Some(path) = mesh3d_path(product, mappings) {
            debug!(product = %product.id, path = %path.display(), target, "using reference mesh");
            return Some(path);
        }
        debug!(product = %product.id, target, "reference mesh not found, trying holder-specific names");
    }

    let candidates = [
        format!("{name}_Mesh_{target}.{MESH_EXTENSION}"),
        format!("{name}_mesh_{target}.{MESH_EXTENSION}"),
        format!("{name}_MESH_{target}.{MESH_EXTENSION}"),
        format!("{name}_Mesh_{}.{MESH_EXTENSION}", target.to_uppercase()),
        format!("{name}_mesh_{}.{MESH_EXTENSION}", target.to_lowercase()),
    ];
    if let Some(path) = first_existing(folder, &candidates) {
        return Some(path);
    }

    if holder.is_none() {
        let generic = [
            format!("{name}_mesh.{MESH_EXTENSION}"),
            format!("{name}_Mesh.{MESH_EXTENSION}"),
        ];
        if let Some(path) = first_existing(folder, &generic) {
            return Some(path);
        }
    }

    let found = mesh3d_path(product, mappings);
    if found.is_none() {
        warn!(product = %product.id, target, "no tool mesh found");
    }
    found
}

/// The holder's mesh file, if it exists
pub fn locate_holder_mesh(holder: &Holder, mappings: &[PathMapping]) -> Option<PathBuf> {
    existing_mapped(holder.full_path.as_deref(), mappings)
}

/// The packaging mesh file, if it exists
pub fn locate_packaging_mesh(packaging: &Packaging, mappings: &[PathMapping]) -> Option<PathBuf> {
    existing_mapped(packaging.full_path.as_deref(), mappings)
}

fn mesh3d_path(product: &Product, mappings: &[PathMapping]) -> Option<PathBuf> {
    let mesh3d = product.previews.as_ref()?.mesh3d.as_ref()?;
    existing_mapped(mesh3d.full_path.as_deref(), mappings)
}

fn existing_mapped(path: Option<&str>, mappings: &[PathMapping]) -> Option<PathBuf> {
    let path = path.filter(|p| !p.trim().is_empty())?;
    let mapped = map_path(path, mappings);
    if mapped.is_file() {
        Some(mapped)
    } else {
        trace!(path = %mapped.display(), "mesh file not found");
        None
    }
}

fn first_existing(folder: &Path, names: &[String]) -> Option<PathBuf> {
    if folder.as_os_str().is_empty() {
        return None;
    }
    names.iter().map(|n| folder.join(n)).find(|p| {
        let found = p.is_file();
        if !found {
            trace!(path = %p.display(), "not found");
        }
        found
    })
}
