//! Shared fixtures: on-disk catalog trees and 3MF meshes

#![allow(dead_code)]

use nalgebra::Point3;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use toolcatalog::document::{Document, InstanceId};
use toolcatalog::model::{BuildItem, Object, Triangle, Vertex};
use toolcatalog::{CatalogConfig, CatalogStore, Mesh, Model};

pub const DRILL: &str = "GSR 18V-28";
pub const DRILL_FOLDER: [&str; 4] = ["Tools and Holders", "PRO", "Drills", DRILL];

/// Write a one-triangle 3MF whose first vertex is (1, 0, 0)
pub fn write_mesh(path: &Path) {
    let mut mesh = Mesh::new();
    mesh.vertices.push(Vertex::new(1.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::new(0.0, 1.0, 0.0));
    mesh.vertices.push(Vertex::new(0.0, 0.0, 1.0));
    mesh.triangles.push(Triangle::new(0, 1, 2));

    let mut model = Model::new();
    model
        .resources
        .objects
        .push(Object::with_mesh(1, Some("part".into()), mesh));
    model.build.items.push(BuildItem::new(1));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    model.write_to_file(path).unwrap();
}

/// Write a product JSON file below `root`
pub fn write_product(root: &Path, folders: &[&str], file: &str, value: &Value) -> PathBuf {
    let folder = folders.iter().fold(root.to_path_buf(), |p, f| p.join(f));
    fs::create_dir_all(&folder).unwrap();
    let path = folder.join(file);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

/// The drill's product folder below `root`
pub fn drill_folder(root: &Path) -> PathBuf {
    DRILL_FOLDER.iter().fold(root.to_path_buf(), |p, f| p.join(f))
}

/// A catalog with one drill: a Tego holder transform, a Tego holder mesh and
/// a packaging box
pub fn drill_catalog() -> (TempDir, CatalogStore) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let folder = drill_folder(root);

    write_mesh(&folder.join(format!("{DRILL}_Mesh_Tego.3mf")));
    let holder_mesh = root.join("_holders").join("tego_black.3mf");
    write_mesh(&holder_mesh);
    let box_mesh = folder.join("packaging_box.3mf");
    write_mesh(&box_mesh);

    let product = json!({
        "ProductName": DRILL,
        "SKU": "06019H4000",
        "Holders": [
            {"Variant": "Tego", "Color": "Black", "CodArticol": "1600A", "FullPath": holder_mesh},
            {"Variant": "L-Boxx", "Color": "Blue"}
        ],
        "HolderTransforms": {
            "Tego": {"translation": [0, 0, 10], "rotation": [0, 0, 90], "scale": [1, 1, 1]}
        },
        "Packaging": {"FullPath": box_mesh}
    });
    write_product(root, &DRILL_FOLDER, &format!("{DRILL}.json"), &product);

    let mut store = CatalogStore::new(CatalogConfig::new(root));
    store.reload().unwrap();
    (dir, store)
}

/// World positions of an instance's first object
pub fn instance_points(doc: &Document, id: InstanceId) -> Vec<Point3<f64>> {
    let instance = doc.instance(id).unwrap();
    let definition = doc.definition(instance.definition).unwrap();
    definition.objects[0]
        .mesh
        .vertices
        .iter()
        .map(|v| instance.transform.transform_point(&v.to_point()))
        .collect()
}
