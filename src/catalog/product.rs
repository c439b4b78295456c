//! Product records as stored in the catalog JSON files

use crate::error::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Holder variant whose mesh is the reference pose when a product names none
pub const DEFAULT_REFERENCE_HOLDER: &str = "Tego";

/// A catalog product
///
/// Created once per JSON file by the catalog load pass and never mutated
/// afterwards; a reload replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Product {
    /// Stable product id, generated from the folder path when the file has none
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    /// Display name; also the base of the mesh file names
    #[serde(rename = "productname", deserialize_with = "null_default")]
    pub product_name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Stock keeping unit
    pub sku: Option<String>,
    /// Article code
    #[serde(rename = "codarticol")]
    pub cod_articol: Option<String>,
    /// Product range ("DIY", "PRO", ...)
    pub range: Option<String>,
    /// Category directly below the range
    pub category: Option<String>,
    /// Optional subcategory
    pub subcategory: Option<String>,
    /// Wrapper folders above the range, joined with " > "
    #[serde(rename = "topcategory")]
    pub top_category: Option<String>,
    /// Full category path joined with " > "
    #[serde(rename = "categorypath")]
    pub category_path: Option<String>,
    /// Segments that make up `category_path`
    #[serde(rename = "pathsegments", deserialize_with = "null_default")]
    pub path_segments: Vec<String>,
    /// Folder holding the product JSON; always overwritten on load
    #[serde(rename = "folderpath", deserialize_with = "null_default")]
    pub folder_path: PathBuf,
    /// Search tags
    #[serde(deserialize_with = "null_default")]
    pub tags: Vec<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Holder fixtures the product can be shown with
    #[serde(deserialize_with = "null_default")]
    pub holders: Vec<Holder>,
    /// Pose adjustments keyed by holder variant name
    #[serde(rename = "holdertransforms")]
    pub holder_transforms: Option<BTreeMap<String, HolderTransform>>,
    /// Variant whose mesh file is the untransformed reference pose
    #[serde(rename = "referenceholder")]
    pub reference_holder: Option<String>,
    /// Packaging box, if any
    pub packaging: Option<Packaging>,
    /// Preview images and mesh files
    pub previews: Option<PreviewRefs>,
    /// Authoring timestamps
    pub metadata: Option<ProductMetadata>,
}

/// A holder fixture variant
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Holder {
    /// Fixture family name
    #[serde(deserialize_with = "null_default")]
    pub variant: String,
    /// Finish or colorway
    #[serde(deserialize_with = "null_default")]
    pub color: String,
    /// Article code
    #[serde(rename = "codarticol")]
    pub cod_articol: Option<String>,
    /// File name of the holder mesh
    #[serde(rename = "filename")]
    pub file_name: Option<String>,
    /// Location of the holder mesh
    #[serde(rename = "fullpath")]
    pub full_path: Option<String>,
    /// Preview image location
    pub preview: Option<String>,
}

impl Holder {
    /// The `"{Variant}_{Color}"` key used in collections and tags
    pub fn key(&self) -> String {
        format!("{}_{}", self.variant, self.color)
    }
}

/// Affine adjustment from the reference pose to a holder's pose
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HolderTransform {
    /// Translation in millimetres
    #[serde(deserialize_with = "zero_if_null")]
    pub translation: [f64; 3],
    /// Rotation in degrees, applied about X, then Y, then Z
    #[serde(deserialize_with = "zero_if_null")]
    pub rotation: [f64; 3],
    /// Scale factors
    #[serde(deserialize_with = "unit_if_null")]
    pub scale: [f64; 3],
    /// Free-text notes
    pub notes: Option<String>,
}

impl Default for HolderTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            notes: None,
        }
    }
}

/// Packaging box of a product
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Packaging {
    /// File name of the packaging mesh
    #[serde(rename = "filename")]
    pub file_name: Option<String>,
    /// Location of the packaging mesh
    #[serde(rename = "fullpath")]
    pub full_path: Option<String>,
    /// Length in millimetres
    pub length: Option<f64>,
    /// Width in millimetres
    pub width: Option<f64>,
    /// Height in millimetres
    pub height: Option<f64>,
    /// Weight in grams
    pub weight: Option<f64>,
    /// Preview image file name
    pub preview: Option<String>,
    /// Preview image location
    #[serde(rename = "previewpath")]
    pub preview_path: Option<String>,
}

/// A referenced image or mesh file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewImage {
    /// File name
    #[serde(rename = "filename")]
    pub file_name: Option<String>,
    /// Full location
    #[serde(rename = "fullpath")]
    pub full_path: Option<String>,
    /// Caption
    pub description: Option<String>,
}

/// Preview files attached to a product
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewRefs {
    /// Main product image
    pub product: Option<PreviewImage>,
    /// Alternate product image
    #[serde(rename = "productalternate")]
    pub product_alternate: Option<PreviewImage>,
    /// Mesh file of the tool in its reference pose
    pub mesh3d: Option<PreviewImage>,
    /// Rendered mesh preview
    #[serde(rename = "meshpreview")]
    pub mesh_preview: Option<PreviewImage>,
    /// Graphic model
    pub grafica3d: Option<PreviewImage>,
    /// Rendered graphic preview
    #[serde(rename = "graficapreview")]
    pub grafica_preview: Option<PreviewImage>,
    /// Lightweight proxy mesh
    #[serde(rename = "proxymesh")]
    pub proxy_mesh: Option<PreviewImage>,
}

/// Authoring timestamps, kept as written
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductMetadata {
    /// Creation date
    #[serde(rename = "createddate")]
    pub created_date: Option<String>,
    /// Last modification date
    #[serde(rename = "lastmodified")]
    pub last_modified: Option<String>,
}

impl Product {
    /// Parse a product from JSON with case-insensitive property names
    ///
    /// Property names are folded to lowercase before deserialization. The
    /// keys of `holderTransforms` are variant names and keep their case.
    pub fn from_json_str(json: &str) -> Result<Product> {
        let value: Value = serde_json::from_str(json)?;
        Ok(serde_json::from_value(fold_keys(value, false))?)
    }

    /// The reference holder variant, defaulting to "Tego"
    pub fn reference_holder_name(&self) -> &str {
        self.reference_holder
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REFERENCE_HOLDER)
    }

    /// The holder transform recorded for a variant
    pub fn holder_transform(&self, variant: &str) -> Option<&HolderTransform> {
        self.holder_transforms.as_ref()?.get(variant)
    }

    /// Find a holder by its `"{Variant}_{Color}"` key
    ///
    /// Matching is case-insensitive. A unique full-key match wins; otherwise a
    /// unique match on the variant alone is accepted for keys stored before
    /// colors were recorded. Anything ambiguous or unknown yields `None`.
    pub fn find_holder(&self, key: &str) -> Option<&Holder> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        let by_key: Vec<&Holder> = self
            .holders
            .iter()
            .filter(|h| h.key().eq_ignore_ascii_case(key))
            .collect();
        match by_key.as_slice() {
            [holder] => return Some(*holder),
            [] => {}
            _ => {
                warn!(product = %self.id, key, "holder key matches several holders");
                return None;
            }
        }

        let by_variant: Vec<&Holder> = self
            .holders
            .iter()
            .filter(|h| h.variant.eq_ignore_ascii_case(key))
            .collect();
        match by_variant.as_slice() {
            [holder] => Some(*holder),
            _ => None,
        }
    }
}

/// Lowercase every object key, leaving the keys directly below
/// `holdertransforms` untouched
fn fold_keys(value: Value, preserve_keys: bool) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| {
                    if preserve_keys {
                        (key, fold_keys(child, false))
                    } else {
                        let key = key.to_lowercase();
                        let preserve_children = key == "holdertransforms";
                        (key, fold_keys(child, preserve_children))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| fold_keys(v, false)).collect()),
        other => other,
    }
}

fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn zero_if_null<'de, D>(deserializer: D) -> std::result::Result<[f64; 3], D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<[f64; 3]>::deserialize(deserializer)?.unwrap_or([0.0; 3]))
}

fn unit_if_null<'de, D>(deserializer: D) -> std::result::Result<[f64; 3], D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<[f64; 3]>::deserialize(deserializer)?.unwrap_or([1.0; 3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(variant: &str, color: &str) -> Holder {
        Holder {
            variant: variant.to_string(),
            color: color.to_string(),
            ..Holder::default()
        }
    }

    #[test]
    fn test_case_insensitive_properties() {
        let json = r#"{
            "ProductName": "GSR 18V-28",
            "SKU": "06019H4000",
            "REFERENCEHOLDER": "Tego",
            "Holders": [{"Variant": "Tego", "COLOR": "Black", "fullPath": "/h/tego.3mf"}],
            "holderTransforms": {"Tego": {"Translation": [0, 0, 10], "rotation": [0, 0, 90]}}
        }"#;

        let product = Product::from_json_str(json).unwrap();
        assert_eq!(product.product_name, "GSR 18V-28");
        assert_eq!(product.sku.as_deref(), Some("06019H4000"));
        assert_eq!(product.holders[0].variant, "Tego");
        assert_eq!(product.holders[0].full_path.as_deref(), Some("/h/tego.3mf"));

        let ht = product.holder_transform("Tego").unwrap();
        assert_eq!(ht.translation, [0.0, 0.0, 10.0]);
        assert_eq!(ht.rotation, [0.0, 0.0, 90.0]);
        assert_eq!(ht.scale, [1.0, 1.0, 1.0]);
        assert!(product.holder_transform("tego").is_none());
    }

    #[test]
    fn test_nulls_fall_back_to_defaults() {
        let json = r#"{"productName": "X", "id": null, "tags": null, "holders": null,
            "holderTransforms": {"L-Boxx": {"scale": null}}}"#;
        let product = Product::from_json_str(json).unwrap();
        assert!(product.id.is_empty());
        assert!(product.tags.is_empty());
        assert_eq!(product.holder_transform("L-Boxx").unwrap().scale, [1.0; 3]);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Product::from_json_str("{\"productName\": ").is_err());
        assert!(Product::from_json_str("{\"holders\": \"nope\"}").is_err());
    }

    #[test]
    fn test_reference_holder_default() {
        let mut product = Product::default();
        assert_eq!(product.reference_holder_name(), "Tego");
        product.reference_holder = Some(String::new());
        assert_eq!(product.reference_holder_name(), "Tego");
        product.reference_holder = Some("L-Boxx".into());
        assert_eq!(product.reference_holder_name(), "L-Boxx");
    }

    #[test]
    fn test_find_holder_by_key() {
        let product = Product {
            holders: vec![holder("Tego", "Black"), holder("Tego", "Silver")],
            ..Product::default()
        };
        assert_eq!(product.find_holder("tego_silver").unwrap().color, "Silver");
        // Variant alone is ambiguous here
        assert!(product.find_holder("Tego").is_none());
        assert!(product.find_holder("Tego_Gold").is_none());
        assert!(product.find_holder("").is_none());
    }

    #[test]
    fn test_find_holder_variant_with_underscore() {
        let product = Product {
            holders: vec![holder("Type 1_TEGO", "RAL9006"), holder("Type 2", "Black")],
            ..Product::default()
        };
        assert_eq!(
            product.find_holder("Type 1_TEGO_RAL9006").unwrap().variant,
            "Type 1_TEGO"
        );
        assert_eq!(product.find_holder("type 2").unwrap().color, "Black");
    }

    #[test]
    fn test_find_holder_fails_closed_on_duplicates() {
        let product = Product {
            holders: vec![holder("Tego", "Black"), holder("TEGO", "black")],
            ..Product::default()
        };
        assert!(product.find_holder("Tego_Black").is_none());
    }
}
