//! Stored collections of placed products
//!
//! A collection remembers which products were placed, with which holder,
//! whether packaging was included and where each copy went. Placements use
//! the string format of [`crate::placement`].

use crate::catalog::CatalogStore;
use crate::document::{Document, Instance};
use crate::error::Result;
use crate::insert::{
    BlockType, TAG_BLOCK_TYPE, TAG_HOLDER_COLOR, TAG_HOLDER_VARIANT, TAG_INCLUDES_PACKAGING,
    TAG_PRODUCT_ID,
};
use crate::placement::{self, PlacementEntry};
use crate::resolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// A named set of product placements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Stored products
    #[serde(default)]
    pub items: Vec<CollectionItem>,
}

/// One product in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    /// Catalog product id
    pub product_id: String,
    /// `"{Variant}_{Color}"` of the holder, if any
    #[serde(default)]
    pub holder_key: Option<String>,
    /// Whether packaging is placed with the product
    #[serde(default)]
    pub include_packaging: bool,
    /// Placement string, absent for items laid out on a grid
    #[serde(default)]
    pub transforms: Option<String>,
}

impl CollectionItem {
    /// An item without holder, packaging or placements
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            holder_key: None,
            include_packaging: false,
            transforms: None,
        }
    }

    /// Set the holder key
    pub fn with_holder_key(mut self, key: impl Into<String>) -> Self {
        self.holder_key = Some(key.into());
        self
    }

    /// Include packaging
    pub fn with_packaging(mut self, include: bool) -> Self {
        self.include_packaging = include;
        self
    }

    /// Store placements
    pub fn with_placements(mut self, entries: &[PlacementEntry]) -> Self {
        self.transforms = Some(placement::encode(entries));
        self
    }
}

impl Collection {
    /// An empty collection with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            created_at: Utc::now(),
            last_modified: None,
            items: Vec::new(),
        }
    }

    /// Parse collection JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a collection file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Write a collection file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Record the tool instances of a document as a collection
///
/// Instances are grouped by product, holder and packaging flag in the order
/// they were placed. Each world placement is recovered by removing the
/// holder transform and whatever pose the definition has baked in. Instances
/// whose product is no longer in the catalog are skipped.
pub fn capture_collection(doc: &Document, catalog: &CatalogStore, name: impl Into<String>) -> Collection {
    let mut collection = Collection::new(name);
    let mut groups: Vec<(CollectionItem, Vec<PlacementEntry>)> = Vec::new();

    for instance in doc.instances() {
        if instance.tags.get(TAG_BLOCK_TYPE).map(String::as_str) != Some(BlockType::Tool.as_str()) {
            continue;
        }
        let Some(product_id) = instance.tags.get(TAG_PRODUCT_ID) else {
            continue;
        };
        let Some(product) = catalog.product_by_id(product_id) else {
            warn!(product = %product_id, "product not in catalog; not captured");
            continue;
        };
        let holder_key = holder_key(instance);
        let holder = holder_key.as_deref().and_then(|k| product.find_holder(k));
        let include_packaging = instance
            .tags
            .get(TAG_INCLUDES_PACKAGING)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let baked = doc
            .definition(instance.definition)
            .map(|d| d.baked)
            .unwrap_or_default();
        let pose = resolver::resolve(product, holder).transform;
        let Some(unpose) = pose.try_inverse() else {
            warn!(product = %product_id, "holder transform is singular; not captured");
            continue;
        };
        let world = instance.transform * baked * unpose;
        let entry = PlacementEntry::from_world_transform(&world);

        match groups.iter_mut().find(|(item, _)| {
            item.product_id == *product_id
                && item.holder_key == holder_key
                && item.include_packaging == include_packaging
        }) {
            Some((_, entries)) => entries.push(entry),
            None => {
                let item = CollectionItem {
                    product_id: product_id.clone(),
                    holder_key,
                    include_packaging,
                    transforms: None,
                };
                groups.push((item, vec![entry]));
            }
        }
    }

    collection.items = groups
        .into_iter()
        .map(|(item, entries)| item.with_placements(&entries))
        .collect();
    debug!(name = %collection.name, items = collection.items.len(), "captured collection");
    collection
}

fn holder_key(instance: &Instance) -> Option<String> {
    let variant = instance.tags.get(TAG_HOLDER_VARIANT).filter(|v| !v.is_empty())?;
    let color = instance.tags.get(TAG_HOLDER_COLOR).map(String::as_str).unwrap_or("");
    Some(format!("{}_{}", variant, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "id": "c1",
            "name": "Wall A",
            "createdAt": "2025-03-01T10:00:00Z",
            "items": [
                {"productId": "PRO_Drills_GSR", "holderKey": "Tego_Black", "includePackaging": true,
                 "transforms": "0,0,0,0,0,90"},
                {"productId": "DIY_Saws_PKS"}
            ]
        }"#;
        let collection = Collection::from_json_str(json).unwrap();
        assert_eq!(collection.items.len(), 2);
        assert_eq!(collection.items[0].holder_key.as_deref(), Some("Tego_Black"));
        assert!(collection.items[0].include_packaging);
        assert!(collection.items[1].transforms.is_none());

        let again = Collection::from_json_str(&collection.to_json_string().unwrap()).unwrap();
        assert_eq!(again, collection);
    }

    #[test]
    fn test_new_collection_has_unique_id() {
        assert_ne!(Collection::new("a").id, Collection::new("a").id);
    }

    #[test]
    fn test_item_builder_encodes_placements() {
        let item = CollectionItem::new("p")
            .with_holder_key("Tego_Black")
            .with_placements(&[PlacementEntry::at(nalgebra::Point3::new(1.0, 2.0, 3.0))]);
        assert_eq!(item.transforms.as_deref(), Some("1,2,3,0,0,0"));
    }
}
