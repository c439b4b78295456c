//! Filtering, sorting and facets over a loaded product set
//!
//! Everything here borrows from the catalog and never touches the disk.
//! Filters combine with AND; an empty filter list does not restrict.

use super::product::Product;
use super::taxonomy::CATEGORY_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Name of the synthetic root of a category tree
pub const CATEGORY_ROOT: &str = "Root";

/// Field to order products by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Product name
    #[default]
    Name,
    /// Category, then name
    Category,
    /// Range, then name
    Range,
    /// SKU, then name
    Sku,
    /// Keep catalog order
    Unsorted,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    /// A to Z
    #[default]
    Ascending,
    /// Z to A
    Descending,
}

/// Product filters as kept in the user's settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    /// Substring searched in name, SKU, description and tags, ignoring case
    pub search_text: String,
    /// Accepted ranges
    pub ranges: Vec<String>,
    /// Accepted categories
    pub categories: Vec<String>,
    /// Products must offer at least one of these holder variants
    pub holder_variants: Vec<String>,
    /// Products must carry all of these tags, ignoring case
    pub tags_include: Vec<String>,
    /// Sort field
    pub sort_by: SortKey,
    /// Sort direction
    pub sort_dir: SortDirection,
}

impl Filters {
    /// No filters, sorted by name
    pub fn new() -> Self {
        Self::default()
    }

    /// Search for `text`
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Accept a range
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.ranges.push(range.into());
        self
    }

    /// Accept a category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Accept products offering a holder variant
    pub fn with_holder_variant(mut self, variant: impl Into<String>) -> Self {
        self.holder_variants.push(variant.into());
        self
    }

    /// Require a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags_include.push(tag.into());
        self
    }

    /// Set the ordering
    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_by = key;
        self.sort_dir = direction;
        self
    }

    /// Whether `product` passes every filter
    pub fn matches(&self, product: &Product) -> bool {
        let needle = self.search_text.trim().to_lowercase();
        if !needle.is_empty() {
            let contains = |s: &str| s.to_lowercase().contains(&needle);
            let hit = contains(&product.product_name)
                || product.sku.as_deref().is_some_and(contains)
                || product.description.as_deref().is_some_and(contains)
                || product.tags.iter().any(|t| contains(t));
            if !hit {
                return false;
            }
        }

        if !self.ranges.is_empty() && !one_of(&self.ranges, product.range.as_deref()) {
            return false;
        }
        if !self.categories.is_empty() && !one_of(&self.categories, product.category.as_deref()) {
            return false;
        }
        if !self.holder_variants.is_empty()
            && !product
                .holders
                .iter()
                .any(|h| self.holder_variants.contains(&h.variant))
        {
            return false;
        }

        self.tags_include.iter().all(|wanted| {
            product
                .tags
                .iter()
                .any(|t| t.to_lowercase() == wanted.to_lowercase())
        })
    }
}

fn one_of(accepted: &[String], value: Option<&str>) -> bool {
    value.is_some_and(|v| accepted.iter().any(|a| a == v))
}

/// Products passing `filters`, in catalog order
pub fn apply_filters<'a>(products: &'a [Product], filters: &Filters) -> Vec<&'a Product> {
    products.iter().filter(|p| filters.matches(p)).collect()
}

/// Order products in place; ties on the sort field fall back to the name
///
/// Missing values sort as empty strings. The sort is stable, so
/// [`SortKey::Unsorted`] and full ties keep their input order.
pub fn sort_products(products: &mut [&Product], key: SortKey, direction: SortDirection) {
    if key == SortKey::Unsorted {
        return;
    }
    let field = |p: &Product| -> String {
        match key {
            SortKey::Category => p.category.clone().unwrap_or_default(),
            SortKey::Range => p.range.clone().unwrap_or_default(),
            SortKey::Sku => p.sku.clone().unwrap_or_default(),
            SortKey::Name | SortKey::Unsorted => String::new(),
        }
    };

    products.sort_by(|a, b| {
        let order = field(a)
            .cmp(&field(b))
            .then_with(|| a.product_name.cmp(&b.product_name));
        match direction {
            SortDirection::Ascending => order,
            SortDirection::Descending => order.reverse(),
        }
    });
}

/// Filter, then sort by the filters' ordering
pub fn filter_and_sort<'a>(products: &'a [Product], filters: &Filters) -> Vec<&'a Product> {
    let mut found = apply_filters(products, filters);
    sort_products(&mut found, filters.sort_by, filters.sort_dir);
    debug!(total = products.len(), matched = found.len(), "filtered products");
    found
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct non-empty ranges, sorted
pub fn unique_ranges(products: &[Product]) -> Vec<String> {
    unique(products.iter().filter_map(|p| p.range.as_deref()))
}

/// Distinct non-empty categories, sorted
pub fn unique_categories(products: &[Product]) -> Vec<String> {
    unique(products.iter().filter_map(|p| p.category.as_deref()))
}

/// Distinct non-empty holder variants across all products, sorted
pub fn unique_holder_variants(products: &[Product]) -> Vec<String> {
    unique(
        products
            .iter()
            .flat_map(|p| p.holders.iter().map(|h| h.variant.as_str())),
    )
}

/// One level of the category tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryNode {
    /// Segment name
    pub name: String,
    /// Segments from the top down to this node, joined with " > "
    pub path: String,
    /// Products at or below this node
    pub product_count: usize,
    /// Child categories in first-seen order
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// The node at `path` below this one
    pub fn find(&self, path: &str) -> Option<&CategoryNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    fn child_mut(&mut self, name: &str) -> &mut CategoryNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                let path = if self.path.is_empty() {
                    name.to_string()
                } else {
                    format!("{}{}{}", self.path, CATEGORY_SEPARATOR, name)
                };
                self.children.push(CategoryNode {
                    name: name.to_string(),
                    path,
                    ..CategoryNode::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

/// Build the category tree from each product's path segments
///
/// Products without segments are left out. The root's count stays zero;
/// every other node counts the products filed at or below it.
pub fn build_category_tree(products: &[Product]) -> CategoryNode {
    let mut root = CategoryNode {
        name: CATEGORY_ROOT.to_string(),
        ..CategoryNode::default()
    };
    for product in products.iter().filter(|p| !p.path_segments.is_empty()) {
        let mut node = &mut root;
        for segment in &product.path_segments {
            node = node.child_mut(segment);
            node.product_count += 1;
        }
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Holder;

    fn product(name: &str, range: &str, category: &str, segments: &[&str]) -> Product {
        Product {
            id: name.to_string(),
            product_name: name.to_string(),
            range: Some(range.to_string()),
            category: Some(category.to_string()),
            path_segments: segments.iter().map(|s| s.to_string()).collect(),
            ..Product::default()
        }
    }

    fn holder(variant: &str) -> Holder {
        Holder {
            variant: variant.to_string(),
            color: "Black".to_string(),
            ..Holder::default()
        }
    }

    fn sample() -> Vec<Product> {
        let mut drill = product("GSR 18V-28", "PRO", "Drills", &["Tools and Holders", "PRO", "Drills"]);
        drill.sku = Some("06019H4000".into());
        drill.tags = vec!["Cordless".into(), "Bestseller".into()];
        drill.holders = vec![holder("Tego"), holder("L-Boxx")];

        let mut saw = product("PKS 18", "DIY", "Saws", &["DIY", "Saws"]);
        saw.description = Some("Circular saw for wood".into());
        saw.tags = vec!["cordless".into()];
        saw.holders = vec![holder("Tego")];

        let mut grinder = product("GWS 7-125", "PRO", "Grinders", &["Tools and Holders", "PRO", "Grinders"]);
        grinder.sku = Some("0601388108".into());

        vec![drill, saw, grinder]
    }

    fn names(found: &[&Product]) -> Vec<String> {
        found.iter().map(|p| p.product_name.clone()).collect()
    }

    #[test]
    fn test_text_search_covers_name_sku_description_and_tags() {
        let products = sample();
        let by = |text: &str| names(&apply_filters(&products, &Filters::new().with_text(text)));

        assert_eq!(by("gsr"), vec!["GSR 18V-28"]);
        assert_eq!(by("0601388"), vec!["GWS 7-125"]);
        assert_eq!(by("WOOD"), vec!["PKS 18"]);
        assert_eq!(by("cordless"), vec!["GSR 18V-28", "PKS 18"]);
        assert_eq!(by("  "), vec!["GSR 18V-28", "PKS 18", "GWS 7-125"]);
    }

    #[test]
    fn test_filters_combine() {
        let products = sample();
        let pro = Filters::new().with_range("PRO");
        assert_eq!(apply_filters(&products, &pro).len(), 2);

        let pro_drills = pro.clone().with_category("Drills");
        assert_eq!(names(&apply_filters(&products, &pro_drills)), vec!["GSR 18V-28"]);

        let lboxx = Filters::new().with_holder_variant("L-Boxx");
        assert_eq!(names(&apply_filters(&products, &lboxx)), vec!["GSR 18V-28"]);

        let tags = Filters::new().with_tag("CORDLESS").with_tag("bestseller");
        assert_eq!(names(&apply_filters(&products, &tags)), vec!["GSR 18V-28"]);
    }

    #[test]
    fn test_sorting() {
        let products = sample();
        let sorted = |key, dir| names(&filter_and_sort(&products, &Filters::new().sorted_by(key, dir)));

        assert_eq!(
            sorted(SortKey::Name, SortDirection::Ascending),
            vec!["GSR 18V-28", "GWS 7-125", "PKS 18"]
        );
        assert_eq!(
            sorted(SortKey::Range, SortDirection::Ascending),
            vec!["PKS 18", "GSR 18V-28", "GWS 7-125"]
        );
        assert_eq!(
            sorted(SortKey::Range, SortDirection::Descending),
            vec!["GWS 7-125", "GSR 18V-28", "PKS 18"]
        );
        // Missing SKU sorts first
        assert_eq!(
            sorted(SortKey::Sku, SortDirection::Ascending),
            vec!["PKS 18", "GWS 7-125", "GSR 18V-28"]
        );
        assert_eq!(
            sorted(SortKey::Unsorted, SortDirection::Descending),
            vec!["GSR 18V-28", "PKS 18", "GWS 7-125"]
        );
    }

    #[test]
    fn test_unique_facets() {
        let products = sample();
        assert_eq!(unique_ranges(&products), vec!["DIY", "PRO"]);
        assert_eq!(unique_categories(&products), vec!["Drills", "Grinders", "Saws"]);
        assert_eq!(unique_holder_variants(&products), vec!["L-Boxx", "Tego"]);
    }

    #[test]
    fn test_category_tree() {
        let mut products = sample();
        products.push(product("Loose", "", "", &[]));
        let tree = build_category_tree(&products);

        assert_eq!(tree.name, CATEGORY_ROOT);
        assert_eq!(tree.product_count, 0);
        assert_eq!(tree.children.len(), 2);

        let top = &tree.children[0];
        assert_eq!(top.name, "Tools and Holders");
        assert_eq!(top.product_count, 2);
        let drills = tree.find("Tools and Holders > PRO > Drills").unwrap();
        assert_eq!(drills.product_count, 1);
        assert!(drills.children.is_empty());
        assert_eq!(tree.find("DIY").unwrap().product_count, 1);
        assert!(tree.find("PRO").is_none());
    }

    #[test]
    fn test_filters_json_shape() {
        let json = r#"{"searchText":"gsr","ranges":["PRO"],"sortBy":"sku","sortDir":"descending"}"#;
        let filters: Filters = serde_json::from_str(json).unwrap();
        assert_eq!(filters.search_text, "gsr");
        assert_eq!(filters.sort_by, SortKey::Sku);
        assert_eq!(filters.sort_dir, SortDirection::Descending);
        assert!(filters.categories.is_empty());
    }
}
