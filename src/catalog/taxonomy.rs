//! Taxonomy and id derivation from a product's folder location

use super::product::Product;
use std::path::{Component, Path};

/// Separator used in category paths and top categories
pub const CATEGORY_SEPARATOR: &str = " > ";

/// Range folder names recognised while scanning a product's path
const RANGE_NAMES: [&str; 2] = ["DIY", "PRO"];

/// Category fields derived from folder segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    /// The range segment, uppercased when it is DIY or PRO
    pub range: String,
    /// Segments before the range, joined with " > "
    pub top_category: Option<String>,
    /// The segment right after the range
    pub category: Option<String>,
    /// `path_segments` joined with " > "
    pub category_path: String,
    /// Top category, range, then intermediate folders up to but not
    /// including the product's own folder
    pub path_segments: Vec<String>,
}

/// Folder names between `root` and `folder`
///
/// Returns an empty list when `folder` is not below `root`.
pub fn relative_segments(root: &Path, folder: &Path) -> Vec<String> {
    folder
        .strip_prefix(root)
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Deterministic product id from its folder segments and name
///
/// Path separators and spaces become underscores. A product directly in the
/// catalog root gets the `"._"` prefix, matching ids already stored in user
/// collections.
pub fn product_id(segments: &[String], product_name: &str) -> String {
    let folder = if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("_").replace(' ', "_")
    };
    format!("{}_{}", folder, product_name)
}

/// Derive range and category fields from folder segments
///
/// The first segment equal to DIY or PRO (ignoring case) is the range and
/// everything before it is the top category. Without one, the first segment
/// is the range and there is no top category.
pub fn derive_taxonomy(segments: &[String]) -> Option<Taxonomy> {
    if segments.is_empty() {
        return None;
    }

    let range_index = segments
        .iter()
        .position(|s| RANGE_NAMES.iter().any(|r| s.eq_ignore_ascii_case(r)));

    let (range_index, range, top_category) = match range_index {
        Some(i) => {
            let top = (i > 0).then(|| segments[..i].join(CATEGORY_SEPARATOR));
            (i, segments[i].to_uppercase(), top)
        }
        None => (0, segments[0].clone(), None),
    };

    let category = segments.get(range_index + 1).cloned();

    let mut path_segments = Vec::new();
    if let Some(ref top) = top_category {
        path_segments.push(top.clone());
    }
    path_segments.push(range.clone());
    let last = segments.len() - 1;
    if range_index + 1 < last {
        path_segments.extend(segments[range_index + 1..last].iter().cloned());
    }

    Some(Taxonomy {
        category_path: path_segments.join(CATEGORY_SEPARATOR),
        range,
        top_category,
        category,
        path_segments,
    })
}

/// Fill id and taxonomy fields a product file left empty
pub(super) fn complete_product(product: &mut Product, segments: &[String]) {
    if product.id.trim().is_empty() {
        product.id = product_id(segments, &product.product_name);
    }

    let missing_path = product.category_path.as_deref().is_none_or(str::is_empty);
    let missing_range = product.range.as_deref().is_none_or(str::is_empty);
    if !(missing_path || missing_range) {
        return;
    }

    if let Some(taxonomy) = derive_taxonomy(segments) {
        product.range = Some(taxonomy.range);
        product.top_category = taxonomy.top_category;
        if product.category.as_deref().is_none_or(str::is_empty) {
            product.category = taxonomy.category;
        }
        product.category_path = Some(taxonomy.category_path);
        product.path_segments = taxonomy.path_segments;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn segs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wrapper_folder_above_range() {
        let t = derive_taxonomy(&segs(&["Tools and Holders", "PRO", "Garden", "Drills"])).unwrap();
        assert_eq!(t.top_category.as_deref(), Some("Tools and Holders"));
        assert_eq!(t.range, "PRO");
        assert_eq!(t.category.as_deref(), Some("Garden"));
        assert_eq!(t.path_segments, segs(&["Tools and Holders", "PRO", "Garden"]));
        assert_eq!(t.category_path, "Tools and Holders > PRO > Garden");
    }

    #[test]
    fn test_range_at_root() {
        let t = derive_taxonomy(&segs(&["DIY", "Saws"])).unwrap();
        assert_eq!(t.top_category, None);
        assert_eq!(t.range, "DIY");
        assert_eq!(t.category.as_deref(), Some("Saws"));
        assert_eq!(t.path_segments, segs(&["DIY"]));
    }

    #[test]
    fn test_range_is_uppercased() {
        let t = derive_taxonomy(&segs(&["pro", "Grinders", "GWS"])).unwrap();
        assert_eq!(t.range, "PRO");
        assert_eq!(t.path_segments, segs(&["PRO", "Grinders"]));
    }

    #[test]
    fn test_no_range_folder() {
        let t = derive_taxonomy(&segs(&["Accessories", "Bits", "Set"])).unwrap();
        assert_eq!(t.range, "Accessories");
        assert_eq!(t.top_category, None);
        assert_eq!(t.category.as_deref(), Some("Bits"));
        assert_eq!(t.category_path, "Accessories > Bits");
    }

    #[test]
    fn test_empty_segments() {
        assert!(derive_taxonomy(&[]).is_none());
    }

    #[test]
    fn test_product_id() {
        assert_eq!(
            product_id(&segs(&["Tools and Holders", "PRO", "Drills"]), "GSR 18V"),
            "Tools_and_Holders_PRO_Drills_GSR 18V"
        );
        assert_eq!(product_id(&[], "Loose"), "._Loose");
    }

    #[test]
    fn test_relative_segments() {
        let root = PathBuf::from("/catalog");
        let folder = root.join("PRO").join("Drills");
        assert_eq!(relative_segments(&root, &folder), segs(&["PRO", "Drills"]));
        assert!(relative_segments(&root, &PathBuf::from("/elsewhere")).is_empty());
    }

    #[test]
    fn test_complete_product_keeps_existing_taxonomy() {
        let mut product = Product {
            id: "fixed".into(),
            range: Some("DIY".into()),
            category_path: Some("DIY > Custom".into()),
            ..Product::default()
        };
        complete_product(&mut product, &segs(&["PRO", "Drills", "X"]));
        assert_eq!(product.id, "fixed");
        assert_eq!(product.range.as_deref(), Some("DIY"));
        assert_eq!(product.category_path.as_deref(), Some("DIY > Custom"));
    }
}
