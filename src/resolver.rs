//! Holder-relative pose resolution
//!
//! A product's mesh is authored in the pose of its reference holder. Each
//! entry in `holderTransforms` moves that reference geometry into the pose
//! that mates with another holder variant. Resolution is pure: no I/O and
//! identical inputs give bit-identical matrices.

use crate::catalog::{Holder, HolderTransform, Product};
use crate::transform::Transform;
use nalgebra::Vector3;
use tracing::trace;

/// A composed holder transform and the holder it was resolved for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlacement<'a> {
    /// Transform taking reference-pose geometry into the holder's pose
    pub transform: Transform,
    /// The holder, or `None` for a product shown on its own
    pub holder: Option<&'a Holder>,
}

/// The variant whose transform applies: the holder's, else the product's
/// reference holder, else "Tego"
pub fn target_holder_key<'a>(product: &'a Product, holder: Option<&'a Holder>) -> &'a str {
    holder
        .map(|h| h.variant.as_str())
        .unwrap_or_else(|| product.reference_holder_name())
}

/// Resolve the pose adjustment for showing `product` with `holder`
///
/// Variants without an entry in the product's table resolve to identity.
pub fn resolve<'a>(product: &Product, holder: Option<&'a Holder>) -> ResolvedPlacement<'a> {
    let key = target_holder_key(product, holder);
    let transform = match product.holder_transform(key) {
        Some(ht) => compose_holder_transform(ht),
        None => Transform::identity(),
    };
    trace!(product = %product.id, key, identity = transform.is_identity(), "resolved holder transform");
    ResolvedPlacement { transform, holder }
}

/// Compose scale, then rotations about X, Y and Z, then translation
///
/// Factors equal to one and zero angles are left out so that partial
/// entries produce exactly the same matrix as a hand-built one.
pub fn compose_holder_transform(ht: &HolderTransform) -> Transform {
    let mut m = Transform::identity();

    let [sx, sy, sz] = ht.scale;
    if sx != 1.0 || sy != 1.0 || sz != 1.0 {
        m = m.then(&Transform::scale(Vector3::new(sx, sy, sz)));
    }

    let [rx, ry, rz] = ht.rotation;
    if rx != 0.0 {
        m = m.then(&Transform::rotation_x_degrees(rx));
    }
    if ry != 0.0 {
        m = m.then(&Transform::rotation_y_degrees(ry));
    }
    if rz != 0.0 {
        m = m.then(&Transform::rotation_z_degrees(rz));
    }

    let [tx, ty, tz] = ht.translation;
    if tx != 0.0 || ty != 0.0 || tz != 0.0 {
        m = m.then(&Transform::translation(Vector3::new(tx, ty, tz)));
    }

    m
}
