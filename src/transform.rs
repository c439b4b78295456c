//! Affine transforms used for holder poses, placements and 3MF build items
//!
//! Transforms act on column vectors: `a * b` applies `b` first, then `a`.
//! [`Transform::then`] reads left-to-right in application order and is what
//! most call sites use.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use std::ops::Mul;

/// Number of values in a 3MF `transform` attribute
pub const TRANSFORM_3MF_SIZE: usize = 12;

/// A 4x4 affine transform in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Transform {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap an existing homogeneous matrix
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// The underlying homogeneous matrix
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Translation by `offset`
    pub fn translation(offset: Vector3<f64>) -> Self {
        Self::from_matrix(Matrix4::new_translation(&offset))
    }

    /// Non-uniform scale about the world origin
    pub fn scale(factors: Vector3<f64>) -> Self {
        Self::from_matrix(Matrix4::new_nonuniform_scaling(&factors))
    }

    /// Rotation about the world X axis, in degrees
    pub fn rotation_x_degrees(degrees: f64) -> Self {
        Self::from_matrix(
            Rotation3::from_axis_angle(&Vector3::x_axis(), degrees.to_radians()).to_homogeneous(),
        )
    }

    /// Rotation about the world Y axis, in degrees
    pub fn rotation_y_degrees(degrees: f64) -> Self {
        Self::from_matrix(
            Rotation3::from_axis_angle(&Vector3::y_axis(), degrees.to_radians()).to_homogeneous(),
        )
    }

    /// Rotation about the world Z axis, in degrees
    pub fn rotation_z_degrees(degrees: f64) -> Self {
        Self::from_matrix(
            Rotation3::from_axis_angle(&Vector3::z_axis(), degrees.to_radians()).to_homogeneous(),
        )
    }

    /// Apply `self`, then `next`
    pub fn then(&self, next: &Transform) -> Transform {
        Transform::from_matrix(next.matrix * self.matrix)
    }

    /// Transform a point
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(point)
    }

    /// The translation column
    pub fn translation_part(&self) -> Vector3<f64> {
        Vector3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Exact identity check
    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }

    /// Element-wise comparison within `epsilon`
    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Inverse, if the transform is not singular
    pub fn try_inverse(&self) -> Option<Transform> {
        self.matrix.try_inverse().map(Transform::from_matrix)
    }

    /// Convert to the 3MF attribute layout
    ///
    /// 3MF stores a 4x3 matrix applied to row vectors:
    /// `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32`, where the last row
    /// is the translation. That is the transpose of the linear part followed
    /// by the translation column.
    pub fn to_3mf(&self) -> [f64; TRANSFORM_3MF_SIZE] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(1, 0)],
            m[(2, 0)],
            m[(0, 1)],
            m[(1, 1)],
            m[(2, 1)],
            m[(0, 2)],
            m[(1, 2)],
            m[(2, 2)],
            m[(0, 3)],
            m[(1, 3)],
            m[(2, 3)],
        ]
    }

    /// Build from the 3MF attribute layout (see [`Transform::to_3mf`])
    pub fn from_3mf(values: &[f64; TRANSFORM_3MF_SIZE]) -> Self {
        let v = values;
        Self::from_matrix(Matrix4::new(
            v[0], v[3], v[6], v[9], //
            v[1], v[4], v[7], v[10], //
            v[2], v[5], v[8], v[11], //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Format as a 3MF `transform` attribute value
    pub fn to_3mf_string(&self) -> String {
        self.to_3mf()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform::from_matrix(self.matrix * rhs.matrix)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        Transform::from_matrix(self.matrix * rhs.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_then_applies_in_order() {
        let t = Transform::rotation_z_degrees(90.0)
            .then(&Transform::translation(Vector3::new(0.0, 0.0, 10.0)));
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_3mf_layout_round_trip() {
        let t = Transform::rotation_x_degrees(30.0)
            .then(&Transform::scale(Vector3::new(2.0, 1.0, 0.5)))
            .then(&Transform::translation(Vector3::new(1.0, 2.0, 3.0)));
        let back = Transform::from_3mf(&t.to_3mf());
        assert!(t.approx_eq(&back, 0.0));
    }

    #[test]
    fn test_3mf_row_vector_convention() {
        // x' = x*m00 + y*m10 + z*m20 + m30
        let values = [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 5.0, 6.0, 7.0];
        let t = Transform::from_3mf(&values);
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 7.0);
        assert_relative_eq!(p.z, 7.0);
    }

    #[test]
    fn test_inverse_of_translation() {
        let t = Transform::translation(Vector3::new(3.0, -4.0, 5.0));
        let inv = t.try_inverse().unwrap();
        assert!((t * inv).approx_eq(&Transform::identity(), 1e-12));
        assert!(Transform::scale(Vector3::new(0.0, 1.0, 1.0))
            .try_inverse()
            .is_none());
    }
}
