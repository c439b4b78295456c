//! Placement strings stored in collection items
//!
//! A placement string is a `;`-separated list of entries, each
//! `x,y,z,rx,ry,rz` with positions in millimetres and angles in degrees.
//! A bare `x,y,z` entry means no rotation.
//!
//! Stored angles are applied about Z first, then Y, then X (`Rx · Ry · Rz`
//! as a matrix). Holder transforms use the opposite order; existing
//! collections were written with this one, so both are kept as they are.

use crate::transform::Transform;
use nalgebra::{Point3, Vector3};

/// Entry separator
pub const ENTRY_SEPARATOR: char = ';';

/// Field separator within an entry
pub const FIELD_SEPARATOR: char = ',';

/// Below this |cos(ry)| the X and Z rotations are treated as coupled
const GIMBAL_EPSILON: f64 = 1e-9;

/// A world position and Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementEntry {
    /// Position in millimetres
    pub position: Point3<f64>,
    /// Rotation about X, Y and Z in degrees
    pub rotation: Vector3<f64>,
}

impl PlacementEntry {
    /// Create an entry
    pub fn new(position: Point3<f64>, rotation: Vector3<f64>) -> Self {
        Self { position, rotation }
    }

    /// An entry with no rotation
    pub fn at(position: Point3<f64>) -> Self {
        Self::new(position, Vector3::zeros())
    }

    /// The rotation as a transform: about Z, then Y, then X
    pub fn rotation_transform(&self) -> Transform {
        rotation_from_degrees(&self.rotation)
    }

    /// Rotation followed by translation to the position
    pub fn world_transform(&self) -> Transform {
        self.rotation_transform()
            .then(&Transform::translation(self.position.coords))
    }

    /// Recover an entry from a rigid world transform
    ///
    /// Angles come back in (-180, 180]. When the Y rotation is ±90° the Z
    /// angle is folded into X.
    pub fn from_world_transform(world: &Transform) -> Self {
        let m = world.matrix();
        let b = m[(0, 2)].clamp(-1.0, 1.0).asin();
        let (a, c) = if b.cos().abs() > GIMBAL_EPSILON {
            (
                (-m[(1, 2)]).atan2(m[(2, 2)]),
                (-m[(0, 1)]).atan2(m[(0, 0)]),
            )
        } else {
            (m[(2, 1)].atan2(m[(1, 1)]), 0.0)
        };

        Self {
            position: Point3::from(world.translation_part()),
            rotation: Vector3::new(a.to_degrees(), b.to_degrees(), c.to_degrees()),
        }
    }
}

/// A decoded entry: position plus composed rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPlacement {
    /// Position in millimetres
    pub position: Point3<f64>,
    /// Rotation about the world origin
    pub rotation: Transform,
}

impl DecodedPlacement {
    /// Rotation followed by translation to the position
    pub fn world_transform(&self) -> Transform {
        self.rotation
            .then(&Transform::translation(self.position.coords))
    }
}

impl From<&PlacementEntry> for DecodedPlacement {
    fn from(entry: &PlacementEntry) -> Self {
        Self {
            position: entry.position,
            rotation: entry.rotation_transform(),
        }
    }
}

/// Compose Euler angles in degrees: about Z, then Y, then X
pub fn rotation_from_degrees(degrees: &Vector3<f64>) -> Transform {
    Transform::rotation_z_degrees(degrees.z)
        .then(&Transform::rotation_y_degrees(degrees.y))
        .then(&Transform::rotation_x_degrees(degrees.x))
}

/// Serialize entries to a placement string
pub fn encode(entries: &[PlacementEntry]) -> String {
    let mut out = String::new();
    for (i, e) in entries.iter().enumerate() {
        if i > 0 {
            out.push(ENTRY_SEPARATOR);
        }
        let fields = [
            e.position.x,
            e.position.y,
            e.position.z,
            e.rotation.x,
            e.rotation.y,
            e.rotation.z,
        ];
        for (j, value) in fields.iter().enumerate() {
            if j > 0 {
                out.push(FIELD_SEPARATOR);
            }
            out.push_str(&value.to_string());
        }
    }
    out
}

/// Parse a placement string into positions and Euler angles
///
/// Never fails. Empty segments are ignored; an entry with six leading
/// numeric fields is a full placement, three to five is a position with no
/// rotation, anything shorter is dropped.
pub fn decode_entries(s: &str) -> Vec<PlacementEntry> {
    s.split(ENTRY_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(parse_entry)
        .collect()
}

/// Parse a placement string into positions and rotation transforms
pub fn decode(s: &str) -> Vec<DecodedPlacement> {
    decode_entries(s)
        .iter()
        .map(DecodedPlacement::from)
        .collect()
}

/// [`decode`] for a field that may be absent
pub fn decode_optional(s: Option<&str>) -> Vec<DecodedPlacement> {
    s.map(decode).unwrap_or_default()
}

fn parse_entry(segment: &str) -> Option<PlacementEntry> {
    let fields: Vec<f64> = segment
        .split(FIELD_SEPARATOR)
        .map_while(|f| f.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();

    match fields.as_slice() {
        [x, y, z, rx, ry, rz, ..] => Some(PlacementEntry::new(
            Point3::new(*x, *y, *z),
            Vector3::new(*rx, *ry, *rz),
        )),
        [x, y, z, ..] => Some(PlacementEntry::at(Point3::new(*x, *y, *z))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_encode_format() {
        let entries = [
            PlacementEntry::new(Point3::new(1.5, -2.0, 0.0), Vector3::new(0.0, 0.0, 90.0)),
            PlacementEntry::at(Point3::new(1200.0, 0.0, 0.0)),
        ];
        assert_eq!(encode(&entries), "1.5,-2,0,0,0,90;1200,0,0,0,0,0");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_encode_uses_decode_separators() {
        let entries = [
            PlacementEntry::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0)),
            PlacementEntry::new(Point3::new(-7.25, 0.0, 8.0), Vector3::new(0.0, 45.0, 0.0)),
        ];
        let encoded = encode(&entries);
        let segments: Vec<&str> = encoded.split(ENTRY_SEPARATOR).collect();
        assert_eq!(segments.len(), entries.len());
        for segment in &segments {
            assert_eq!(segment.split(FIELD_SEPARATOR).count(), 6);
        }
        assert_eq!(decode_entries(&encoded), entries.to_vec());
    }

    #[test]
    fn test_decode_is_total() {
        assert!(decode("").is_empty());
        assert!(decode_optional(None).is_empty());
        assert!(decode("garbage;;1,2").is_empty());
        assert!(decode(";;;").is_empty());
        assert!(decode("1,2,abc").is_empty());
    }

    #[test]
    fn test_decode_legacy_position_only() {
        let decoded = decode("10,20,30");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].position, Point3::new(10.0, 20.0, 30.0));
        assert!(decoded[0].rotation.is_identity());

        // Four or five numeric fields still mean position only
        let decoded = decode("1,2,3,45,oops,7");
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].rotation.is_identity());
    }

    #[test]
    fn test_decode_skips_bad_entries_only() {
        let decoded = decode(" 1,2,3,0,0,0 ; nonsense ; 4,5,6 ");
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].position, Point3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_decode_rotation_order_z_then_y_then_x() {
        let decoded = decode("0,0,0,90,0,90");
        // (1,0,0) -> Rz (0,1,0) -> Rx (0,0,1)
        let p = decoded[0]
            .rotation
            .transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_world_transform_rotates_then_moves() {
        let entry = PlacementEntry::new(Point3::new(100.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 90.0));
        let p = entry
            .world_transform()
            .transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(100.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_euler_extraction_recovers_angles() {
        let entry = PlacementEntry::new(Point3::new(5.0, 6.0, 7.0), Vector3::new(30.0, -45.0, 120.0));
        let back = PlacementEntry::from_world_transform(&entry.world_transform());
        assert_relative_eq!(back.position, entry.position, epsilon = 1e-9);
        assert_relative_eq!(back.rotation, entry.rotation, epsilon = 1e-9);
    }

    #[test]
    fn test_euler_extraction_gimbal_lock() {
        let entry = PlacementEntry::new(Point3::origin(), Vector3::new(20.0, 90.0, 15.0));
        let back = PlacementEntry::from_world_transform(&entry.world_transform());
        assert_eq!(back.rotation.z, 0.0);
        assert!(back
            .world_transform()
            .approx_eq(&entry.world_transform(), 1e-9));
    }
}
