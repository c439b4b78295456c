//! Flattening a model's build into world-space geometry objects

use super::core::{Mesh, Model};
use crate::error::{Error, Result};
use crate::transform::Transform;
use nalgebra::Vector3;

/// Deepest component nesting accepted before the file is rejected
const MAX_COMPONENT_DEPTH: usize = 32;

/// Most object visits one flatten may make; shared sub-assemblies count once per use
const MAX_OBJECT_VISITS: usize = 100_000;

/// A standalone mesh in millimetres with no references back into its source model
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryObject {
    /// Name of the source object, if any
    pub name: Option<String>,
    /// The mesh
    pub mesh: Mesh,
}

impl GeometryObject {
    /// Create a geometry object
    pub fn new(name: Option<String>, mesh: Mesh) -> Self {
        Self { name, mesh }
    }

    /// A copy moved by `transform`
    pub fn transformed(&self, transform: &Transform) -> GeometryObject {
        GeometryObject {
            name: self.name.clone(),
            mesh: self.mesh.transformed(transform),
        }
    }
}

impl Model {
    /// Collect the model's placed geometry as independent objects
    ///
    /// Every build item is expanded through its component tree with item and
    /// component transforms baked into the vertices, and coordinates are
    /// converted to millimetres. A model with an empty build contributes each
    /// mesh object untransformed. Objects whose mesh has no triangles are
    /// skipped.
    pub fn flatten(&self) -> Result<Vec<GeometryObject>> {
        let unit = Transform::scale(Vector3::repeat(self.unit_scale_to_mm()));
        let mut out = Vec::new();

        if self.build.items.is_empty() {
            for object in &self.resources.objects {
                if let Some(mesh) = object.mesh.as_ref().filter(|m| !m.is_empty()) {
                    out.push(GeometryObject::new(
                        object.name.clone(),
                        mesh.transformed(&unit),
                    ));
                }
            }
            return Ok(out);
        }

        let mut walk = Walk {
            stack: Vec::new(),
            visits: 0,
            out,
        };
        for item in &self.build.items {
            let placement = unit * item.transform.unwrap_or_default();
            self.expand(item.objectid, placement, &mut walk)?;
        }
        Ok(walk.out)
    }

    fn expand(&self, objectid: usize, placement: Transform, walk: &mut Walk) -> Result<()> {
        walk.visits += 1;
        if walk.visits > MAX_OBJECT_VISITS {
            return Err(Error::InvalidModel(format!(
                "Component tree expands to more than {} objects",
                MAX_OBJECT_VISITS
            )));
        }
        let stack = &mut walk.stack;
        if stack.contains(&objectid) {
            return Err(Error::InvalidModel(format!(
                "Circular component reference through object {}",
                objectid
            )));
        }
        if stack.len() >= MAX_COMPONENT_DEPTH {
            return Err(Error::InvalidModel(format!(
                "Component nesting deeper than {} levels",
                MAX_COMPONENT_DEPTH
            )));
        }

        let object = self.resources.object(objectid).ok_or_else(|| {
            Error::InvalidModel(format!("Reference to non-existent object {}", objectid))
        })?;

        stack.push(objectid);
        if let Some(mesh) = object.mesh.as_ref().filter(|m| !m.is_empty()) {
            walk.out.push(GeometryObject::new(
                object.name.clone(),
                mesh.transformed(&placement),
            ));
        }
        for component in &object.components {
            let child = placement * component.transform.unwrap_or_default();
            self.expand(component.objectid, child, walk)?;
        }
        walk.stack.pop();
        Ok(())
    }
}

/// Traversal state for [`Model::flatten`]
struct Walk {
    stack: Vec<usize>,
    visits: usize,
    out: Vec<GeometryObject>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuildItem, Component, Object, Triangle, Vertex};

    fn unit_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(0.0, 1.0, 0.0));
        mesh.triangles.push(Triangle::new(0, 1, 2));
        mesh
    }

    #[test]
    fn test_flatten_bakes_item_and_component_transforms() {
        let mut model = Model::new();
        model
            .resources
            .objects
            .push(Object::with_mesh(1, Some("part".into()), unit_triangle()));
        let mut assembly = Object::new(2);
        assembly.components.push(Component::with_transform(
            1,
            Transform::translation(Vector3::new(10.0, 0.0, 0.0)),
        ));
        model.resources.objects.push(assembly);
        let mut item = BuildItem::new(2);
        item.transform = Some(Transform::translation(Vector3::new(0.0, 0.0, 3.0)));
        model.build.items.push(item);

        let flat = model.flatten().unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].name.as_deref(), Some("part"));
        assert_eq!(flat[0].mesh.vertices[1], Vertex::new(11.0, 0.0, 3.0));
    }

    #[test]
    fn test_flatten_scales_units() {
        let mut model = Model::new();
        model.unit = "centimeter".to_string();
        model
            .resources
            .objects
            .push(Object::with_mesh(1, None, unit_triangle()));
        let flat = model.flatten().unwrap();
        assert_eq!(flat[0].mesh.vertices[1], Vertex::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_flatten_rejects_cycles() {
        let mut model = Model::new();
        let mut a = Object::new(1);
        a.components.push(Component::new(2));
        let mut b = Object::new(2);
        b.components.push(Component::new(1));
        model.resources.objects.push(a);
        model.resources.objects.push(b);
        model.build.items.push(BuildItem::new(1));

        let err = model.flatten().unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn test_flatten_rejects_exponential_component_fanout() {
        // Each level references the one below twice: 2^30 leaf paths
        let levels = 30;
        let mut model = Model::new();
        model
            .resources
            .objects
            .push(Object::with_mesh(1, None, unit_triangle()));
        for id in 2..=levels {
            let mut level = Object::new(id);
            level.components.push(Component::new(id - 1));
            level.components.push(Component::new(id - 1));
            model.resources.objects.push(level);
        }
        model.build.items.push(BuildItem::new(levels));

        let err = model.flatten().unwrap_err();
        assert!(err.to_string().contains("more than"));
    }

    #[test]
    fn test_flatten_shared_component_within_budget() {
        let mut model = Model::new();
        model
            .resources
            .objects
            .push(Object::with_mesh(1, None, unit_triangle()));
        let mut pair = Object::new(2);
        pair.components.push(Component::new(1));
        pair.components.push(Component::with_transform(
            1,
            Transform::translation(Vector3::new(5.0, 0.0, 0.0)),
        ));
        model.resources.objects.push(pair);
        model.build.items.push(BuildItem::new(2));

        let flat = model.flatten().unwrap();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].mesh.vertices[1], Vertex::new(6.0, 0.0, 0.0));
    }
}
