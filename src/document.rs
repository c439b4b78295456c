//! The host document that insertion writes into
//!
//! A [`Document`] keeps a table of named block definitions, the instances
//! placed from them, loose tagged objects and named groups. Definition names
//! are unique and compared exactly. All mutation goes through `&mut Document`,
//! so a document has at most one writer at a time.

use crate::error::{Error, Result};
use crate::model::{BuildItem, Component, GeometryObject, Model, Object};
use crate::transform::Transform;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key/value tags attached to instances and objects
pub type Tags = BTreeMap<String, String>;

/// Handle of a definition in its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(pub usize);

/// Handle of an instance in its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub usize);

/// Handle of a loose object in its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// How a definition relates to the file it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    /// Geometry is a private copy inside the document
    Embedded,
    /// Geometry is a copy that stays associated with its source file
    Linked {
        /// The source file
        path: PathBuf,
    },
}

/// A named, reusable set of geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Handle
    pub id: DefinitionId,
    /// Identity key the definition is registered under
    pub name: String,
    /// Geometry in definition space
    pub objects: Vec<GeometryObject>,
    /// Embedded or linked
    pub source: DefinitionSource,
    /// Transform already applied to `objects` when they were registered
    pub baked: Transform,
}

/// A placement of a definition
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Handle
    pub id: InstanceId,
    /// The placed definition
    pub definition: DefinitionId,
    /// Definition space to world
    pub transform: Transform,
    /// Provenance tags
    pub tags: Tags,
}

/// Geometry placed directly in the document, outside any definition
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentObject {
    /// Handle
    pub id: ObjectId,
    /// World-space geometry
    pub geometry: GeometryObject,
    /// Provenance tags
    pub tags: Tags,
}

/// A named set of loose objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Member objects
    pub members: Vec<ObjectId>,
}

/// An open document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    definitions: Vec<Definition>,
    instances: Vec<Instance>,
    objects: Vec<DocumentObject>,
    groups: Vec<Group>,
}

impl Document {
    /// An empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// All definitions in registration order
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Look a definition up by handle
    pub fn definition(&self, id: DefinitionId) -> Option<&Definition> {
        self.definitions.get(id.0)
    }

    /// Look a definition up by its exact name
    pub fn find_definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Register a new definition
    ///
    /// Fails with [`Error::DuplicateDefinition`] when the name is taken.
    pub fn add_definition(
        &mut self,
        name: impl Into<String>,
        objects: Vec<GeometryObject>,
        source: DefinitionSource,
        baked: Transform,
    ) -> Result<DefinitionId> {
        let name = name.into();
        if self.find_definition(&name).is_some() {
            return Err(Error::DuplicateDefinition(name));
        }
        let id = DefinitionId(self.definitions.len());
        self.definitions.push(Definition {
            id,
            name,
            objects,
            source,
            baked,
        });
        Ok(id)
    }

    /// Place a definition
    pub fn add_instance(&mut self, definition: DefinitionId, transform: Transform) -> Result<InstanceId> {
        if self.definition(definition).is_none() {
            return Err(Error::UnknownDefinition(definition.0));
        }
        let id = InstanceId(self.instances.len());
        self.instances.push(Instance {
            id,
            definition,
            transform,
            tags: Tags::new(),
        });
        Ok(id)
    }

    /// All instances in placement order
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Look an instance up by handle
    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.0)
    }

    /// Mutable access to an instance, e.g. to tag it
    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id.0)
    }

    /// Add world-space geometry as a loose object
    pub fn add_object(&mut self, geometry: GeometryObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(DocumentObject {
            id,
            geometry,
            tags: Tags::new(),
        });
        id
    }

    /// All loose objects
    pub fn objects(&self) -> &[DocumentObject] {
        &self.objects
    }

    /// Mutable access to a loose object
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut DocumentObject> {
        self.objects.get_mut(id.0)
    }

    /// Collect loose objects under a name
    pub fn add_group(&mut self, name: impl Into<String>, members: Vec<ObjectId>) -> usize {
        self.groups.push(Group {
            name: name.into(),
            members,
        });
        self.groups.len() - 1
    }

    /// All groups
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Export as a 3MF model
    ///
    /// Each definition becomes a components object named after it, over one
    /// mesh object per geometry object. Instances and loose objects become
    /// build items. Tags and groups have no 3MF counterpart and are dropped.
    pub fn to_model(&self) -> Model {
        let mut model = Model::new();
        let mut next_id = 1usize;
        let mut definition_objects = Vec::with_capacity(self.definitions.len());

        for definition in &self.definitions {
            let mut components = Vec::with_capacity(definition.objects.len());
            for geometry in &definition.objects {
                let id = next_id;
                next_id += 1;
                model
                    .resources
                    .objects
                    .push(Object::with_mesh(id, geometry.name.clone(), geometry.mesh.clone()));
                components.push(Component::new(id));
            }

            let mut object = Object::new(next_id);
            object.name = Some(definition.name.clone());
            object.components = components;
            definition_objects.push(next_id);
            next_id += 1;
            model.resources.objects.push(object);
        }

        for instance in &self.instances {
            let mut item = BuildItem::new(definition_objects[instance.definition.0]);
            if !instance.transform.is_identity() {
                item.transform = Some(instance.transform);
            }
            model.build.items.push(item);
        }

        for loose in &self.objects {
            let id = next_id;
            next_id += 1;
            model.resources.objects.push(Object::with_mesh(
                id,
                loose.geometry.name.clone(),
                loose.geometry.mesh.clone(),
            ));
            model.build.items.push(BuildItem::new(id));
        }

        model
    }

    /// Write the document as a 3MF package
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_model().write_to_file(path)
    }
}

/// Access to the document insertion should write into
pub trait DocumentHost {
    /// The active document, if any
    fn active_document(&mut self) -> Option<&mut Document>;
}

impl DocumentHost for Document {
    fn active_document(&mut self) -> Option<&mut Document> {
        Some(self)
    }
}

impl DocumentHost for Option<Document> {
    fn active_document(&mut self) -> Option<&mut Document> {
        self.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, Triangle, Vertex};
    use nalgebra::Vector3;

    fn triangle(name: &str) -> GeometryObject {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(0.0, 1.0, 0.0));
        mesh.triangles.push(Triangle::new(0, 1, 2));
        GeometryObject::new(Some(name.to_string()), mesh)
    }

    #[test]
    fn test_definition_names_are_unique_and_exact() {
        let mut doc = Document::new();
        let id = doc
            .add_definition("Drill_Tego_Black", vec![triangle("a")], DefinitionSource::Embedded, Transform::identity())
            .unwrap();
        assert_eq!(doc.find_definition("Drill_Tego_Black").unwrap().id, id);
        assert!(doc.find_definition("drill_tego_black").is_none());

        let err = doc
            .add_definition("Drill_Tego_Black", vec![], DefinitionSource::Embedded, Transform::identity())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(_)));
        assert_eq!(doc.definitions().len(), 1);
    }

    #[test]
    fn test_instance_requires_known_definition() {
        let mut doc = Document::new();
        let err = doc.add_instance(DefinitionId(3), Transform::identity()).unwrap_err();
        assert!(matches!(err, Error::UnknownDefinition(3)));
    }

    #[test]
    fn test_to_model_exports_instances_and_objects() {
        let mut doc = Document::new();
        let def = doc
            .add_definition("Box", vec![triangle("a"), triangle("b")], DefinitionSource::Embedded, Transform::identity())
            .unwrap();
        doc.add_instance(def, Transform::identity()).unwrap();
        doc.add_instance(def, Transform::translation(Vector3::new(5.0, 0.0, 0.0)))
            .unwrap();
        doc.add_object(triangle("loose"));

        let model = doc.to_model();
        assert_eq!(model.resources.objects.len(), 4);
        assert_eq!(model.build.items.len(), 3);
        assert_eq!(model.build.items[0].objectid, 3);
        assert!(model.build.items[0].transform.is_none());
        assert!(model.build.items[1].transform.is_some());

        let flat = model.flatten().unwrap();
        assert_eq!(flat.len(), 5);
    }

    #[test]
    fn test_document_host() {
        let mut none: Option<Document> = None;
        assert!(none.active_document().is_none());

        let mut some = Some(Document::new());
        assert!(some.active_document().is_some());

        let mut doc = Document::new();
        assert!(doc.active_document().is_some());
    }
}
