//! Core element writing: objects, meshes, components and build items

use crate::error::{Error, Result};
use crate::model::*;
use crate::transform::Transform;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Write as IoWrite;

/// Event writer that names the element in every failure
pub(super) struct ElementWriter<W: IoWrite> {
    inner: Writer<W>,
}

impl<W: IoWrite> ElementWriter<W> {
    pub(super) fn new(inner: Writer<W>) -> Self {
        Self { inner }
    }

    pub(super) fn event(&mut self, event: Event<'_>, what: &str) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| Error::xml_write(format!("Failed to write {}: {}", what, e)))
    }

    pub(super) fn open(&mut self, elem: BytesStart<'_>) -> Result<()> {
        let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
        self.event(Event::Start(elem), &format!("<{}>", name))
    }

    pub(super) fn close(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)), &format!("</{}>", name))
    }

    pub(super) fn empty(&mut self, elem: BytesStart<'_>) -> Result<()> {
        let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
        self.event(Event::Empty(elem), &format!("<{}/>", name))
    }

    pub(super) fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)), "text")
    }
}

fn with_transform<'a>(mut elem: BytesStart<'a>, transform: Option<&Transform>) -> BytesStart<'a> {
    if let Some(t) = transform {
        elem.push_attribute(("transform", t.to_3mf_string().as_str()));
    }
    elem
}

/// Write an object with its mesh or components
pub(super) fn write_object<W: IoWrite>(w: &mut ElementWriter<W>, object: &Object) -> Result<()> {
    let mut elem = BytesStart::new("object");
    elem.push_attribute(("id", object.id.to_string().as_str()));
    elem.push_attribute(("type", object.object_type.as_str()));
    if let Some(name) = &object.name {
        elem.push_attribute(("name", name.as_str()));
    }
    w.open(elem)?;

    if let Some(mesh) = &object.mesh {
        write_mesh(w, mesh)?;
    }
    if !object.components.is_empty() {
        w.open(BytesStart::new("components"))?;
        for component in &object.components {
            let mut elem = BytesStart::new("component");
            elem.push_attribute(("objectid", component.objectid.to_string().as_str()));
            w.empty(with_transform(elem, component.transform.as_ref()))?;
        }
        w.close("components")?;
    }

    w.close("object")
}

fn write_mesh<W: IoWrite>(w: &mut ElementWriter<W>, mesh: &Mesh) -> Result<()> {
    w.open(BytesStart::new("mesh"))?;

    w.open(BytesStart::new("vertices"))?;
    for v in &mesh.vertices {
        let (x, y, z) = (v.x.to_string(), v.y.to_string(), v.z.to_string());
        w.empty(BytesStart::new("vertex").with_attributes([
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("z", z.as_str()),
        ]))?;
    }
    w.close("vertices")?;

    w.open(BytesStart::new("triangles"))?;
    for t in &mesh.triangles {
        let (v1, v2, v3) = (t.v1.to_string(), t.v2.to_string(), t.v3.to_string());
        w.empty(BytesStart::new("triangle").with_attributes([
            ("v1", v1.as_str()),
            ("v2", v2.as_str()),
            ("v3", v3.as_str()),
        ]))?;
    }
    w.close("triangles")?;

    w.close("mesh")
}

/// Write the build section
pub(super) fn write_build<W: IoWrite>(w: &mut ElementWriter<W>, build: &Build) -> Result<()> {
    w.open(BytesStart::new("build"))?;
    for item in &build.items {
        let mut elem = BytesStart::new("item");
        elem.push_attribute(("objectid", item.objectid.to_string().as_str()));
        w.empty(with_transform(elem, item.transform.as_ref()))?;
    }
    w.close("build")
}
