//! XML writing for 3MF model files
//!
//! Serializes a [`Model`] back into core 3MF XML. Used to export documents
//! and to produce geometry files for tests and tooling.

mod core;

use self::core::{ElementWriter, write_build, write_object};
use crate::error::Result;
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use std::io::Write as IoWrite;

/// Write a Model to XML format
pub fn write_model_xml<W: IoWrite>(model: &Model, writer: W) -> Result<()> {
    let mut w = ElementWriter::new(Writer::new_with_indent(writer, b' ', 2));
    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)), "XML declaration")?;

    w.open(BytesStart::new("model").with_attributes([
        ("unit", model.unit.as_str()),
        ("xml:lang", "en-US"),
        ("xmlns", model.xmlns.as_str()),
    ]))?;

    for entry in &model.metadata {
        w.open(BytesStart::new("metadata").with_attributes([("name", entry.name.as_str())]))?;
        w.text(&entry.value)?;
        w.close("metadata")?;
    }

    w.open(BytesStart::new("resources"))?;
    for object in &model.resources.objects {
        write_object(&mut w, object)?;
    }
    w.close("resources")?;

    write_build(&mut w, &model.build)?;
    w.close("model")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use nalgebra::Vector3;

    #[test]
    fn test_write_minimal_model() {
        let model = Model::new();
        let mut output = Vec::new();
        write_model_xml(&model, &mut output).unwrap();

        let xml = String::from_utf8(output).unwrap();
        assert!(xml.contains("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("unit=\"millimeter\""));
        assert!(xml.contains("<resources>"));
        assert!(xml.contains("<build>"));
    }

    #[test]
    fn test_written_model_parses_back() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(1.5, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(0.0, 2.25, 0.0));
        mesh.triangles.push(Triangle::new(0, 1, 2));

        let mut model = Model::new();
        model
            .metadata
            .push(MetadataEntry::new("Designer", "catalog"));
        model
            .resources
            .objects
            .push(Object::with_mesh(1, Some("clip".into()), mesh.clone()));
        let mut item = BuildItem::new(1);
        item.transform = Some(Transform::translation(Vector3::new(1.0, 2.0, 3.0)));
        model.build.items.push(item);

        let mut output = Vec::new();
        write_model_xml(&model, &mut output).unwrap();
        let parsed = crate::parser::parse_model_xml(&String::from_utf8(output).unwrap()).unwrap();

        assert_eq!(parsed.get_metadata("Designer"), Some("catalog"));
        assert_eq!(parsed.resources.objects[0].mesh.as_ref(), Some(&mesh));
        assert_eq!(parsed.resources.objects[0].name.as_deref(), Some("clip"));
        let t = parsed.build.items[0].transform.unwrap();
        assert_eq!(t.translation_part(), Vector3::new(1.0, 2.0, 3.0));
    }
}
