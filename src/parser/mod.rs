//! XML parsing for 3MF model files
//!
//! Only the core vocabulary is read. Elements from extension namespaces
//! (anything with a namespace prefix) are skipped together with their
//! children, so files exported with materials or production data still
//! yield their meshes.

mod core;

use crate::error::{Error, Result};
use crate::model::*;
use crate::opc::Package;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};

use self::core::parse_component;
pub use self::core::{parse_build_item, parse_object, parse_triangle, parse_vertex};

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Parse a 3MF file from a reader
pub fn parse_3mf<R: Read + Seek>(reader: R) -> Result<Model> {
    let mut package = Package::open(reader)?;
    let model_xml = package.get_model()?;
    parse_model_xml(&model_xml)
}

/// Get the local part of a possibly prefixed XML name
///
/// - `"m:colorgroup"` returns `"colorgroup"`
/// - `"object"` returns `"object"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    match name_str.rfind(':') {
        Some(pos) => &name_str[pos + 1..],
        None => name_str,
    }
}

/// Parse attributes from an XML element
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let raw =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = unescape(raw).map_err(|e| Error::InvalidXml(e.to_string()))?;
        attrs.insert(key.to_string(), value.into_owned());
    }

    Ok(attrs)
}

/// Parse the 3D model XML content
pub fn parse_model_xml(xml: &str) -> Result<Model> {
    let check_len = xml.len().min(2000);
    let head = xml.get(..check_len).unwrap_or(xml).to_lowercase();
    if head.contains("<!doctype") {
        return Err(Error::InvalidXml(
            "DTD declarations are not allowed in 3MF files".to_string(),
        ));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::new();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut saw_model = false;
    let mut in_resources = false;
    let mut in_build = false;
    let mut in_components = false;
    let mut current_object: Option<Object> = None;
    let mut current_mesh: Option<Mesh> = None;
    let mut current_metadata: Option<MetadataEntry> = None;
    // Depth inside a skipped extension element; zero when not skipping.
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));

        match event {
            Event::DocType(_) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in 3MF files".to_string(),
                ));
            }
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                if skip_depth > 0 || name_str.contains(':') {
                    if !is_empty {
                        skip_depth += 1;
                    }
                    buf.clear();
                    continue;
                }

                match get_local_name(name_str) {
                    "model" => {
                        saw_model = true;
                        let attrs = parse_attributes(e)?;
                        if let Some(unit) = attrs.get("unit") {
                            match unit.as_str() {
                                "micron" | "millimeter" | "centimeter" | "inch" | "foot"
                                | "meter" => model.unit = unit.clone(),
                                _ => {
                                    return Err(Error::InvalidXml(format!(
                                        "Invalid unit '{}'. Must be one of: micron, millimeter, centimeter, inch, foot, meter",
                                        unit
                                    )));
                                }
                            }
                        }
                        if let Some(xmlns) = attrs.get("xmlns") {
                            model.xmlns = xmlns.clone();
                        }
                    }
                    "metadata" if !in_resources => {
                        let attrs = parse_attributes(e)?;
                        let name = attrs
                            .get("name")
                            .ok_or_else(|| Error::missing_attribute("metadata", "name"))?;
                        let entry = MetadataEntry::new(name.clone(), "");
                        if is_empty {
                            model.metadata.push(entry);
                        } else {
                            current_metadata = Some(entry);
                        }
                    }
                    "resources" => in_resources = true,
                    "build" => in_build = true,
                    "object" if in_resources => {
                        current_object = Some(parse_object(e)?);
                        if is_empty {
                            if let Some(obj) = current_object.take() {
                                model.resources.objects.push(obj);
                            }
                        }
                    }
                    "mesh" if current_object.is_some() => {
                        current_mesh = Some(Mesh::with_capacity(1024, 2048));
                    }
                    "vertex" => {
                        if let Some(ref mut mesh) = current_mesh {
                            mesh.vertices.push(parse_vertex(e)?);
                        }
                    }
                    "triangle" => {
                        if let Some(ref mut mesh) = current_mesh {
                            mesh.triangles.push(parse_triangle(e)?);
                        }
                    }
                    "components" if current_object.is_some() => in_components = true,
                    "component" if in_components => {
                        if let Some(ref mut obj) = current_object {
                            obj.components.push(parse_component(e)?);
                        }
                    }
                    "item" if in_build => {
                        model.build.items.push(parse_build_item(e)?);
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) => {
                if skip_depth == 0
                    && let Some(ref mut entry) = current_metadata
                {
                    let text =
                        std::str::from_utf8(t).map_err(|e| Error::InvalidXml(e.to_string()))?;
                    entry.value.push_str(text);
                }
            }
            Event::GeneralRef(ref r) => {
                if skip_depth == 0
                    && let Some(ref mut entry) = current_metadata
                {
                    let name =
                        std::str::from_utf8(r).map_err(|e| Error::InvalidXml(e.to_string()))?;
                    let reference = format!("&{};", name);
                    let resolved =
                        unescape(&reference).map_err(|e| Error::InvalidXml(e.to_string()))?;
                    entry.value.push_str(&resolved);
                }
            }
            Event::End(ref e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    buf.clear();
                    continue;
                }

                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "metadata" => {
                        if let Some(entry) = current_metadata.take() {
                            model.metadata.push(entry);
                        }
                    }
                    "resources" => in_resources = false,
                    "build" => in_build = false,
                    "components" => in_components = false,
                    "mesh" => {
                        if let (Some(obj), Some(mesh)) = (current_object.as_mut(), current_mesh.take())
                        {
                            obj.mesh = Some(mesh);
                        }
                    }
                    "object" => {
                        if let Some(obj) = current_object.take() {
                            model.resources.objects.push(obj);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_model {
        return Err(Error::InvalidXml(
            "Document has no <model> root element".to_string(),
        ));
    }

    validate_model(&model)?;
    Ok(model)
}

/// Check index bounds and object references
fn validate_model(model: &Model) -> Result<()> {
    let mut ids = HashSet::new();
    for object in &model.resources.objects {
        if !ids.insert(object.id) {
            return Err(Error::InvalidModel(format!(
                "Duplicate object id {}",
                object.id
            )));
        }
        if let Some(ref mesh) = object.mesh {
            let count = mesh.vertices.len();
            if let Some(t) = mesh
                .triangles
                .iter()
                .find(|t| t.v1 >= count || t.v2 >= count || t.v3 >= count)
            {
                return Err(Error::InvalidModel(format!(
                    "Object {}: triangle ({}, {}, {}) references a vertex outside 0..{}",
                    object.id, t.v1, t.v2, t.v3, count
                )));
            }
        }
    }

    for object in &model.resources.objects {
        for component in &object.components {
            if !ids.contains(&component.objectid) {
                return Err(Error::InvalidModel(format!(
                    "Object {}: component references non-existent object {}",
                    object.id, component.objectid
                )));
            }
        }
    }

    for item in &model.build.items {
        if !ids.contains(&item.objectid) {
            return Err(Error::InvalidModel(format!(
                "Build item references non-existent object {}",
                item.objectid
            )));
        }
    }

    Ok(())
}
