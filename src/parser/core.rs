//! Core 3MF element parsing
//!
//! Handles objects, vertices, triangles, components and build items.

use crate::error::{Error, Result};
use crate::model::*;
use crate::transform::{TRANSFORM_3MF_SIZE, Transform};
use quick_xml::events::BytesStart;

use super::parse_attributes;

/// Parse object element attributes
pub fn parse_object(e: &BytesStart) -> Result<Object> {
    let attrs = parse_attributes(e)?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("object", "id"))?
        .parse::<usize>()?;

    let mut object = Object::new(id);
    object.name = attrs.get("name").cloned();

    if let Some(type_str) = attrs.get("type") {
        object.object_type = match type_str.as_str() {
            "model" => ObjectType::Model,
            "support" => ObjectType::Support,
            "solidsupport" => ObjectType::SolidSupport,
            "surface" => ObjectType::Surface,
            "other" => ObjectType::Other,
            _ => {
                return Err(Error::InvalidXml(format!(
                    "Invalid object type '{}'. Must be one of: model, support, solidsupport, surface, other",
                    type_str
                )));
            }
        };
    }

    Ok(object)
}

/// Parse vertex element attributes
pub fn parse_vertex(e: &BytesStart) -> Result<Vertex> {
    let mut x_opt: Option<f64> = None;
    let mut y_opt: Option<f64> = None;
    let mut z_opt: Option<f64> = None;

    let parse_f64 = |value: &[u8]| -> Result<f64> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        Ok(value_str.trim().parse::<f64>()?)
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => x_opt = Some(parse_f64(&attr.value)?),
            b"y" => y_opt = Some(parse_f64(&attr.value)?),
            b"z" => z_opt = Some(parse_f64(&attr.value)?),
            _ => {}
        }
    }

    let x = x_opt.ok_or_else(|| Error::missing_attribute("vertex", "x"))?;
    let y = y_opt.ok_or_else(|| Error::missing_attribute("vertex", "y"))?;
    let z = z_opt.ok_or_else(|| Error::missing_attribute("vertex", "z"))?;

    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return Err(Error::InvalidXml(format!(
            "Vertex coordinates must be finite (got {}, {}, {})",
            x, y, z
        )));
    }

    Ok(Vertex::new(x, y, z))
}

/// Parse triangle element attributes
///
/// Property attributes (`pid`, `p1`, ...) are accepted and ignored.
pub fn parse_triangle(e: &BytesStart) -> Result<Triangle> {
    let mut v1_opt: Option<usize> = None;
    let mut v2_opt: Option<usize> = None;
    let mut v3_opt: Option<usize> = None;

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = attr.key.as_ref();
        if matches!(key, b"v1" | b"v2" | b"v3") {
            let value = std::str::from_utf8(&attr.value)
                .map_err(|e| Error::InvalidXml(e.to_string()))?
                .parse::<usize>()?;
            match key {
                b"v1" => v1_opt = Some(value),
                b"v2" => v2_opt = Some(value),
                _ => v3_opt = Some(value),
            }
        }
    }

    let v1 = v1_opt.ok_or_else(|| Error::missing_attribute("triangle", "v1"))?;
    let v2 = v2_opt.ok_or_else(|| Error::missing_attribute("triangle", "v2"))?;
    let v3 = v3_opt.ok_or_else(|| Error::missing_attribute("triangle", "v3"))?;

    Ok(Triangle::new(v1, v2, v3))
}

/// Parse build item element attributes
pub fn parse_build_item(e: &BytesStart) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("item", "objectid"))?
        .parse::<usize>()?;

    let mut item = BuildItem::new(objectid);
    if let Some(transform_str) = attrs.get("transform") {
        item.transform = Some(parse_transform(transform_str, "item")?);
    }

    Ok(item)
}

/// Parse component element attributes
pub(super) fn parse_component(e: &BytesStart) -> Result<Component> {
    let attrs = parse_attributes(e)?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("component", "objectid"))?
        .parse::<usize>()?;

    let mut component = Component::new(objectid);
    if let Some(transform_str) = attrs.get("transform") {
        component.transform = Some(parse_transform(transform_str, "component")?);
    }

    Ok(component)
}

/// Parse a 12-value 3MF `transform` attribute
pub(super) fn parse_transform(value: &str, element: &str) -> Result<Transform> {
    let values = value
        .split_whitespace()
        .map(|s| s.parse::<f64>().map_err(Error::from))
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != TRANSFORM_3MF_SIZE {
        return Err(Error::InvalidXml(format!(
            "Element '<{}>' transform must have exactly {} values (got {})",
            element,
            TRANSFORM_3MF_SIZE,
            values.len()
        )));
    }

    if let Some((idx, val)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidXml(format!(
            "Element '<{}>' transform value at index {} must be finite (got {})",
            element, idx, val
        )));
    }

    let mut matrix = [0.0; TRANSFORM_3MF_SIZE];
    matrix.copy_from_slice(&values);
    Ok(Transform::from_3mf(&matrix))
}
