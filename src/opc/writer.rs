//! Package writing for 3MF files

use super::{CONTENT_TYPES_PATH, MODEL_PATH, RELS_PATH};
use crate::error::{Error, Result};
use std::io::{Seek, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

/// Create a 3MF package (ZIP archive) from model XML
///
/// Writes `[Content_Types].xml`, `_rels/.rels` and `3D/3dmodel.model`, and
/// returns the writer after finishing the archive.
pub fn create_package<W: Write + Seek>(writer: W, model_xml: &str) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    for (path, content) in [
        (CONTENT_TYPES_PATH, CONTENT_TYPES_XML),
        (RELS_PATH, RELS_XML),
        (MODEL_PATH, model_xml),
    ] {
        zip.start_file(path, options)
            .map_err(|e| Error::xml_write(format!("Failed to create {}: {}", path, e)))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| Error::xml_write(format!("Failed to write {}: {}", path, e)))?;
    }

    zip.finish()
        .map_err(|e| Error::xml_write(format!("Failed to finalize ZIP archive: {}", e)))
}
