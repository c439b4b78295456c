//! Package reading and validation

use super::{CONTENT_TYPES_PATH, MODEL_REL_TYPE, Package, RELS_PATH};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Read, Seek};
use zip::ZipArchive;

impl<R: Read + Seek> Package<R> {
    /// Open a 3MF package from a reader
    ///
    /// Fails unless the container has content types, package relationships
    /// and a model relationship pointing at an existing part.
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut package = Self { archive };

        if !package.has_file(CONTENT_TYPES_PATH) {
            return Err(Error::InvalidFormat(format!(
                "Missing required file: {}",
                CONTENT_TYPES_PATH
            )));
        }
        if !package.has_file(RELS_PATH) {
            return Err(Error::InvalidFormat(format!(
                "Missing required file: {}",
                RELS_PATH
            )));
        }

        let model_path = package.discover_model_path()?;
        if !package.has_file(&model_path) {
            return Err(Error::InvalidFormat(format!(
                "Model relationship points to non-existent file: {}",
                model_path
            )));
        }

        Ok(package)
    }

    /// Get the main 3D model file content
    pub fn get_model(&mut self) -> Result<String> {
        let model_path = self.discover_model_path()?;
        self.get_file(&model_path)
    }

    /// Discover the model file path from the relationships file
    fn discover_model_path(&mut self) -> Result<String> {
        let rels_content = self.get_file(RELS_PATH)?;
        let mut reader = Reader::from_str(&rels_content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref())
                        .map_err(|e| Error::InvalidXml(e.to_string()))?;

                    if name_str.ends_with("Relationship") {
                        let mut target = None;
                        let mut rel_type = None;

                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = std::str::from_utf8(&attr.value)
                                .map_err(|e| Error::InvalidXml(e.to_string()))?;
                            match attr.key.as_ref() {
                                b"Target" => target = Some(value.to_string()),
                                b"Type" => rel_type = Some(value.to_string()),
                                _ => {}
                            }
                        }

                        if let (Some(t), Some(rt)) = (target, rel_type)
                            && rt == MODEL_REL_TYPE
                        {
                            return Ok(t.strip_prefix('/').unwrap_or(&t).to_string());
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::InvalidXml(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Err(Error::MissingFile(
            "3D model relationship not found".to_string(),
        ))
    }

    /// Get a file by name from the archive
    pub fn get_file(&mut self, name: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Check if a file exists in the archive
    pub fn has_file(&mut self, name: &str) -> bool {
        self.archive.by_name(name).is_ok()
    }
}
