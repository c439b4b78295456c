//! Data structures representing 3MF geometry files

mod core;
mod flatten;

pub use self::core::{
    Build, BuildItem, CORE_NAMESPACE, Component, Mesh, MetadataEntry, Model, Object, ObjectType,
    Resources, Triangle, Vertex,
};
pub use flatten::GeometryObject;

use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

impl Model {
    /// Parse a 3MF package from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        crate::parser::parse_3mf(reader)
    }

    /// Parse a 3MF package from a file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Write this model as a complete 3MF package
    pub fn to_writer<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut xml = Vec::new();
        crate::writer::write_model_xml(self, &mut xml)?;
        let xml = String::from_utf8(xml)
            .map_err(|e| crate::Error::xml_write(format!("Model XML is not UTF-8: {}", e)))?;
        crate::opc::create_package(writer, &xml)
    }

    /// Write this model as a 3MF package file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = self.to_writer(std::io::BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }
}
