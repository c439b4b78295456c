//! Error types for catalog loading, geometry reading and insertion
//!
//! All errors include error codes for categorization so that log lines and
//! status messages can be matched without parsing free text.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML parsing and structure errors
//! - **E3xxx**: Geometry model errors
//! - **E5xxx**: Catalog errors
//! - **E6xxx**: Document and insertion errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading file
//! - `E1002`: ZIP archive format error
//! - `E1003`: Missing required file in archive
//! - `E2003`: Invalid XML structure
//! - `E3001`: Invalid geometry model
//! - `E5002`: Catalog root directory not found
//! - `E6001`: Definition creation failed
//! - `E6004`: No active document

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalog and insertion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading catalogs, reading geometry or inserting
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading a file
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - File not found
    /// - Insufficient permissions
    /// - Network share unavailable
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted geometry file
    /// - Truncated archive
    ///
    /// **Suggestions**:
    /// - Verify the file is a valid 3MF (ZIP) archive
    /// - Re-export the mesh from the authoring tool
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Missing required file in the 3MF archive
    ///
    /// **Error Code**: E1003
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required XML elements or attributes
    /// - Invalid element nesting
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Invalid 3MF container format
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Missing `[Content_Types].xml` or `_rels/.rels`
    /// - Missing 3D model relationship
    #[error("[E2004] Invalid 3MF format: {0}")]
    InvalidFormat(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Invalid geometry model
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Out-of-bounds vertex indices
    /// - References to missing objects
    /// - Circular component references
    #[error("[E3001] Invalid model: {0}")]
    InvalidModel(String),

    /// Parse error for numeric values
    ///
    /// **Error Code**: E3002
    ///
    /// **Suggestions**:
    /// - Verify numeric values use a dot as decimal separator ("1.5" not "1,5")
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// Product or settings JSON could not be deserialized
    ///
    /// **Error Code**: E5001
    ///
    /// **Common Causes**:
    /// - Malformed JSON
    /// - Wrong value type for a known field (e.g. a string where an array is expected)
    #[error("[E5001] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The catalog root directory does not exist
    ///
    /// **Error Code**: E5002
    ///
    /// **Suggestions**:
    /// - Check the configured base server path
    /// - Verify the network share is mounted
    #[error("[E5002] Catalog root not found: {}", .0.display())]
    CatalogRootNotFound(PathBuf),

    /// A product id could not be found in the loaded catalog
    ///
    /// **Error Code**: E5003
    #[error("[E5003] Product not found: {0}")]
    ProductNotFound(String),

    /// A block definition could not be created from its source file
    ///
    /// **Error Code**: E6001
    ///
    /// **Common Causes**:
    /// - Missing or unreadable geometry file
    /// - Corrupt 3MF container
    /// - File without any geometry
    #[error("[E6001] Failed to create definition '{key}' from {}: {source}", .path.display())]
    DefinitionCreation {
        /// Identity key the definition would have been registered under
        key: String,
        /// Geometry source file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A definition with the same name already exists in the document
    ///
    /// **Error Code**: E6002
    #[error("[E6002] Definition already exists: {0}")]
    DuplicateDefinition(String),

    /// An instance referenced a definition id that the document does not hold
    ///
    /// **Error Code**: E6003
    #[error("[E6003] Unknown definition id: {0}")]
    UnknownDefinition(usize),

    /// Insertion was requested while no document is active
    ///
    /// **Error Code**: E6004
    #[error("[E6004] No active document")]
    NoActiveDocument,

    /// No tool mesh file could be located for a product
    ///
    /// **Error Code**: E6005
    ///
    /// **Suggestions**:
    /// - Check that `{name}_Mesh_{holder}.3mf` exists in the product folder
    /// - Set `previews.mesh3d.fullPath` in the product JSON
    #[error("[E6005] No tool mesh found for product '{0}'")]
    ToolMeshNotFound(String),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error for a missing required attribute
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>' is missing required attribute '{}'",
            element, attribute
        ))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }

    /// Wrap a failure to read or register a definition's geometry
    pub fn definition_creation(key: &str, path: impl Into<PathBuf>, source: Error) -> Self {
        Error::DefinitionCreation {
            key: key.to_string(),
            path: path.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let io_err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "test"));
        assert!(io_err.to_string().contains("[E1001]"));

        let missing_file = Error::MissingFile("test.model".to_string());
        assert!(missing_file.to_string().contains("[E1003]"));

        let invalid_model = Error::InvalidModel("test error".to_string());
        assert!(invalid_model.to_string().contains("[E3001]"));

        let root = Error::CatalogRootNotFound(PathBuf::from("/srv/catalog"));
        assert!(root.to_string().contains("[E5002]"));
        assert!(root.to_string().contains("/srv/catalog"));

        assert!(Error::NoActiveDocument.to_string().contains("[E6004]"));
    }

    #[test]
    fn test_definition_creation_keeps_source() {
        let err = Error::definition_creation(
            "Drill_Tego_Black",
            "/catalog/Drill.3mf",
            Error::MissingFile("3D/3dmodel.model".to_string()),
        );
        let text = err.to_string();
        assert!(text.contains("[E6001]"));
        assert!(text.contains("Drill_Tego_Black"));
        assert!(text.contains("[E1003]"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_attribute_helper() {
        let err = Error::missing_attribute("object", "id");
        assert!(err.to_string().contains("Element '<object>'"));
        assert!(err.to_string().contains("missing required attribute 'id'"));
        assert!(err.to_string().contains("[E2003]"));
    }

    #[test]
    fn test_parse_float_error_conversion() {
        let parse_err: std::num::ParseFloatError = "not_a_number".parse::<f64>().unwrap_err();
        let err = Error::from(parse_err);
        assert!(err
            .to_string()
            .contains("Failed to parse floating-point number"));
        assert!(err.to_string().contains("[E3002]"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = Error::from(json_err);
        assert!(err.to_string().contains("[E5001]"));
    }
}
