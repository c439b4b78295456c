//! OPC (Open Packaging Conventions) handling for 3MF geometry files
//!
//! 3MF files are ZIP archives following the OPC standard. Only the parts
//! needed to locate and read the main model are handled here.

mod reader;
mod writer;

pub use writer::create_package;

use std::io::Read;
use zip::ZipArchive;

/// Main 3D model file path within the 3MF archive
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationships file path
pub const RELS_PATH: &str = "_rels/.rels";

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// Content type of relationship parts
pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Content type of 3D model parts
pub const MODEL_CONTENT_TYPE: &str = "application/vnd.ms-package.3dmanufacturing-3dmodel+xml";

/// An opened OPC package (3MF file)
pub struct Package<R: Read> {
    archive: ZipArchive<R>,
}
