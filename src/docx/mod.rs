//! WordprocessingML (.docx) export for formatted SOP documents.
//!
//! A `.docx` file is an OPC package: a ZIP archive holding XML parts and the
//! relationships between them. [`render_docx`] builds the whole package in
//! memory and never touches the filesystem; callers decide where the bytes go.
//!
//! ```rust
//! use sop_master::docx::{render_docx, DOCX_FILENAME};
//! use sop_master::formatter::format_document;
//!
//! let doc = format_document("## Objective\n- **Back up** the database\n");
//! let bytes = render_docx(&doc).unwrap();
//! assert!(bytes.starts_with(b"PK"));
//! assert_eq!(DOCX_FILENAME, "SOP_Output.docx");
//! ```

mod package;
mod parts;
mod runs;

pub use package::PackageWriter;
pub use runs::{split_runs, TextRun};

use crate::models::FormattedDocument;
use serde::Serialize;

/// File name offered for download
pub const DOCX_FILENAME: &str = "SOP_Output.docx";

/// MIME type of the exported document
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Errors that can occur while building a package
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    /// ZIP container error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error while writing into the in-memory buffer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML generation error
    #[error("XML error: {0}")]
    Xml(String),
}

impl From<std::fmt::Error> for DocxError {
    fn from(err: std::fmt::Error) -> Self {
        DocxError::Xml(err.to_string())
    }
}

/// A rendered document ready to hand to a client
#[derive(Debug, Clone, Serialize)]
pub struct DocxArtifact {
    pub filename: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl DocxArtifact {
    /// Wrap rendered bytes with the standard filename and MIME type
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            filename: DOCX_FILENAME.to_string(),
            mime_type: DOCX_MIME_TYPE.to_string(),
            bytes,
        }
    }

    /// Size of the package in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Serialize a formatted document into `.docx` bytes.
pub fn render_docx(doc: &FormattedDocument) -> Result<Vec<u8>, DocxError> {
    let mut writer = PackageWriter::new();

    writer.add_part(
        "word/document.xml",
        parts::CT_DOCUMENT,
        parts::document_xml(doc)?.as_bytes(),
    )?;
    writer.add_part("word/styles.xml", parts::CT_STYLES, parts::STYLES_XML.as_bytes())?;
    writer.add_part(
        "word/numbering.xml",
        parts::CT_NUMBERING,
        parts::NUMBERING_XML.as_bytes(),
    )?;
    writer.add_part(
        "docProps/core.xml",
        parts::CT_CORE,
        parts::core_xml(doc.title(), chrono::Utc::now()).as_bytes(),
    )?;
    writer.add_part("docProps/app.xml", parts::CT_APP, parts::APP_XML.as_bytes())?;

    writer.add_package_rel(parts::REL_OFFICE_DOCUMENT, "word/document.xml");
    writer.add_package_rel(parts::REL_CORE_PROPERTIES, "docProps/core.xml");
    writer.add_package_rel(parts::REL_EXTENDED_PROPERTIES, "docProps/app.xml");
    writer.add_part_rel("word/document.xml", parts::REL_STYLES, "styles.xml");
    writer.add_part_rel("word/document.xml", parts::REL_NUMBERING, "numbering.xml");

    let bytes = writer.finish()?;
    tracing::debug!(bytes = bytes.len(), blocks = doc.len(), "rendered docx");
    Ok(bytes)
}
