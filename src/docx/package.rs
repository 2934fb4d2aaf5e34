//! In-memory OPC package writer.
//!
//! Collects parts with their content types and relationships, then writes
//! `[Content_Types].xml`, the package relationships, every part and each
//! part's `_rels` file into a single ZIP buffer.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::parts::{xml_escape, CT_RELATIONSHIPS, CT_XML};
use super::DocxError;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

#[derive(Debug)]
struct Part {
    content_type: String,
    blob: Vec<u8>,
}

/// Builder for a ZIP-backed OPC package
#[derive(Debug, Default)]
pub struct PackageWriter {
    parts: BTreeMap<String, Part>,
    package_rels: Vec<Relationship>,
    part_rels: BTreeMap<String, Vec<Relationship>>,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. `name` has no leading slash, e.g. `word/document.xml`.
    pub fn add_part(
        &mut self,
        name: &str,
        content_type: &str,
        blob: &[u8],
    ) -> Result<(), DocxError> {
        if name.starts_with('/') || name.is_empty() {
            return Err(DocxError::Xml(format!("Invalid part name: {name}")));
        }
        self.parts.insert(
            name.to_string(),
            Part {
                content_type: content_type.to_string(),
                blob: blob.to_vec(),
            },
        );
        Ok(())
    }

    /// Relationship from the package root to a part
    pub fn add_package_rel(&mut self, rel_type: &str, target: &str) {
        let id = format!("rId{}", self.package_rels.len() + 1);
        self.package_rels.push(Relationship {
            id,
            rel_type: rel_type.to_string(),
            target: target.to_string(),
        });
    }

    /// Relationship from `source` to a target relative to the source's folder
    pub fn add_part_rel(&mut self, source: &str, rel_type: &str, target: &str) {
        let rels = self.part_rels.entry(source.to_string()).or_default();
        let id = format!("rId{}", rels.len() + 1);
        rels.push(Relationship {
            id,
            rel_type: rel_type.to_string(),
            target: target.to_string(),
        });
    }

    /// Number of parts added so far (excluding generated metadata parts)
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Write the package and return the ZIP bytes.
    pub fn finish(self) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // Content types must be the first entry in the archive.
        zip.start_file(CONTENT_TYPES_PART, options)?;
        zip.write_all(self.content_types_xml()?.as_bytes())?;

        zip.start_file(PACKAGE_RELS_PART, options)?;
        zip.write_all(rels_xml(&self.package_rels)?.as_bytes())?;

        for (name, part) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&part.blob)?;

            if let Some(rels) = self.part_rels.get(name) {
                zip.start_file(rels_part_name(name), options)?;
                zip.write_all(rels_xml(rels)?.as_bytes())?;
            }
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types_xml(&self) -> Result<String, DocxError> {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        write!(
            xml,
            r#"<Default Extension="rels" ContentType="{}"/>"#,
            CT_RELATIONSHIPS
        )?;
        write!(xml, r#"<Default Extension="xml" ContentType="{}"/>"#, CT_XML)?;
        for (name, part) in &self.parts {
            write!(
                xml,
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                xml_escape(name),
                xml_escape(&part.content_type)
            )?;
        }
        xml.push_str("</Types>");
        Ok(xml)
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn rels_xml(rels: &[Relationship]) -> Result<String, DocxError> {
    let mut xml = String::with_capacity(512);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            xml_escape(&rel.rel_type),
            xml_escape(&rel.target)
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}
