//! XML parts of the generated WordprocessingML package.

use std::borrow::Cow;
use std::fmt::Write as FmtWrite;

use chrono::{DateTime, Utc};

use super::runs::split_runs;
use super::DocxError;
use crate::models::{Block, FormattedDocument};

pub const CT_XML: &str = "application/xml";
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
pub const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// numId of the bullet list definition in [`NUMBERING_XML`]
const BULLET_NUM_ID: u32 = 1;

/// Characters allowed by the XML 1.0 `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape markup characters and drop characters XML 1.0 cannot carry.
pub fn xml_escape(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        return quick_xml::escape::escape(s);
    }
    let cleaned: String = s.chars().filter(|&c| is_xml_char(c)).collect();
    Cow::Owned(quick_xml::escape::escape(&cleaned).into_owned())
}

/// Paragraph style id for a block.
///
/// Numbered items carry their own "1." prefix, so `ListNumber` only indents
/// and never adds automatic numbering.
fn style_for(block: &Block) -> Option<&'static str> {
    match block {
        Block::Heading { level: 0, .. } => Some("Title"),
        Block::Heading { level: 1, .. } => Some("Heading1"),
        Block::Heading { .. } => Some("Heading2"),
        Block::BulletItem(_) => Some("ListBullet"),
        Block::NumberedItem(_) => Some("ListNumber"),
        Block::Paragraph(_) => None,
    }
}

fn write_paragraph(xml: &mut String, block: &Block) -> Result<(), DocxError> {
    xml.push_str("<w:p>");

    if let Some(style) = style_for(block) {
        xml.push_str("<w:pPr>");
        write!(xml, r#"<w:pStyle w:val="{}"/>"#, style)?;
        if matches!(block, Block::BulletItem(_)) {
            write!(
                xml,
                r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="{}"/></w:numPr>"#,
                BULLET_NUM_ID
            )?;
        }
        xml.push_str("</w:pPr>");
    }

    for run in split_runs(block.text()) {
        xml.push_str("<w:r>");
        if run.bold {
            xml.push_str("<w:rPr><w:b/><w:bCs/></w:rPr>");
        }
        write!(
            xml,
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            xml_escape(&run.text)
        )?;
        xml.push_str("</w:r>");
    }

    xml.push_str("</w:p>");
    Ok(())
}

/// `word/document.xml` with one paragraph per block
pub fn document_xml(doc: &FormattedDocument) -> Result<String, DocxError> {
    let mut xml = String::with_capacity(256 + doc.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(xml, r#"<w:document xmlns:w="{}">"#, NS_W)?;
    xml.push_str("<w:body>");

    for block in doc.blocks() {
        write_paragraph(&mut xml, block)?;
    }

    // A4 with 1" margins
    xml.push_str(
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
    );
    xml.push_str("</w:body></w:document>");
    Ok(xml)
}

pub fn core_xml(title: &str, created: DateTime<Utc>) -> String {
    let stamp = created.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title>",
            "<dc:creator>{creator}</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        title = xml_escape(title),
        creator = env!("CARGO_PKG_NAME"),
        stamp = stamp,
    )
}

pub const APP_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
    "<Application>",
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    "</Application>",
    "</Properties>"
);

pub const NUMBERING_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:abstractNum w:abstractNumId="0">"#,
    r#"<w:multiLevelType w:val="singleLevel"/>"#,
    r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/>"#,
    r#"<w:lvlText w:val="•"/><w:lvlJc w:val="left"/>"#,
    r#"<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>"#,
    "</w:abstractNum>",
    r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#,
    "</w:numbering>"
);

pub const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    "<w:docDefaults>",
    r#"<w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Microsoft JhengHei" w:cs="Calibri"/>"#,
    r#"<w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="en-US" w:eastAsia="zh-TW"/></w:rPr></w:rPrDefault>"#,
    r#"<w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#,
    "</w:docDefaults>",
    // Normal
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal">"#,
    r#"<w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    // Title
    r#"<w:style w:type="paragraph" w:styleId="Title">"#,
    r#"<w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="10"/><w:qFormat/>"#,
    r#"<w:pPr><w:spacing w:after="0"/><w:contextualSpacing/></w:pPr>"#,
    r#"<w:rPr><w:rFonts w:ascii="Calibri Light" w:hAnsi="Calibri Light"/><w:kern w:val="28"/><w:sz w:val="56"/><w:szCs w:val="56"/></w:rPr>"#,
    "</w:style>",
    // Heading 1
    r#"<w:style w:type="paragraph" w:styleId="Heading1">"#,
    r#"<w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/>"#,
    r#"<w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="240" w:after="0"/><w:outlineLvl w:val="0"/></w:pPr>"#,
    r#"<w:rPr><w:rFonts w:ascii="Calibri Light" w:hAnsi="Calibri Light"/><w:color w:val="2F5496"/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr>"#,
    "</w:style>",
    // Heading 2
    r#"<w:style w:type="paragraph" w:styleId="Heading2">"#,
    r#"<w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/>"#,
    r#"<w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="40" w:after="0"/><w:outlineLvl w:val="1"/></w:pPr>"#,
    r#"<w:rPr><w:rFonts w:ascii="Calibri Light" w:hAnsi="Calibri Light"/><w:color w:val="2F5496"/><w:sz w:val="26"/><w:szCs w:val="26"/></w:rPr>"#,
    "</w:style>",
    // List Bullet
    r#"<w:style w:type="paragraph" w:styleId="ListBullet">"#,
    r#"<w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:uiPriority w:val="99"/>"#,
    r#"<w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:contextualSpacing/></w:pPr>"#,
    "</w:style>",
    // List Number
    r#"<w:style w:type="paragraph" w:styleId="ListNumber">"#,
    r#"<w:name w:val="List Number"/><w:basedOn w:val="Normal"/><w:uiPriority w:val="99"/>"#,
    r#"<w:pPr><w:ind w:left="360"/><w:contextualSpacing/></w:pPr>"#,
    "</w:style>",
    "</w:styles>"
);
