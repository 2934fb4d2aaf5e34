//! Structured SOP document model.

use serde::{Deserialize, Serialize};

/// Title emitted at the top of every formatted document
pub const DEFAULT_TITLE: &str = "Standard Operating Procedure";

/// Classification of a single line of generated Markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only, produces no block
    Blank,
    /// `## ` prefixed line
    Heading1(String),
    /// `### ` prefixed line
    Heading2(String),
    /// `* ` or `- ` prefixed line
    Bullet(String),
    /// Line starting with a digit followed by `.`, text keeps the prefix
    Numbered(String),
    /// Anything else
    Paragraph(String),
}

impl LineKind {
    /// Convert into a block, `None` for blank lines
    pub fn into_block(self) -> Option<Block> {
        match self {
            LineKind::Blank => None,
            LineKind::Heading1(text) => Some(Block::Heading { level: 1, text }),
            LineKind::Heading2(text) => Some(Block::Heading { level: 2, text }),
            LineKind::Bullet(text) => Some(Block::BulletItem(text)),
            LineKind::Numbered(text) => Some(Block::NumberedItem(text)),
            LineKind::Paragraph(text) => Some(Block::Paragraph(text)),
        }
    }
}

/// One structural unit of a formatted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// Heading; level 0 is the document title
    Heading { level: u8, text: String },
    BulletItem(String),
    NumberedItem(String),
    Paragraph(String),
}

impl Block {
    /// Text carried by the block
    pub fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } => text,
            Block::BulletItem(text) | Block::NumberedItem(text) | Block::Paragraph(text) => text,
        }
    }

    /// Whether this block is the level-0 title
    pub fn is_title(&self) -> bool {
        matches!(self, Block::Heading { level: 0, .. })
    }
}

/// Ordered block sequence built from one generated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedDocument {
    blocks: Vec<Block>,
}

impl FormattedDocument {
    /// Start a document with its title heading
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            blocks: vec![Block::Heading {
                level: 0,
                text: title.into(),
            }],
        }
    }

    pub(crate) fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// All blocks, title first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Title text
    pub fn title(&self) -> &str {
        self.blocks.first().map(Block::text).unwrap_or(DEFAULT_TITLE)
    }

    /// Number of blocks including the title
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the document has no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for FormattedDocument {
    fn default() -> Self {
        Self::with_title(DEFAULT_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_has_no_block() {
        assert_eq!(LineKind::Blank.into_block(), None);
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(
            LineKind::Heading2("Steps".into()).into_block(),
            Some(Block::Heading {
                level: 2,
                text: "Steps".into()
            })
        );
    }

    #[test]
    fn test_default_document_has_title() {
        let doc = FormattedDocument::default();
        assert_eq!(doc.len(), 1);
        assert!(!doc.is_empty());
        assert!(doc.blocks()[0].is_title());
        assert_eq!(doc.title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_block_serializes_with_kind_tag() {
        let json = serde_json::to_value(Block::BulletItem("collect data".into())).unwrap();
        assert_eq!(json["kind"], "bullet_item");
    }
}
