//! Line classifier turning generated Markdown into a [`FormattedDocument`].
//!
//! The converter is a single forward pass. Each line is matched against an
//! ordered rule table and the first matching rule decides the block kind:
//!
//! | Order | Predicate                          | Result                         |
//! |-------|------------------------------------|--------------------------------|
//! | 1     | empty after trimming               | skipped                        |
//! | 2     | starts with `## `                  | level-1 heading, prefix removed|
//! | 3     | starts with `### `                 | level-2 heading, prefix removed|
//! | 4     | starts with `* ` or `- `           | bullet, 2 chars removed        |
//! | 5     | ASCII digit then `.`               | numbered item, full line kept  |
//! | 6     | anything else                      | paragraph                      |
//!
//! ```rust
//! use sop_master::formatter::format_document;
//! use sop_master::models::Block;
//!
//! let doc = format_document("## Goal\n- collect data\n");
//! assert_eq!(doc.blocks()[1], Block::Heading { level: 1, text: "Goal".into() });
//! assert_eq!(doc.blocks()[2], Block::BulletItem("collect data".into()));
//! ```

use crate::models::{FormattedDocument, LineKind, DEFAULT_TITLE};

type Predicate = fn(&str) -> bool;
type Constructor = fn(&str) -> LineKind;

/// Ordered classification rules; lines reaching the end become paragraphs.
const RULES: &[(Predicate, Constructor)] = &[
    (is_blank, blank),
    (is_heading1, heading1),
    (is_heading2, heading2),
    (is_bullet, bullet),
    (is_numbered, numbered),
];

fn is_blank(line: &str) -> bool {
    line.is_empty()
}

fn blank(_: &str) -> LineKind {
    LineKind::Blank
}

fn is_heading1(line: &str) -> bool {
    line.starts_with("## ")
}

fn heading1(line: &str) -> LineKind {
    LineKind::Heading1(line["## ".len()..].to_string())
}

fn is_heading2(line: &str) -> bool {
    line.starts_with("### ")
}

fn heading2(line: &str) -> LineKind {
    LineKind::Heading2(line["### ".len()..].to_string())
}

fn is_bullet(line: &str) -> bool {
    line.starts_with("* ") || line.starts_with("- ")
}

fn bullet(line: &str) -> LineKind {
    LineKind::Bullet(line[2..].to_string())
}

/// Digit followed by a period. Works on chars so one-character lines are safe.
fn is_numbered(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(first), Some('.')) if first.is_ascii_digit()
    )
}

fn numbered(line: &str) -> LineKind {
    LineKind::Numbered(line.to_string())
}

/// Classify one line of generated text.
///
/// Surrounding whitespace is trimmed before matching, so indented list
/// markers are still recognised and paragraphs never carry stray spaces.
pub fn classify_line(line: &str) -> LineKind {
    let line = line.trim();
    RULES
        .iter()
        .find(|(matches, _)| matches(line))
        .map(|(_, build)| build(line))
        .unwrap_or_else(|| LineKind::Paragraph(line.to_string()))
}

/// Format generated Markdown under the default title.
pub fn format_document(text: &str) -> FormattedDocument {
    format_document_with_title(text, DEFAULT_TITLE)
}

/// Format generated Markdown under a custom title.
pub fn format_document_with_title(text: &str, title: &str) -> FormattedDocument {
    let mut doc = FormattedDocument::with_title(title);
    for line in text.lines() {
        if let Some(block) = classify_line(line).into_block() {
            doc.push(block);
        }
    }
    tracing::debug!(blocks = doc.len(), "formatted document");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Block;

    #[test]
    fn test_reference_example() {
        let doc = format_document("## 目標\n完成報告\n- 收集資料\n1. 開會\n");
        assert_eq!(
            doc.blocks(),
            &[
                Block::Heading {
                    level: 0,
                    text: DEFAULT_TITLE.into()
                },
                Block::Heading {
                    level: 1,
                    text: "目標".into()
                },
                Block::Paragraph("完成報告".into()),
                Block::BulletItem("收集資料".into()),
                Block::NumberedItem("1. 開會".into()),
            ]
        );
    }

    #[test]
    fn test_empty_input_only_title() {
        let doc = format_document("");
        assert_eq!(doc.len(), 1);
        assert!(doc.blocks()[0].is_title());
    }

    #[test]
    fn test_whitespace_lines_skipped() {
        let doc = format_document("first\n   \n\t\n\nsecond");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_level_two_heading() {
        assert_eq!(
            classify_line("### Procedure"),
            LineKind::Heading2("Procedure".into())
        );
    }

    #[test]
    fn test_bare_hashes_are_paragraphs() {
        assert_eq!(classify_line("##"), LineKind::Paragraph("##".into()));
        assert_eq!(classify_line("#### deep"), LineKind::Paragraph("#### deep".into()));
    }

    #[test]
    fn test_both_bullet_markers() {
        assert_eq!(classify_line("* a"), LineKind::Bullet("a".into()));
        assert_eq!(classify_line("- b"), LineKind::Bullet("b".into()));
        assert_eq!(classify_line("-no space"), LineKind::Paragraph("-no space".into()));
    }

    #[test]
    fn test_bullet_keeps_inner_markup() {
        assert_eq!(
            classify_line("- **Check** the valve"),
            LineKind::Bullet("**Check** the valve".into())
        );
    }

    #[test]
    fn test_numbered_keeps_prefix() {
        assert_eq!(
            classify_line("3. Close the ticket"),
            LineKind::Numbered("3. Close the ticket".into())
        );
        // Only a single digit before the period counts.
        assert_eq!(classify_line("12. twelve"), LineKind::Paragraph("12. twelve".into()));
    }

    #[test]
    fn test_short_lines_do_not_panic() {
        assert_eq!(classify_line("7"), LineKind::Paragraph("7".into()));
        assert_eq!(classify_line("."), LineKind::Paragraph(".".into()));
        assert_eq!(classify_line("7."), LineKind::Numbered("7.".into()));
        assert_eq!(classify_line("中"), LineKind::Paragraph("中".into()));
    }

    #[test]
    fn test_full_width_digit_is_not_numbered() {
        assert_eq!(classify_line("１. one"), LineKind::Paragraph("１. one".into()));
    }

    #[test]
    fn test_indented_lines_are_trimmed() {
        assert_eq!(classify_line("   - nested"), LineKind::Bullet("nested".into()));
        assert_eq!(classify_line("  plain  "), LineKind::Paragraph("plain".into()));
    }

    #[test]
    fn test_crlf_input() {
        let doc = format_document("## A\r\n- b\r\n");
        assert_eq!(
            doc.blocks()[1],
            Block::Heading {
                level: 1,
                text: "A".into()
            }
        );
        assert_eq!(doc.blocks()[2], Block::BulletItem("b".into()));
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let text = "## Objective\nShip it\n### Steps\n1. plan\n* do\n";
        assert_eq!(format_document(text), format_document(text));
    }

    #[test]
    fn test_custom_title() {
        let doc = format_document_with_title("body", "標準作業程序 (SOP)");
        assert_eq!(doc.title(), "標準作業程序 (SOP)");
    }

    #[test]
    fn test_block_count_matches_non_blank_lines() {
        let text = "a\n\n- b\n   \n## c\n1. d\n";
        let non_blank = text.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(format_document(text).len(), non_blank + 1);
    }
}
