//! Inline `**bold**` handling for paragraph text.

use std::sync::OnceLock;

use regex::Regex;

/// A span of text with uniform formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"))
}

/// Split text into plain and bold runs. Unpaired `**` stays literal.
pub fn split_runs(text: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in bold_pattern().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            runs.push(TextRun {
                text: text[last..whole.start()].to_string(),
                bold: false,
            });
        }
        runs.push(TextRun {
            text: inner.as_str().to_string(),
            bold: true,
        });
        last = whole.end();
    }

    if last < text.len() || runs.is_empty() {
        runs.push(TextRun {
            text: text[last..].to_string(),
            bold: false,
        });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> TextRun {
        TextRun {
            text: text.into(),
            bold: false,
        }
    }

    fn bold(text: &str) -> TextRun {
        TextRun {
            text: text.into(),
            bold: true,
        }
    }

    #[test]
    fn test_no_markup() {
        assert_eq!(split_runs("just text"), vec![plain("just text")]);
    }

    #[test]
    fn test_empty_text_yields_one_run() {
        assert_eq!(split_runs(""), vec![plain("")]);
    }

    #[test]
    fn test_mixed_runs() {
        assert_eq!(
            split_runs("**目標 (Objective)**：完成報告"),
            vec![bold("目標 (Objective)"), plain("：完成報告")]
        );
        assert_eq!(
            split_runs("Press **Save** then **Exit**."),
            vec![plain("Press "), bold("Save"), plain(" then "), bold("Exit"), plain(".")]
        );
    }

    #[test]
    fn test_unpaired_marker_is_literal() {
        assert_eq!(split_runs("a ** b"), vec![plain("a ** b")]);
    }
}
