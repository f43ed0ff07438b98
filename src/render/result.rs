//! Multi-format conversion results and export statistics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Element, ElementType};
use crate::outcome::Outcome;

use super::{
    to_csv, to_dicts, to_html, to_json, to_json_full_metadata, to_markdown, to_text, HtmlOptions,
    JsonFormat, JsonOptions, MarkdownOptions,
};

/// Every export format of one element sequence.
///
/// Each field is produced independently; a failed format carries its own
/// error and leaves the others intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatBundle {
    pub text: Outcome<String>,
    pub html: Outcome<String>,
    pub markdown: Outcome<String>,
    pub json: Outcome<String>,
    pub json_full_metadata: Outcome<String>,
    pub dicts: Outcome<Vec<Value>>,
    pub csv: Outcome<String>,
    pub stats: ExportStats,
}

impl FormatBundle {
    /// Names of the formats that failed.
    pub fn failed_formats(&self) -> Vec<&'static str> {
        let checks = [
            ("text", self.text.is_failure()),
            ("html", self.html.is_failure()),
            ("markdown", self.markdown.is_failure()),
            ("json", self.json.is_failure()),
            ("json_full_metadata", self.json_full_metadata.is_failure()),
            ("dicts", self.dicts.is_failure()),
            ("csv", self.csv.is_failure()),
        ];
        checks
            .into_iter()
            .filter(|(_, failed)| *failed)
            .map(|(name, _)| name)
            .collect()
    }
}

/// Convert elements into every format.
///
/// With `embed_images`, HTML and Markdown use the image-embedding variants
/// with metadata badges; otherwise the plain variants.
pub fn convert_all_formats(elements: &[Element], embed_images: bool) -> FormatBundle {
    let (html_options, markdown_options) = if embed_images {
        (HtmlOptions::with_images(), MarkdownOptions::with_images())
    } else {
        (HtmlOptions::plain(), MarkdownOptions::plain())
    };

    FormatBundle {
        text: Outcome::success(to_text(elements)),
        html: Outcome::success(to_html(elements, &html_options)),
        markdown: Outcome::success(to_markdown(elements, &markdown_options)),
        json: to_json(elements, JsonFormat::Pretty).into(),
        json_full_metadata: to_json_full_metadata(elements, &JsonOptions::default()).into(),
        dicts: to_dicts(elements).into(),
        csv: to_csv(elements).into(),
        stats: ExportStats::from_elements(elements),
    }
}

/// Counts gathered over an element sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Number of distinct page numbers seen
    pub page_count: u32,

    /// Number of narrative and other text elements
    pub paragraph_count: u32,

    /// Number of table elements
    pub table_count: u32,

    /// Number of image-like elements
    pub image_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,

    /// Number of titles
    pub heading_count: u32,

    /// Number of page breaks
    pub page_break_count: u32,
}

impl ExportStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather statistics for an element sequence.
    pub fn from_elements(elements: &[Element]) -> Self {
        let mut stats = Self::new();
        let mut pages = std::collections::BTreeSet::new();

        for element in elements {
            if let Some(page) = element.page_number() {
                pages.insert(page);
            }
            match &element.element_type {
                ElementType::Title => stats.heading_count += 1,
                ElementType::ListItem => stats.list_item_count += 1,
                ElementType::PageBreak => stats.page_break_count += 1,
                t if t.is_image_like() => stats.image_count += 1,
                t if t.is_table_like() => stats.table_count += 1,
                _ if !element.is_empty() => stats.paragraph_count += 1,
                _ => {}
            }
            stats.count_text(element.trimmed_text());
        }

        stats.page_count = pages.len() as u32;
        stats
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Element> {
        vec![
            Element::title("Report").with_depth(0).with_page(1),
            Element::narrative("Hello, world! This is a test.").with_page(1),
            Element::list_item("Point"),
            Element::table("a b", Some("<table><tr><td>a</td><td>b</td></tr></table>")).with_page(2),
            Element::image("Logo", "aGk=", "image/png"),
            Element::page_break(),
        ]
    }

    #[test]
    fn test_stats_from_elements() {
        let stats = ExportStats::from_elements(&sample());
        assert_eq!(stats.page_count, 2);
        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.paragraph_count, 1);
        assert_eq!(stats.list_item_count, 1);
        assert_eq!(stats.table_count, 1);
        assert_eq!(stats.image_count, 1);
        assert_eq!(stats.page_break_count, 1);
        // Report, Hello, world! This is a test., Point, a b, Logo
        assert_eq!(stats.word_count, 11);
    }

    #[test]
    fn test_convert_all_formats() {
        let bundle = convert_all_formats(&sample(), false);
        assert!(bundle.failed_formats().is_empty());

        let markdown = bundle.markdown.payload().unwrap();
        assert!(markdown.starts_with("## Report"));
        assert!(!markdown.contains("data:image/png"));

        let dicts = bundle.dicts.payload().unwrap();
        assert_eq!(dicts.len(), 6);
        assert_eq!(bundle.stats.heading_count, 1);
    }

    #[test]
    fn test_convert_all_formats_with_images() {
        let bundle = convert_all_formats(&sample(), true);
        assert!(bundle.html.payload().unwrap().contains("data:image/png;base64,aGk="));
        assert!(bundle
            .markdown
            .payload()
            .unwrap()
            .contains("![Logo](data:image/png;base64,aGk=)"));
    }
}
