//! Element types produced by the partitioning step.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ElementMetadata, ImageInfo};

/// Category of a document element.
///
/// Unknown category names coming from the partitioning library are kept
/// verbatim in [`ElementType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Title,
    NarrativeText,
    ListItem,
    Header,
    Footer,
    PageHeader,
    PageFooter,
    Table,
    TableChunk,
    Image,
    Figure,
    FigureCaption,
    Picture,
    Caption,
    PageBreak,
    Text,
    UncategorizedText,
    Address,
    EmailAddress,
    Formula,
    Footnote,
    CompositeElement,
    Other(String),
}

impl ElementType {
    /// Type tag as emitted by the partitioning library.
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Title => "Title",
            ElementType::NarrativeText => "NarrativeText",
            ElementType::ListItem => "ListItem",
            ElementType::Header => "Header",
            ElementType::Footer => "Footer",
            ElementType::PageHeader => "PageHeader",
            ElementType::PageFooter => "PageFooter",
            ElementType::Table => "Table",
            ElementType::TableChunk => "TableChunk",
            ElementType::Image => "Image",
            ElementType::Figure => "Figure",
            ElementType::FigureCaption => "FigureCaption",
            ElementType::Picture => "Picture",
            ElementType::Caption => "Caption",
            ElementType::PageBreak => "PageBreak",
            ElementType::Text => "Text",
            ElementType::UncategorizedText => "UncategorizedText",
            ElementType::Address => "Address",
            ElementType::EmailAddress => "EmailAddress",
            ElementType::Formula => "Formula",
            ElementType::Footnote => "Footnote",
            ElementType::CompositeElement => "CompositeElement",
            ElementType::Other(name) => name,
        }
    }

    /// Image, Figure, Picture and FigureCaption may carry an image payload.
    pub fn is_image_like(&self) -> bool {
        matches!(
            self,
            ElementType::Image
                | ElementType::Figure
                | ElementType::Picture
                | ElementType::FigureCaption
        )
    }

    /// Check if this is a table element.
    pub fn is_table(&self) -> bool {
        matches!(self, ElementType::Table)
    }

    /// Loose table check used by the analyzer ("TableChunk" etc.).
    pub fn is_table_like(&self) -> bool {
        self.is_table() || self.as_str().to_lowercase().contains("table")
    }

    /// Check if this is a page break marker.
    pub fn is_page_break(&self) -> bool {
        matches!(self, ElementType::PageBreak)
    }
}

impl From<String> for ElementType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Title" => ElementType::Title,
            "NarrativeText" => ElementType::NarrativeText,
            "ListItem" => ElementType::ListItem,
            "Header" => ElementType::Header,
            "Footer" => ElementType::Footer,
            "PageHeader" => ElementType::PageHeader,
            "PageFooter" => ElementType::PageFooter,
            "Table" => ElementType::Table,
            "TableChunk" => ElementType::TableChunk,
            "Image" => ElementType::Image,
            "Figure" => ElementType::Figure,
            "FigureCaption" => ElementType::FigureCaption,
            "Picture" => ElementType::Picture,
            "Caption" => ElementType::Caption,
            "PageBreak" => ElementType::PageBreak,
            "Text" => ElementType::Text,
            "UncategorizedText" => ElementType::UncategorizedText,
            "Address" => ElementType::Address,
            "EmailAddress" => ElementType::EmailAddress,
            "Formula" => ElementType::Formula,
            "Footnote" => ElementType::Footnote,
            "CompositeElement" => ElementType::CompositeElement,
            _ => ElementType::Other(name),
        }
    }
}

impl From<&str> for ElementType {
    fn from(name: &str) -> Self {
        ElementType::from(name.to_string())
    }
}

impl From<ElementType> for String {
    fn from(ty: ElementType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of extracted document content.
///
/// The field names match the element JSON written by the partitioning
/// library, so element files can be deserialized directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Category tag
    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Identifier assigned by the partitioner
    #[serde(rename = "element_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Text content (may be empty)
    #[serde(default)]
    pub text: String,

    /// Structured metadata, absent when the partitioner provided none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
}

impl Element {
    /// Create an element without metadata.
    pub fn new(element_type: impl Into<ElementType>, text: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            id: None,
            text: text.into(),
            metadata: None,
        }
    }

    /// Create a title element.
    pub fn title(text: impl Into<String>) -> Self {
        Self::new(ElementType::Title, text)
    }

    /// Create a narrative text element.
    pub fn narrative(text: impl Into<String>) -> Self {
        Self::new(ElementType::NarrativeText, text)
    }

    /// Create a list item element.
    pub fn list_item(text: impl Into<String>) -> Self {
        Self::new(ElementType::ListItem, text)
    }

    /// Create a table element, optionally with its HTML rendering.
    pub fn table(text: impl Into<String>, html: Option<&str>) -> Self {
        let mut element = Self::new(ElementType::Table, text);
        if let Some(html) = html {
            element.metadata_mut().text_as_html = Some(html.to_string());
        }
        element
    }

    /// Create an image element carrying a base64 payload.
    pub fn image(
        caption: impl Into<String>,
        base64: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        let mut element = Self::new(ElementType::Image, caption);
        element.metadata_mut().image = ImageInfo::with_payload(base64, mime_type);
        element
    }

    /// Create a page break marker.
    pub fn page_break() -> Self {
        Self::new(ElementType::PageBreak, "")
    }

    /// Set the element id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Replace the metadata record.
    pub fn with_metadata(mut self, metadata: ElementMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.metadata_mut().page_number = Some(page);
        self
    }

    /// Set the hierarchy depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.metadata_mut().hierarchy.category_depth = Some(depth);
        self
    }

    /// Set the detected languages.
    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.metadata_mut().languages = Some(languages.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Metadata record, created empty on first access.
    pub fn metadata_mut(&mut self) -> &mut ElementMetadata {
        self.metadata.get_or_insert_with(ElementMetadata::default)
    }

    /// Text with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Check if the element has no visible text.
    pub fn is_empty(&self) -> bool {
        self.trimmed_text().is_empty()
    }

    /// Page number, if known.
    pub fn page_number(&self) -> Option<u32> {
        self.metadata.as_ref().and_then(|m| m.page_number)
    }

    /// Hierarchy depth, if known.
    pub fn category_depth(&self) -> Option<u32> {
        self.metadata
            .as_ref()
            .and_then(|m| m.hierarchy.category_depth)
    }

    /// HTML rendering of a table, if present.
    pub fn text_as_html(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.text_as_html.as_deref())
            .filter(|html| !html.is_empty())
    }

    /// Non-empty base64 payload and its MIME type (if recorded).
    pub fn image_payload(&self) -> Option<(&str, Option<&str>)> {
        let image = &self.metadata.as_ref()?.image;
        let data = image.image_base64.as_deref().filter(|b| !b.is_empty())?;
        Some((data, image.image_mime_type.as_deref()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
