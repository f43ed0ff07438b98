//! Exporter options and configuration.

use crate::vision::VisionOptions;

/// Options for the HTML exporter.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Inline image payloads as data URIs
    pub embed_images: bool,

    /// Show page/language/level badges above elements
    pub include_metadata: bool,

    /// HTML-escape element text before interpolation
    pub escape_text: bool,
}

impl HtmlOptions {
    /// Create new HTML options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain variant: image placeholders, no badges.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Image-embedding variant with metadata badges.
    pub fn with_images() -> Self {
        Self {
            embed_images: true,
            include_metadata: true,
            ..Self::default()
        }
    }

    /// Enable or disable image embedding.
    pub fn with_embed_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    /// Enable or disable metadata badges.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Enable or disable text escaping.
    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape_text = escape;
        self
    }
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            embed_images: false,
            include_metadata: false,
            escape_text: true,
        }
    }
}

/// Options for the Markdown exporter.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Inline image payloads as data URIs
    pub embed_images: bool,

    /// Emit metadata badges as blockquotes
    pub include_metadata: bool,

    /// Escape `<`, `>` and `&` in element text
    pub escape_text: bool,

    /// Maximum characters of element text used as image alt text
    pub alt_text_chars: usize,
}

impl MarkdownOptions {
    /// Create new Markdown options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain variant: bold image placeholders, no badges.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Image-embedding variant with metadata badges.
    pub fn with_images() -> Self {
        Self {
            embed_images: true,
            include_metadata: true,
            ..Self::default()
        }
    }

    /// Enable or disable image embedding.
    pub fn with_embed_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    /// Enable or disable metadata badges.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Enable or disable text escaping.
    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape_text = escape;
        self
    }
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            embed_images: false,
            include_metadata: false,
            escape_text: true,
            alt_text_chars: 100,
        }
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Options for the full-metadata JSON exporter.
#[derive(Debug, Clone)]
pub struct JsonOptions {
    pub format: JsonFormat,

    /// Base64 payloads longer than this are cut to a preview
    pub base64_preview_chars: usize,
}

impl JsonOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the base64 preview length.
    pub fn with_base64_preview(mut self, chars: usize) -> Self {
        self.base64_preview_chars = chars;
        self
    }
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            format: JsonFormat::Pretty,
            base64_preview_chars: 100,
        }
    }
}

/// How RAG documents are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RagGrouping {
    /// One document per non-empty element
    #[default]
    Element,
    /// One document per page
    Page,
}

impl RagGrouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            RagGrouping::Element => "element",
            RagGrouping::Page => "page",
        }
    }
}

impl std::str::FromStr for RagGrouping {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "element" => Ok(RagGrouping::Element),
            "page" => Ok(RagGrouping::Page),
            other => Err(crate::Error::Other(format!("Unknown RAG grouping: {}", other))),
        }
    }
}

/// Options for the RAG exporter.
#[derive(Debug, Clone)]
pub struct RagOptions {
    /// Source document name recorded in every document
    pub source: String,

    /// Document grouping
    pub grouping: RagGrouping,

    /// Ask the vision service to describe image elements
    pub describe_images: bool,

    /// Vision service configuration
    pub vision: VisionOptions,

    /// Number of documents in the pretty-printed preview
    pub preview_limit: usize,
}

impl RagOptions {
    /// Create RAG options for the given source name.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Set the grouping mode.
    pub fn with_grouping(mut self, grouping: RagGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Enable or disable image descriptions.
    pub fn with_image_descriptions(mut self, describe: bool) -> Self {
        self.describe_images = describe;
        self
    }

    /// Set vision service options.
    pub fn with_vision(mut self, vision: VisionOptions) -> Self {
        self.vision = vision;
        self
    }
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            source: "document".to_string(),
            grouping: RagGrouping::Element,
            describe_images: false,
            vision: VisionOptions::default(),
            preview_limit: 5,
        }
    }
}
