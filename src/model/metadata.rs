//! Element metadata, grouped by concern.
//!
//! The partitioning library writes a single flat metadata object. Each group
//! below is flattened back into that shape on (de)serialization, and every
//! field is skipped when absent, so a serialized record contains only the
//! attributes that were actually present.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata attached to an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementMetadata {
    /// Source file information
    #[serde(flatten)]
    pub source: SourceInfo,

    /// 1-indexed page (or slide) number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    /// Spreadsheet sheet name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,

    /// Layout geometry, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,

    /// Detected language codes, in detection order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,

    #[serde(flatten)]
    pub hierarchy: Hierarchy,

    #[serde(flatten)]
    pub links: LinkInfo,

    #[serde(flatten)]
    pub emphasis: Emphasis,

    /// HTML rendering, present for table-like elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_as_html: Option<String>,

    #[serde(flatten)]
    pub image: ImageInfo,

    #[serde(flatten)]
    pub email: EmailInfo,

    /// Layout model confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_class_prob: Option<f64>,

    /// Whether this element continues a split element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_continuation: Option<bool>,
}

impl ElementMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// First detected language.
    pub fn primary_language(&self) -> Option<&str> {
        self.languages
            .as_ref()
            .and_then(|langs| langs.first())
            .map(String::as_str)
    }

    /// Serialize into a flat JSON object containing only present keys.
    pub fn to_map(&self) -> crate::Result<serde_json::Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(crate::Error::Render(format!(
                "metadata serialized to non-object: {}",
                other
            ))),
        }
    }
}

/// Where the element came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_directory: Option<String>,

    /// MIME type of the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Position in the document hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Id of the enclosing element (lookup only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Nesting level, 0 = top
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_depth: Option<u32>,
}

impl Hierarchy {
    pub fn is_empty(&self) -> bool {
        self.parent_id.is_none() && self.category_depth.is_none()
    }
}

/// A hyperlink reference.
///
/// Partitioners emit either bare URLs or `{text, url}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Detailed {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_index: Option<i64>,
    },
    Url(String),
}

impl Link {
    /// Target URL.
    pub fn url(&self) -> &str {
        match self {
            Link::Detailed { url, .. } => url,
            Link::Url(url) => url,
        }
    }

    /// Anchor text, if recorded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Link::Detailed { text, .. } => text.as_deref(),
            Link::Url(_) => None,
        }
    }
}

/// Hyperlinks found in the element.
///
/// `link_urls` and `link_texts` are parallel sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_urls: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_texts: Option<Vec<Option<String>>>,
}

impl LinkInfo {
    /// Number of entries in `links`.
    pub fn link_count(&self) -> usize {
        self.links.as_ref().map_or(0, Vec::len)
    }

    /// `(url, text)` pairs from the parallel url/text sequences.
    pub fn url_pairs(&self) -> Vec<(&str, Option<&str>)> {
        let Some(urls) = &self.link_urls else {
            return Vec::new();
        };
        urls.iter()
            .enumerate()
            .map(|(i, url)| {
                let text = self
                    .link_texts
                    .as_ref()
                    .and_then(|texts| texts.get(i))
                    .and_then(|t| t.as_deref());
                (url.as_str(), text)
            })
            .collect()
    }

    /// Every `(url, text)` pair, structured links first.
    pub fn all_links(&self) -> Vec<(&str, Option<&str>)> {
        let mut pairs: Vec<(&str, Option<&str>)> = self
            .links
            .iter()
            .flatten()
            .map(|link| (link.url(), link.text()))
            .collect();
        pairs.extend(self.url_pairs());
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.link_count() == 0 && self.link_urls.as_ref().map_or(true, Vec::is_empty)
    }
}

/// Bold/italic runs detected in the element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Emphasis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasized_text_contents: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasized_text_tags: Option<Vec<String>>,
}

impl Emphasis {
    pub fn is_empty(&self) -> bool {
        self.emphasized_text_contents.is_none() && self.emphasized_text_tags.is_none()
    }
}

/// Image payload of image-bearing elements.
///
/// `image_base64` is either absent or a complete payload; partial payloads
/// are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_mime_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
}

impl ImageInfo {
    /// Image info with a payload and MIME type.
    pub fn with_payload(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let base64 = base64.into();
        Self {
            image_base64: (!base64.is_empty()).then_some(base64),
            image_mime_type: Some(mime_type.into()),
            ..Default::default()
        }
    }
}

/// Email headers for elements partitioned from messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_from: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_to: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl EmailInfo {
    pub fn is_empty(&self) -> bool {
        self.sent_from.is_none() && self.sent_to.is_none() && self.subject.is_none()
    }
}
