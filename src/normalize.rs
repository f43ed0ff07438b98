//! Element normalization and structural analysis.
//!
//! Both passes read elements only. A failure while reading one element's
//! metadata is logged and recorded, and the pass continues with the next
//! element so the returned lists are always complete for the rest.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::extract::{content_hash, DEFAULT_IMAGE_MIME};
use crate::model::{Element, ElementType};

const PREVIEW_CHARS: usize = 200;
const SHORT_PREVIEW_CHARS: usize = 100;

fn preview(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Flat per-element record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedElement {
    /// Position in the input sequence
    pub index: usize,

    /// Type tag
    #[serde(rename = "type")]
    pub element_type: String,

    /// Trimmed text
    pub text: String,

    /// Present metadata attributes only
    pub metadata: Map<String, Value>,
}

/// Normalize every element into a flat record.
///
/// Elements whose metadata cannot be read keep an empty metadata map.
pub fn normalize(elements: &[Element]) -> Vec<NormalizedElement> {
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| NormalizedElement {
            index,
            element_type: element.element_type.to_string(),
            text: element.trimmed_text().to_string(),
            metadata: metadata_map(index, element).unwrap_or_default(),
        })
        .collect()
}

fn metadata_map(index: usize, element: &Element) -> Option<Map<String, Value>> {
    let meta = element.metadata.as_ref()?;
    match meta.to_map() {
        Ok(map) => Some(map),
        Err(e) => {
            warn!("Skipping metadata of element {}: {}", index, e);
            None
        }
    }
}

/// Summary of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub index: usize,
    #[serde(rename = "type")]
    pub element_type: String,
    pub text_preview: String,
    pub text_length: usize,
    pub has_metadata: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Image-like element summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub index: usize,
    #[serde(rename = "type")]
    pub element_type: String,
    pub caption: String,
    pub page_number: Option<u32>,
    pub has_base64: bool,
    pub mime_type: Option<String>,
    pub hash: Option<String>,
}

/// Table element summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub index: usize,
    pub text: String,
    pub html: Option<String>,
    pub page_number: Option<u32>,
}

/// Hyperlink occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub element_index: usize,
    pub url: String,
    pub text: Option<String>,
}

/// Email header occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub element_index: usize,
    pub sent_from: Vec<String>,
    pub sent_to: Vec<String>,
    pub subject: Option<String>,
}

/// Any element-scoped attribute with a short text preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Located<T> {
    pub element_index: usize,
    pub element_type: String,
    pub value: T,
    pub text_preview: String,
}

fn locate<T>(index: usize, element_type: &str, text_preview: &str, value: T) -> Located<T> {
    Located {
        element_index: index,
        element_type: element_type.to_string(),
        value,
        text_preview: text_preview.to_string(),
    }
}

/// Hierarchy fields of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub parent_id: Option<String>,
    pub category_depth: Option<u32>,
}

/// Structural analysis of an element sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub total_elements: usize,
    pub element_details: BTreeMap<String, Vec<ElementInfo>>,
    pub images: Vec<ImageSummary>,
    pub tables: Vec<TableSummary>,
    pub links: Vec<LinkSummary>,
    pub emails: Vec<EmailSummary>,
    pub coordinates: Vec<Located<Value>>,
    pub hierarchies: Vec<Located<HierarchyEntry>>,
    pub languages: Vec<Located<Vec<String>>>,
    pub emphasized_texts: Vec<Located<Vec<String>>>,
    pub special_elements: BTreeMap<String, usize>,
    pub sheets: BTreeSet<String>,
    /// Indices of elements whose metadata could not be read
    pub failed_elements: Vec<usize>,
}

impl Analysis {
    pub fn total_images(&self) -> usize {
        self.images.len()
    }

    pub fn total_tables(&self) -> usize {
        self.tables.len()
    }
}

/// Analyze the structure and metadata of an element sequence.
pub fn analyze(elements: &[Element]) -> Analysis {
    let mut analysis = Analysis {
        total_elements: elements.len(),
        ..Default::default()
    };

    for (index, element) in elements.iter().enumerate() {
        let type_name = element.element_type.to_string();
        let text = element.trimmed_text();
        let short = preview(text, SHORT_PREVIEW_CHARS);

        let metadata = match &element.metadata {
            Some(meta) => match meta.to_map() {
                Ok(map) => map,
                Err(e) => {
                    warn!("Skipping metadata of element {}: {}", index, e);
                    analysis.failed_elements.push(index);
                    Map::new()
                }
            },
            None => Map::new(),
        };

        if let Some(meta) = &element.metadata {
            if !meta.hierarchy.is_empty() {
                let entry = HierarchyEntry {
                    parent_id: meta.hierarchy.parent_id.clone(),
                    category_depth: meta.hierarchy.category_depth,
                };
                analysis
                    .hierarchies
                    .push(locate(index, &type_name, &short, entry));
            }
            if let Some(coords) = &meta.coordinates {
                analysis
                    .coordinates
                    .push(locate(index, &type_name, &short, coords.clone()));
            }
            if let Some(langs) = meta.languages.as_ref().filter(|l| !l.is_empty()) {
                analysis
                    .languages
                    .push(locate(index, &type_name, &short, langs.clone()));
            }
            if let Some(emph) = meta
                .emphasis
                .emphasized_text_contents
                .as_ref()
                .filter(|e| !e.is_empty())
            {
                analysis
                    .emphasized_texts
                    .push(locate(index, &type_name, &short, emph.clone()));
            }
            for link in meta.links.links.iter().flatten() {
                analysis.links.push(LinkSummary {
                    element_index: index,
                    url: link.url().to_string(),
                    text: link.text().map(str::to_string),
                });
            }
            for (url, text) in meta.links.url_pairs() {
                analysis.links.push(LinkSummary {
                    element_index: index,
                    url: url.to_string(),
                    text: text.map(str::to_string),
                });
            }
            if !meta.email.is_empty() {
                analysis.emails.push(EmailSummary {
                    element_index: index,
                    sent_from: meta.email.sent_from.clone().unwrap_or_default(),
                    sent_to: meta.email.sent_to.clone().unwrap_or_default(),
                    subject: meta.email.subject.clone(),
                });
            }
            if let Some(sheet) = meta.page_name.as_ref().filter(|s| !s.is_empty()) {
                analysis.sheets.insert(sheet.clone());
            }
        }

        if element.element_type.is_image_like() {
            let payload = element.image_payload();
            analysis.images.push(ImageSummary {
                index,
                element_type: type_name.clone(),
                caption: text.to_string(),
                page_number: element.page_number(),
                has_base64: payload.is_some(),
                mime_type: payload
                    .map(|(_, mime)| mime.unwrap_or(DEFAULT_IMAGE_MIME).to_string()),
                hash: payload.map(|(data, _)| content_hash(data)),
            });
        } else if element.element_type.is_table_like() {
            analysis.tables.push(TableSummary {
                index,
                text: text.to_string(),
                html: element.text_as_html().map(str::to_string),
                page_number: element.page_number(),
            });
        } else if matches!(
            element.element_type,
            ElementType::Title
                | ElementType::ListItem
                | ElementType::Header
                | ElementType::Footer
                | ElementType::NarrativeText
        ) {
            *analysis
                .special_elements
                .entry(type_name.clone())
                .or_insert(0) += 1;
        }

        analysis
            .element_details
            .entry(type_name.clone())
            .or_default()
            .push(ElementInfo {
                index,
                element_type: type_name,
                text_preview: preview(text, PREVIEW_CHARS),
                text_length: text.chars().count(),
                has_metadata: element.metadata.is_some(),
                metadata,
            });
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementMetadata, Link};

    #[test]
    fn test_normalize_keeps_order_and_present_keys() {
        let elements = vec![
            Element::title("  Report  ").with_depth(0),
            Element::narrative("Body").with_page(1),
            Element::page_break(),
        ];
        let normalized = normalize(&elements);

        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].text, "Report");
        assert_eq!(normalized[0].element_type, "Title");
        assert_eq!(normalized[0].metadata["category_depth"], 0);
        assert!(!normalized[0].metadata.contains_key("page_number"));
        assert_eq!(normalized[1].index, 1);
        assert!(normalized[2].metadata.is_empty());
    }

    #[test]
    fn test_analyze_collects_structures() {
        let mut linked = Element::narrative("See docs").with_languages(&["eng", "deu"]);
        linked.metadata_mut().links.links = Some(vec![Link::Url("https://a.example".into())]);

        let mut sheet = Element::table("a b", Some("<table></table>"));
        sheet.metadata_mut().page_name = Some("Sheet1".into());

        let elements = vec![
            Element::title("Intro").with_depth(1),
            linked,
            sheet,
            Element::image("Chart", "aGk=", "image/gif").with_page(3),
            Element::new(ElementType::Figure, "No payload").with_metadata(ElementMetadata::new()),
        ];
        let analysis = analyze(&elements);

        assert_eq!(analysis.total_elements, 5);
        assert_eq!(analysis.total_images(), 2);
        assert!(analysis.images[0].has_base64);
        assert!(!analysis.images[1].has_base64);
        assert_eq!(analysis.total_tables(), 1);
        assert_eq!(analysis.links[0].url, "https://a.example");
        assert_eq!(analysis.languages[0].value, vec!["eng", "deu"]);
        assert_eq!(analysis.hierarchies.len(), 1);
        assert!(analysis.sheets.contains("Sheet1"));
        assert_eq!(analysis.special_elements["Title"], 1);
        assert_eq!(analysis.element_details["NarrativeText"].len(), 1);
        assert!(analysis.failed_elements.is_empty());
    }
}
