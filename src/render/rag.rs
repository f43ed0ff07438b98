//! Retrieval-augmented-generation document export.
//!
//! Each document pairs a flat `metadataAttributes` object with a `content`
//! string, the shape knowledge-base ingestion jobs expect. Image payloads
//! never reach `content`; images are referenced by content hash.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::extract::{content_hash, DEFAULT_IMAGE_MIME};
use crate::model::Element;
use crate::vision::VisionClient;

use super::{RagGrouping, RagOptions};

/// One knowledge-base document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagDocument {
    #[serde(rename = "metadataAttributes")]
    pub metadata_attributes: Map<String, Value>,
    pub content: String,
}

impl RagDocument {
    /// Read a metadata attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.metadata_attributes.get(key)
    }

    fn flag(&self, key: &str) -> bool {
        self.attribute(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Vision usage across one export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptionStats {
    pub total_images: usize,
    pub images_described: usize,
    pub images_failed: usize,
    pub total_cost_estimate: f64,
    pub models_used: BTreeMap<String, usize>,
}

/// Chunking parameters suggested to the ingestion side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingHint {
    pub strategy: String,
    pub chunk_size: usize,
    pub overlap: usize,
    pub note: String,
}

impl ChunkingHint {
    fn for_grouping(grouping: RagGrouping) -> Self {
        let (strategy, chunk_size) = match grouping {
            RagGrouping::Page => ("fixed_size", 512),
            RagGrouping::Element => ("semantic", 300),
        };
        Self {
            strategy: strategy.to_string(),
            chunk_size,
            overlap: 50,
            note: "Knowledge bases chunk automatically; these values are optional".to_string(),
        }
    }
}

/// Result of a RAG export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagExport {
    pub documents: Vec<RagDocument>,
    pub document_count: usize,

    /// One compact JSON object per line
    pub json_lines: String,

    /// Pretty JSON array of the leading documents
    pub json_preview: String,

    /// Whether `json_preview` omits documents
    pub is_preview: bool,

    pub format_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_descriptions: Option<ImageDescriptionStats>,

    pub recommended_chunking: ChunkingHint,
}

/// Convert elements to RAG documents.
///
/// With image descriptions enabled, the vision client is built from
/// `options.vision` and the process environment.
pub fn to_rag(elements: &[Element], options: &RagOptions) -> Result<RagExport> {
    let mut exporter = RagExporter::new(options.clone());
    if options.describe_images {
        exporter = exporter.with_vision(VisionClient::from_options(&options.vision));
    }
    exporter.export(elements)
}

/// RAG exporter.
pub struct RagExporter {
    options: RagOptions,
    vision: Option<VisionClient>,
}

impl RagExporter {
    /// Create a new exporter.
    pub fn new(options: RagOptions) -> Self {
        Self {
            options,
            vision: None,
        }
    }

    /// Use the given vision client for image descriptions.
    pub fn with_vision(mut self, vision: VisionClient) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Export elements.
    pub fn export(&self, elements: &[Element]) -> Result<RagExport> {
        let documents = match self.options.grouping {
            RagGrouping::Element => self.element_documents(elements),
            RagGrouping::Page => self.page_documents(elements),
        };
        debug!(
            "Built {} RAG documents ({} grouping)",
            documents.len(),
            self.options.grouping.as_str()
        );

        let json_lines = documents
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?
            .join("\n");

        let preview_len = documents.len().min(self.options.preview_limit);
        let json_preview = serde_json::to_string_pretty(&documents[..preview_len])?;

        let image_descriptions = if self.options.describe_images {
            Some(description_stats(&documents))
        } else {
            None
        };

        Ok(RagExport {
            document_count: documents.len(),
            is_preview: documents.len() > self.options.preview_limit,
            json_lines,
            json_preview,
            format_type: self.options.grouping.as_str().to_string(),
            image_descriptions,
            recommended_chunking: ChunkingHint::for_grouping(self.options.grouping),
            documents,
        })
    }

    fn element_documents(&self, elements: &[Element]) -> Vec<RagDocument> {
        let mut documents = Vec::new();

        for (index, element) in elements.iter().enumerate() {
            let text = element.trimmed_text();
            if text.is_empty() || element.element_type.is_page_break() {
                continue;
            }

            let mut attrs = Map::new();
            attrs.insert("source".into(), json!(self.options.source));
            attrs.insert("element_index".into(), json!(index));
            attrs.insert("element_type".into(), json!(element.element_type.as_str()));

            if let Some(meta) = &element.metadata {
                if let Some(page) = meta.page_number.filter(|p| *p > 0) {
                    attrs.insert("page".into(), json!(page));
                }
                if let Some(filename) = non_empty(&meta.source.filename) {
                    attrs.insert("source".into(), json!(filename));
                }
                if let Some(filetype) = non_empty(&meta.source.filetype) {
                    attrs.insert("document_type".into(), json!(filetype));
                }
                if let Some(parent) = non_empty(&meta.hierarchy.parent_id) {
                    attrs.insert("parent_id".into(), json!(parent));
                }
                if let Some(depth) = meta.hierarchy.category_depth {
                    attrs.insert("hierarchy_level".into(), json!(depth));
                }
                if let Some(language) = meta.primary_language() {
                    attrs.insert("language".into(), json!(language));
                }
                let link_count = meta.links.link_count();
                if link_count > 0 {
                    attrs.insert("has_links".into(), json!(true));
                    attrs.insert("link_count".into(), json!(link_count));
                }
                if element.text_as_html().is_some() {
                    attrs.insert("is_table".into(), json!(true));
                }
                if let Some(sheet) = non_empty(&meta.page_name) {
                    attrs.insert("sheet_name".into(), json!(sheet));
                }
                if let Some(subject) = non_empty(&meta.email.subject) {
                    attrs.insert("email_subject".into(), json!(subject));
                }
                if let Some(from) = meta.email.sent_from.as_ref().filter(|f| !f.is_empty()) {
                    attrs.insert("email_from".into(), json!(from.join(", ")));
                }
            }

            let mut content = text.to_string();
            if element.element_type.is_image_like() {
                content = self.image_content(element, text, &mut attrs);
            }

            documents.push(RagDocument {
                metadata_attributes: attrs,
                content,
            });
        }

        documents
    }

    fn image_content(&self, element: &Element, text: &str, attrs: &mut Map<String, Value>) -> String {
        let Some((data, mime)) = element.image_payload() else {
            attrs.insert("image_described".into(), json!(false));
            if !self.options.describe_images {
                return format!("{}\n\n{}", text, UNDESCRIBED_NOTE);
            }
            return text.to_string();
        };

        let hash = content_hash(data);
        attrs.insert("image_hash".into(), json!(hash));
        attrs.insert("image_available".into(), json!(true));
        if let Some(url) = element
            .metadata
            .as_ref()
            .and_then(|m| non_empty(&m.source.url))
        {
            attrs.insert("image_url".into(), json!(url));
        }

        // Captions occasionally carry the payload itself.
        let caption = text.replace(data, &image_reference(&hash));
        let mut content = format!("{}\n\n{}", caption, image_reference(&hash));

        if !self.options.describe_images {
            attrs.insert("image_described".into(), json!(false));
            content.push_str("\n\n");
            content.push_str(UNDESCRIBED_NOTE);
            return content;
        }

        let local;
        let vision = match &self.vision {
            Some(vision) => vision,
            None => {
                local = VisionClient::local();
                &local
            }
        };
        let description = vision.describe(data, mime.unwrap_or(DEFAULT_IMAGE_MIME));

        if description.is_placeholder() {
            attrs.insert("image_described".into(), json!(false));
            attrs.insert("vision_model".into(), json!(description.model));
            if let Some(error) = &description.error {
                let error: String = error.chars().take(100).collect();
                attrs.insert("vision_error".into(), json!(error));
            }
            content.push_str(&format!(
                "\n\n[Note: image description unavailable, placeholder: {}]",
                description.description
            ));
        } else if description.description.trim() != text {
            attrs.insert("image_described".into(), json!(true));
            attrs.insert("vision_model".into(), json!(description.model));
            attrs.insert(
                "vision_cost_estimate".into(),
                json!(description.cost_estimate),
            );
            let described = description.description.replace(data, &image_reference(&hash));
            content.push_str(&format!("\n\n[Image description]: {}", described.trim()));
        } else {
            attrs.insert("image_described".into(), json!(false));
        }

        content
    }

    fn page_documents(&self, elements: &[Element]) -> Vec<RagDocument> {
        struct PageGroup<'a> {
            page: u32,
            texts: Vec<String>,
            element_types: Vec<String>,
            first: Option<&'a Element>,
        }

        let mut groups: Vec<PageGroup> = Vec::new();

        for element in elements {
            let text = element.trimmed_text();
            if text.is_empty() || element.element_type.is_page_break() {
                continue;
            }
            let page = element.page_number().filter(|p| *p > 0).unwrap_or(1);

            let position = match groups.iter().position(|g| g.page == page) {
                Some(position) => position,
                None => {
                    groups.push(PageGroup {
                        page,
                        texts: Vec::new(),
                        element_types: Vec::new(),
                        first: None,
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[position];

            let text = match element.image_payload() {
                Some((data, _)) => text.replace(data, &image_reference(&content_hash(data))),
                None => text.to_string(),
            };
            group.texts.push(text);
            let type_name = element.element_type.to_string();
            if !group.element_types.contains(&type_name) {
                group.element_types.push(type_name);
            }
            if group.first.is_none() && element.metadata.is_some() {
                group.first = Some(element);
            }
        }

        groups
            .into_iter()
            .map(|group| {
                let meta = group.first.and_then(|e| e.metadata.as_ref());
                let source = meta
                    .and_then(|m| non_empty(&m.source.filename))
                    .unwrap_or(&self.options.source);
                let document_type = meta
                    .and_then(|m| non_empty(&m.source.filetype))
                    .unwrap_or("unknown");

                let mut attrs = Map::new();
                attrs.insert("source".into(), json!(source));
                attrs.insert("page".into(), json!(group.page));
                attrs.insert("document_type".into(), json!(document_type));
                attrs.insert("element_count".into(), json!(group.texts.len()));
                attrs.insert("element_types".into(), json!(group.element_types));
                if let Some(language) = meta.and_then(|m| m.primary_language()) {
                    attrs.insert("language".into(), json!(language));
                }

                RagDocument {
                    metadata_attributes: attrs,
                    content: group.texts.join("\n\n"),
                }
            })
            .collect()
    }
}

const UNDESCRIBED_NOTE: &str =
    "[Note: image not described - enable image descriptions for searchable content]";

fn image_reference(hash: &str) -> String {
    format!("[image:{}]", hash)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn description_stats(documents: &[RagDocument]) -> ImageDescriptionStats {
    let mut stats = ImageDescriptionStats::default();
    for doc in documents {
        if !doc.flag("image_available") {
            continue;
        }
        stats.total_images += 1;
        if doc.flag("image_described") {
            stats.images_described += 1;
            stats.total_cost_estimate += doc
                .attribute("vision_cost_estimate")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let model = doc
                .attribute("vision_model")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            *stats.models_used.entry(model.to_string()).or_insert(0) += 1;
        } else {
            stats.images_failed += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementType;
    use crate::vision::{ImageDescriber, ImageDescription};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedDescriber;

    impl ImageDescriber for FixedDescriber {
        fn name(&self) -> &str {
            "fixed"
        }

        fn describe(&self, _data: &str, _mime: &str) -> Result<ImageDescription> {
            Ok(ImageDescription {
                description: "A red square".to_string(),
                model: "fixed-1".to_string(),
                cost_estimate: 0.25,
                cached: false,
                error: None,
            })
        }
    }

    fn fixed_vision() -> VisionClient {
        VisionClient::new(Arc::new(FixedDescriber), Duration::from_secs(5))
    }

    #[test]
    fn test_element_grouping_skips_empty_and_breaks() {
        let elements = vec![
            Element::title("Intro").with_page(1).with_depth(0),
            Element::page_break(),
            Element::narrative("   "),
            Element::narrative("Body").with_languages(&["eng"]),
        ];
        let export = to_rag(&elements, &RagOptions::new("doc.pdf")).unwrap();

        assert_eq!(export.document_count, 2);
        let first = &export.documents[0];
        assert_eq!(first.attribute("source").unwrap(), "doc.pdf");
        assert_eq!(first.attribute("element_index").unwrap(), 0);
        assert_eq!(first.attribute("page").unwrap(), 1);
        assert_eq!(first.attribute("hierarchy_level").unwrap(), 0);
        assert_eq!(export.documents[1].attribute("element_index").unwrap(), 3);
        assert_eq!(export.documents[1].attribute("language").unwrap(), "eng");
        assert!(export.image_descriptions.is_none());
        assert_eq!(export.recommended_chunking.strategy, "semantic");
        assert_eq!(export.recommended_chunking.chunk_size, 300);
    }

    #[test]
    fn test_image_content_has_hash_not_payload() {
        let payload = "iVBORw0KGgo".repeat(50);
        let elements = vec![Element::image("Figure 1", payload.as_str(), "image/png")];
        let export = to_rag(&elements, &RagOptions::new("doc.pdf")).unwrap();
        let doc = &export.documents[0];

        let hash = content_hash(&payload);
        assert_eq!(doc.attribute("image_hash").unwrap(), hash.as_str());
        assert_eq!(doc.attribute("image_available").unwrap(), true);
        assert_eq!(doc.attribute("image_described").unwrap(), false);
        assert!(!doc.content.contains(&payload));
        assert!(doc.content.contains(&hash));
        assert!(!export.json_lines.contains(&payload));
    }

    #[test]
    fn test_payload_in_caption_replaced() {
        let elements = vec![Element::image("data aGVsbG8gd29ybGQ=", "aGVsbG8gd29ybGQ=", "image/png")];
        let export = to_rag(&elements, &RagOptions::new("x")).unwrap();
        assert!(!export.documents[0].content.contains("aGVsbG8gd29ybGQ="));
    }

    #[test]
    fn test_vision_description() {
        let elements = vec![
            Element::image("Chart", "aGk=", "image/png"),
            Element::new(ElementType::Figure, "No data"),
        ];
        let options = RagOptions::new("x").with_image_descriptions(true);
        let export = RagExporter::new(options)
            .with_vision(fixed_vision())
            .export(&elements)
            .unwrap();

        let doc = &export.documents[0];
        assert_eq!(doc.attribute("image_described").unwrap(), true);
        assert_eq!(doc.attribute("vision_model").unwrap(), "fixed-1");
        assert!(doc.content.ends_with("[Image description]: A red square"));

        let stats = export.image_descriptions.unwrap();
        assert_eq!(stats.total_images, 1);
        assert_eq!(stats.images_described, 1);
        assert_eq!(stats.images_failed, 0);
        assert!((stats.total_cost_estimate - 0.25).abs() < f64::EPSILON);
        assert_eq!(stats.models_used["fixed-1"], 1);
    }

    #[test]
    fn test_vision_fallback_counts_as_failed() {
        let elements = vec![Element::image("Chart", "aGk=", "image/gif")];
        let options = RagOptions::new("x").with_image_descriptions(true);
        let export = RagExporter::new(options)
            .with_vision(VisionClient::local())
            .export(&elements)
            .unwrap();

        let doc = &export.documents[0];
        assert_eq!(doc.attribute("image_described").unwrap(), false);
        assert!(doc.content.contains("Image element (type: image/gif)"));
        assert_eq!(export.image_descriptions.unwrap().images_failed, 1);
    }

    #[test]
    fn test_page_grouping() {
        let mut first = Element::title("Intro").with_page(2).with_languages(&["deu"]);
        first.metadata_mut().source.filetype = Some("application/pdf".into());
        let elements = vec![
            first,
            Element::narrative("Page one").with_page(1),
            Element::narrative("More intro").with_page(2),
            Element::narrative("No page"),
        ];
        let options = RagOptions::new("doc.pdf").with_grouping(RagGrouping::Page);
        let export = to_rag(&elements, &options).unwrap();

        assert_eq!(export.document_count, 2);
        let page_two = &export.documents[0];
        assert_eq!(page_two.attribute("page").unwrap(), 2);
        assert_eq!(page_two.content, "Intro\n\nMore intro");
        assert_eq!(page_two.attribute("element_count").unwrap(), 2);
        assert_eq!(page_two.attribute("document_type").unwrap(), "application/pdf");
        assert_eq!(page_two.attribute("language").unwrap(), "deu");
        assert_eq!(
            page_two.attribute("element_types").unwrap(),
            &json!(["Title", "NarrativeText"])
        );

        let page_one = &export.documents[1];
        assert_eq!(page_one.content, "Page one\n\nNo page");
        assert_eq!(page_one.attribute("document_type").unwrap(), "unknown");
        assert_eq!(export.recommended_chunking.chunk_size, 512);
    }

    #[test]
    fn test_json_lines_and_preview() {
        let elements: Vec<Element> = (0..7).map(|i| Element::narrative(format!("Line {}", i))).collect();
        let export = to_rag(&elements, &RagOptions::new("x")).unwrap();

        assert_eq!(export.json_lines.lines().count(), 7);
        for line in export.json_lines.lines() {
            let doc: RagDocument = serde_json::from_str(line).unwrap();
            assert!(doc.content.starts_with("Line"));
        }
        let preview: Vec<RagDocument> = serde_json::from_str(&export.json_preview).unwrap();
        assert_eq!(preview.len(), 5);
        assert!(export.is_preview);
    }
}
