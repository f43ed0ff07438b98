//! JSON export for element sequences.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::Element;

use super::{JsonFormat, JsonOptions};

/// Metadata attributes kept by the full-metadata export.
const EXPORTED_METADATA: &[&str] = &[
    "filename",
    "file_directory",
    "filetype",
    "last_modified",
    "url",
    "page_number",
    "page_name",
    "coordinates",
    "languages",
    "parent_id",
    "category_depth",
    "links",
    "link_urls",
    "link_texts",
    "emphasized_text_contents",
    "emphasized_text_tags",
    "text_as_html",
    "image_base64",
    "image_mime_type",
    "image_path",
    "image_width",
    "image_height",
    "sent_from",
    "sent_to",
    "subject",
    "detection_class_prob",
    "is_continuation",
];

fn serialize<T: serde::Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert elements to a JSON array of element records.
pub fn to_json(elements: &[Element], format: JsonFormat) -> Result<String> {
    serialize(elements, format)
}

/// Convert elements to plain JSON values, one per element.
pub fn to_dicts(elements: &[Element]) -> Result<Vec<Value>> {
    elements
        .iter()
        .map(|element| serde_json::to_value(element).map_err(Error::from))
        .collect()
}

/// Convert elements to JSON with every known metadata attribute.
///
/// Image payloads longer than the preview length are cut and marked with
/// `has_full_image_base64`.
pub fn to_json_full_metadata(elements: &[Element], options: &JsonOptions) -> Result<String> {
    let records = elements
        .iter()
        .map(|element| full_record(element, options))
        .collect::<Result<Vec<_>>>()?;
    serialize(&records, options.format)
}

fn full_record(element: &Element, options: &JsonOptions) -> Result<Value> {
    let mut record = Map::new();
    record.insert(
        "type".to_string(),
        Value::String(element.element_type.to_string()),
    );
    record.insert(
        "element_id".to_string(),
        element.id.clone().map_or(Value::Null, Value::String),
    );
    record.insert("text".to_string(), Value::String(element.text.clone()));

    if let Some(meta) = &element.metadata {
        let mut metadata: Map<String, Value> = meta
            .to_map()?
            .into_iter()
            .filter(|(key, _)| EXPORTED_METADATA.contains(&key.as_str()))
            .collect();

        if let Some(Value::String(payload)) = metadata.get("image_base64") {
            if payload.chars().count() > options.base64_preview_chars {
                let preview: String = payload.chars().take(options.base64_preview_chars).collect();
                metadata.insert(
                    "image_base64".to_string(),
                    Value::String(format!("{}...", preview)),
                );
                metadata.insert("has_full_image_base64".to_string(), Value::Bool(true));
            }
        }

        if !metadata.is_empty() {
            record.insert("metadata".to_string(), Value::Object(metadata));
        }
    }

    Ok(Value::Object(record))
}
