//! CSV export with one row per element.

use crate::error::{Error, Result};
use crate::model::Element;

const CSV_COLUMNS: &[&str] = &[
    "element_id",
    "type",
    "text",
    "page_number",
    "page_name",
    "filename",
    "filetype",
    "languages",
    "category_depth",
    "parent_id",
];

/// Convert elements to CSV. Missing attributes become empty cells.
pub fn to_csv(elements: &[Element]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;

    for element in elements {
        let meta = element.metadata.as_ref();
        let opt = |value: Option<String>| value.unwrap_or_default();

        writer.write_record([
            opt(element.id.clone()),
            element.element_type.to_string(),
            element.text.clone(),
            opt(element.page_number().map(|p| p.to_string())),
            opt(meta.and_then(|m| m.page_name.clone())),
            opt(meta.and_then(|m| m.source.filename.clone())),
            opt(meta.and_then(|m| m.source.filetype.clone())),
            opt(meta.and_then(|m| m.languages.as_ref().map(|l| l.join(";")))),
            opt(element.category_depth().map(|d| d.to_string())),
            opt(meta.and_then(|m| m.hierarchy.parent_id.clone())),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Render(format!("CSV flush error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Render(format!("CSV encoding error: {}", e)))
}
