//! Plain text export.

use crate::model::Element;

/// Join the non-empty element texts with blank lines.
pub fn to_text(elements: &[Element]) -> String {
    elements
        .iter()
        .map(Element::trimmed_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
