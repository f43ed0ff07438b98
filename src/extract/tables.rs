//! Table collection.

use serde::{Deserialize, Serialize};

use crate::model::Element;

/// A table found in the element sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// Position of the source element
    pub index: usize,

    /// Plain text of the table
    pub text: String,

    /// HTML rendering from the partitioner, if any
    pub html: Option<String>,

    /// Best-effort CSV derived from the plain text
    pub csv: Option<String>,

    /// Page number, if known
    pub page_number: Option<u32>,
}

/// Collect all Table elements.
pub fn collect_tables(elements: &[Element]) -> Vec<ExtractedTable> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.element_type.is_table())
        .map(|(index, element)| {
            let text = element.trimmed_text().to_string();
            let csv = (!text.is_empty()).then(|| naive_csv(&text));
            ExtractedTable {
                index,
                html: element.text_as_html().map(str::to_string),
                csv,
                text,
                page_number: element.page_number(),
            }
        })
        .collect()
}

/// Split each line on whitespace and join the pieces with commas.
///
/// This is lossy: cells containing spaces or commas are not preserved.
/// Blank lines are dropped.
pub fn naive_csv(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(","))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_csv() {
        let text = "Name Age\nAlice 30\n\nBob   41";
        assert_eq!(naive_csv(text), "Name,Age\nAlice,30\nBob,41");
    }

    #[test]
    fn test_naive_csv_splits_multiword_cells() {
        // Known lossy behavior
        assert_eq!(naive_csv("New York 5"), "New,York,5");
    }

    #[test]
    fn test_collect_tables() {
        let html = "<table><tr><td>1</td></tr></table>";
        let elements = vec![
            Element::title("Numbers"),
            Element::table("1", Some(html)).with_page(4),
            Element::table("", None),
        ];
        let tables = collect_tables(&elements);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].index, 1);
        assert_eq!(tables[0].html.as_deref(), Some(html));
        assert_eq!(tables[0].csv.as_deref(), Some("1"));
        assert_eq!(tables[0].page_number, Some(4));
        assert!(tables[1].csv.is_none());
    }
}
