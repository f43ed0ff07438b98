//! Export of element sequences to text, HTML, Markdown, JSON, CSV and RAG documents.

mod html;
mod json;
mod markdown;
mod options;
mod rag;
mod result;
mod tabular;
mod text;

pub use html::{to_html, HtmlExporter};
pub use json::{to_dicts, to_json, to_json_full_metadata};
pub use markdown::{to_markdown, MarkdownExporter};
pub use options::{HtmlOptions, JsonFormat, JsonOptions, MarkdownOptions, RagGrouping, RagOptions};
pub use rag::{to_rag, ChunkingHint, ImageDescriptionStats, RagDocument, RagExport, RagExporter};
pub use result::{convert_all_formats, ExportStats, FormatBundle};
pub use tabular::to_csv;
pub use text::to_text;

/// Heading level for a title at the given hierarchy depth (`h2` at depth 0).
pub(crate) fn heading_level(depth: u32) -> usize {
    (depth as usize + 2).min(6)
}
