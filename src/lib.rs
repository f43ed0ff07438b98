//! # ragpack
//!
//! Export partitioned document elements to text, HTML, Markdown, JSON, CSV
//! and knowledge-base import packages.
//!
//! Documents are segmented into typed [`Element`]s by an external
//! partitioning library. This crate takes that element sequence and turns it
//! into every artifact a retrieval pipeline needs: readable renderings,
//! metadata-rich JSON, RAG documents with hash-referenced images, and ZIP
//! archives bundling it all with a manifest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ragpack::{load_elements, render};
//!
//! fn main() -> ragpack::Result<()> {
//!     // Element JSON written by the partitioning library
//!     let elements = load_elements("report.elements.json")?;
//!
//!     let markdown = render::to_markdown(&elements, &render::MarkdownOptions::default());
//!     println!("{}", markdown);
//!
//!     let rag = render::to_rag(&elements, &render::RagOptions::new("report.pdf"))?;
//!     std::fs::write("rag_data.jsonl", rag.json_lines)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Multiple output formats**: text, HTML, Markdown, JSON, CSV, RAG JSON lines
//! - **Independent exporters**: one failing format never aborts the others
//! - **Image packaging**: hash-named images plus manifest in a ZIP archive
//! - **Vision descriptions**: optional, bounded by timeout and cancellation
//! - **Cleaning and chunking**: text normalization and size-bounded chunks

pub mod chunk;
pub mod clean;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod outcome;
pub mod package;
pub mod partition;
pub mod render;
pub mod vision;

// Re-export commonly used types
pub use chunk::{chunk_elements, Chunk, ChunkOptions, ChunkResult, ChunkStrategy};
pub use clean::{clean_elements, CleanOptions, CleanResult};
pub use error::{Error, Result};
pub use extract::{collect_images, collect_tables, content_hash, ExtractedImage, ExtractedTable};
pub use model::{Element, ElementMetadata, ElementType};
pub use normalize::{analyze, normalize, Analysis, NormalizedElement};
pub use outcome::{FailureKind, Outcome};
pub use package::{
    export_images, export_import_package, ImageArchive, ImportPackage, PackageOptions, Packager,
};
pub use partition::{
    process_bytes, process_file, FileKind, LoadedElements, PartitionParams, Partitioner,
    PartitionerRegistry, ProcessOptions, ProcessReport, Strategy,
};
pub use render::{
    convert_all_formats, FormatBundle, HtmlOptions, JsonFormat, JsonOptions, MarkdownOptions,
    RagExport, RagGrouping, RagOptions,
};
pub use vision::{VisionClient, VisionOptions, VisionProvider};

use std::path::Path;

/// Load elements from an element JSON file.
///
/// # Example
///
/// ```no_run
/// use ragpack::load_elements;
///
/// let elements = load_elements("report.elements.json").unwrap();
/// println!("Elements: {}", elements.len());
/// ```
pub fn load_elements<P: AsRef<Path>>(path: P) -> Result<Vec<Element>> {
    let file = std::fs::File::open(path)?;
    partition::elements_from_reader(std::io::BufReader::new(file))
}

/// Parse elements from element JSON.
pub fn load_elements_from_str(json: &str) -> Result<Vec<Element>> {
    partition::elements_from_json(json)
}

/// Convert an element JSON file to Markdown.
///
/// # Example
///
/// ```no_run
/// use ragpack::to_markdown;
///
/// let markdown = to_markdown("report.elements.json").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let elements = load_elements(path)?;
    Ok(render::to_markdown(&elements, &MarkdownOptions::default()))
}

/// Convert an element JSON file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let elements = load_elements(path)?;
    Ok(render::to_text(&elements))
}

/// Convert an element JSON file to RAG JSON lines.
///
/// # Example
///
/// ```no_run
/// use ragpack::to_rag_jsonl;
///
/// let jsonl = to_rag_jsonl("report.elements.json", "report.pdf").unwrap();
/// std::fs::write("rag_data.jsonl", jsonl).unwrap();
/// ```
pub fn to_rag_jsonl<P: AsRef<Path>>(path: P, source: &str) -> Result<String> {
    let elements = load_elements(path)?;
    Ok(render::to_rag(&elements, &RagOptions::new(source))?.json_lines)
}

/// Builder for processing a document and exporting its elements.
///
/// # Example
///
/// ```no_run
/// use ragpack::{Ragpack, Strategy};
///
/// let package = Ragpack::new()
///     .with_strategy(Strategy::HiRes)
///     .with_cleaning()
///     .with_source("report.pdf")
///     .process("report.elements.json")?
///     .import_package();
/// # Ok::<(), ragpack::Error>(())
/// ```
pub struct Ragpack {
    registry: PartitionerRegistry,
    process_options: ProcessOptions,
    clean_options: Option<CleanOptions>,
    source: Option<String>,
    describe_images: bool,
    vision_options: VisionOptions,
}

impl Ragpack {
    /// Create a new builder with the default partitioners.
    pub fn new() -> Self {
        Self {
            registry: PartitionerRegistry::with_defaults(),
            process_options: ProcessOptions::default(),
            clean_options: None,
            source: None,
            describe_images: false,
            vision_options: VisionOptions::default(),
        }
    }

    /// Use a custom partitioner registry.
    pub fn with_registry(mut self, registry: PartitionerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the partitioning strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.process_options = self.process_options.with_strategy(strategy);
        self
    }

    /// Set all processing options.
    pub fn with_process_options(mut self, options: ProcessOptions) -> Self {
        self.process_options = options;
        self
    }

    /// Clean element texts with the default cleaning options.
    pub fn with_cleaning(mut self) -> Self {
        self.clean_options = Some(CleanOptions::default());
        self
    }

    /// Clean element texts with custom options.
    pub fn with_clean_options(mut self, options: CleanOptions) -> Self {
        self.clean_options = Some(options);
        self
    }

    /// Source document name used in RAG documents and manifests.
    ///
    /// Defaults to the processed file's name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Describe images with a vision service.
    pub fn with_image_descriptions(mut self, vision: VisionOptions) -> Self {
        self.describe_images = true;
        self.vision_options = vision;
        self
    }

    /// Process a file and return a result wrapper.
    pub fn process<P: AsRef<Path>>(self, path: P) -> Result<RagpackResult> {
        let path = path.as_ref();
        let report = process_file(&self.registry, path, &self.process_options);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.finish(report, name)
    }

    /// Process an in-memory upload.
    pub fn process_bytes(self, data: &[u8], filename: &str) -> Result<RagpackResult> {
        let report = process_bytes(&self.registry, data, filename, &self.process_options);
        self.finish(report, filename.to_string())
    }

    fn finish(self, report: ProcessReport, name: String) -> Result<RagpackResult> {
        let elements = match report {
            ProcessReport::Success { elements, .. } => elements,
            ProcessReport::Failure { error, .. } => return Err(Error::Partition(error)),
        };
        let elements = match &self.clean_options {
            Some(options) => clean_elements(&elements, options).elements,
            None => elements,
        };

        Ok(RagpackResult {
            elements,
            source: self.source.unwrap_or(name),
            describe_images: self.describe_images,
            vision_options: self.vision_options,
        })
    }
}

impl Default for Ragpack {
    fn default() -> Self {
        Self::new()
    }
}

/// Processed elements ready for export.
pub struct RagpackResult {
    /// The element sequence
    pub elements: Vec<Element>,
    /// Source document name
    pub source: String,
    describe_images: bool,
    vision_options: VisionOptions,
}

impl RagpackResult {
    /// Wrap an existing element sequence.
    pub fn from_elements(elements: Vec<Element>, source: impl Into<String>) -> Self {
        Self {
            elements,
            source: source.into(),
            describe_images: false,
            vision_options: VisionOptions::default(),
        }
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.elements)
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self, options: &MarkdownOptions) -> String {
        render::to_markdown(&self.elements, options)
    }

    /// Convert to HTML.
    pub fn to_html(&self, options: &HtmlOptions) -> String {
        render::to_html(&self.elements, options)
    }

    /// Convert to element JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.elements, format)
    }

    /// Convert to RAG documents.
    pub fn to_rag(&self, grouping: RagGrouping) -> Result<RagExport> {
        let options = RagOptions::new(self.source.clone())
            .with_grouping(grouping)
            .with_image_descriptions(self.describe_images)
            .with_vision(self.vision_options.clone());
        render::to_rag(&self.elements, &options)
    }

    /// Every export format at once.
    pub fn convert_all(&self, embed_images: bool) -> FormatBundle {
        convert_all_formats(&self.elements, embed_images)
    }

    /// Image archive of every image payload.
    pub fn image_archive(&self) -> Outcome<ImageArchive> {
        export_images(&self.elements, &self.package_options())
    }

    /// Knowledge-base import package.
    pub fn import_package(&self) -> Outcome<ImportPackage> {
        export_import_package(&self.elements, &self.package_options())
    }

    /// Chunk the elements.
    pub fn chunk(&self, options: &ChunkOptions) -> Result<ChunkResult> {
        chunk_elements(&self.elements, options)
    }

    /// Structural analysis of the elements.
    pub fn analyze(&self) -> Analysis {
        analyze(&self.elements)
    }

    fn package_options(&self) -> PackageOptions {
        PackageOptions::new(self.source.clone())
            .with_image_descriptions(self.describe_images)
            .with_vision(self.vision_options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"type": "Title", "text": "Quarterly   report", "metadata": {"page_number": 1}},
        {"type": "NarrativeText", "text": "Revenue grew.", "metadata": {"page_number": 1}},
        {"type": "Image", "text": "Chart",
         "metadata": {"image_base64": "aGVsbG8=", "image_mime_type": "image/png", "page_number": 2}}
    ]"#;

    #[test]
    fn test_ragpack_builder() {
        let builder = Ragpack::new()
            .with_strategy(Strategy::Fast)
            .with_cleaning()
            .with_source("report.pdf");

        assert_eq!(builder.process_options.strategy, Strategy::Fast);
        assert!(builder.clean_options.is_some());
        assert_eq!(builder.source.as_deref(), Some("report.pdf"));
        assert!(!builder.describe_images);
    }

    #[test]
    fn test_process_bytes_with_cleaning() {
        let result = Ragpack::new()
            .with_cleaning()
            .process_bytes(SAMPLE.as_bytes(), "report.json")
            .unwrap();

        assert_eq!(result.source, "report.json");
        assert_eq!(result.elements.len(), 3);
        assert_eq!(result.elements[0].text, "Quarterly report");
        assert!(result.to_text().contains("Revenue grew."));
    }

    #[test]
    fn test_process_unsupported_is_error() {
        let result = Ragpack::new().process_bytes(b"%PDF-1.7\n", "report.pdf");
        assert!(matches!(result, Err(Error::Partition(_))));
    }

    #[test]
    fn test_result_exports() {
        let elements = load_elements_from_str(SAMPLE).unwrap();
        let result = RagpackResult::from_elements(elements, "report.pdf");

        let rag = result.to_rag(RagGrouping::Page).unwrap();
        assert_eq!(rag.document_count, 2);
        assert!(result.image_archive().is_success());
        assert!(result.import_package().is_success());
        assert!(result.convert_all(false).failed_formats().is_empty());
    }

    #[test]
    fn test_load_elements_invalid() {
        assert!(load_elements_from_str("[{]").is_err());
        assert!(load_elements("/nonexistent/elements.json").is_err());
    }
}
