//! Boundary to the document partitioning library.
//!
//! Partitioning itself happens outside this crate. This module picks the
//! per-format parameters, dispatches to a registered [`Partitioner`] by
//! file extension and reports the outcome of one processing request.
//!
//! # Example
//!
//! ```no_run
//! use ragpack::partition::{process_file, PartitionerRegistry, ProcessOptions};
//!
//! let registry = PartitionerRegistry::with_defaults();
//! let report = process_file(&registry, "elements.json", &ProcessOptions::default());
//! println!("{} elements", report.element_count());
//! ```

mod detect;
mod json;
mod process;

pub use detect::{detect_kind, FileKind, IMAGE_EXTENSIONS};
pub use json::{
    elements_from_json, elements_from_reader, load_elements_json, load_elements_reader,
    JsonElementsPartitioner, LoadedElements,
};
pub use process::{process_bytes, process_file, ProcessOptions, ProcessReport};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::model::{Element, ElementType};

/// Partitioning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Auto,
    Fast,
    HiRes,
    OcrOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Fast => "fast",
            Strategy::HiRes => "hi_res",
            Strategy::OcrOnly => "ocr_only",
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Strategy::Auto),
            "fast" => Ok(Strategy::Fast),
            "hi_res" | "hires" => Ok(Strategy::HiRes),
            "ocr_only" => Ok(Strategy::OcrOnly),
            other => Err(Error::Other(format!("Unknown strategy: {}", other))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters handed to the partitioning library.
///
/// Unset optional fields are left to the library's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionParams {
    pub strategy: Strategy,
    pub include_page_breaks: bool,
    pub infer_table_structure: bool,
    pub include_metadata: bool,

    /// Extract embedded images
    pub extract_images: bool,

    /// Element types whose image crops are extracted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extract_image_block_types: Vec<ElementType>,

    /// Put extracted images into the element metadata as base64
    pub extract_image_block_to_payload: bool,

    /// OCR language hints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,

    pub detect_language_per_element: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdfminer_word_margin: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdfminer_char_margin: Option<f32>,

    pub include_slide_notes: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_page_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_subtable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_header: Option<bool>,

    /// The picture handler must be registered before partitioning
    pub requires_picture_handler: bool,
}

impl PartitionParams {
    /// Format-neutral parameters.
    pub fn generic(options: &ProcessOptions) -> Self {
        Self {
            strategy: options.strategy,
            include_page_breaks: true,
            infer_table_structure: options.include_tables,
            include_metadata: true,
            extract_images: false,
            extract_image_block_types: Vec::new(),
            extract_image_block_to_payload: false,
            languages: Vec::new(),
            detect_language_per_element: false,
            pdfminer_word_margin: None,
            pdfminer_char_margin: None,
            include_slide_notes: false,
            starting_page_number: None,
            find_subtable: None,
            include_header: None,
            requires_picture_handler: false,
        }
    }

    /// Parameters tuned for one document kind.
    pub fn for_kind(kind: FileKind, options: &ProcessOptions) -> Self {
        let generic = Self::generic(options);
        match kind {
            FileKind::Pdf => Self {
                infer_table_structure: true,
                extract_images: options.include_images,
                extract_image_block_types: vec![
                    ElementType::Image,
                    ElementType::Table,
                    ElementType::FigureCaption,
                    ElementType::Picture,
                ],
                extract_image_block_to_payload: true,
                languages: options.languages.clone(),
                detect_language_per_element: true,
                pdfminer_word_margin: Some(0.1),
                pdfminer_char_margin: Some(0.5),
                ..generic
            },
            FileKind::Image => Self {
                strategy: Strategy::HiRes,
                infer_table_structure: true,
                languages: options.languages.clone(),
                detect_language_per_element: true,
                ..generic
            },
            FileKind::Docx => Self {
                infer_table_structure: true,
                extract_images: options.include_images,
                ..generic
            },
            FileKind::Pptx => Self {
                infer_table_structure: true,
                include_slide_notes: true,
                starting_page_number: Some(1),
                requires_picture_handler: true,
                ..generic
            },
            FileKind::Xlsx => Self {
                infer_table_structure: true,
                starting_page_number: Some(1),
                find_subtable: Some(false),
                include_header: Some(false),
                ..generic
            },
            FileKind::Other => generic,
        }
    }
}

/// Adapter to the partitioning library.
///
/// Implement this trait to plug a partitioner in for a set of formats.
pub trait Partitioner: Send + Sync {
    /// Lowercase extensions without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    fn name(&self) -> &str;

    /// Partition the file at `path` into elements.
    fn partition(&self, path: &Path, params: &PartitionParams) -> Result<Vec<Element>>;

    /// Register the slide picture handler with the library.
    ///
    /// Returns whether image extraction is active afterwards.
    fn register_picture_handler(&self) -> Result<bool> {
        Ok(false)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

static PICTURE_HANDLER: Mutex<bool> = Mutex::new(false);

/// Register the picture handler once per process.
///
/// Later calls are no-ops once a registration succeeded. A failed
/// registration is retried on the next call.
pub fn ensure_picture_handler(partitioner: &dyn Partitioner) -> bool {
    let mut registered = match PICTURE_HANDLER.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *registered {
        return true;
    }

    match partitioner.register_picture_handler() {
        Ok(true) => {
            info!("Picture handler registered with {}", partitioner.name());
            *registered = true;
            true
        }
        Ok(false) => {
            warn!("Picture handler unavailable in {}", partitioner.name());
            false
        }
        Err(e) => {
            warn!("Picture handler registration failed: {}", e);
            false
        }
    }
}

/// Maps file extensions to partitioners.
pub struct PartitionerRegistry {
    partitioners: HashMap<String, Arc<dyn Partitioner>>,
    by_name: HashMap<String, Arc<dyn Partitioner>>,
}

impl PartitionerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            partitioners: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Registry with the element JSON loader.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonElementsPartitioner::new()));
        registry
    }

    /// Register a partitioner for all its extensions.
    pub fn register(&mut self, partitioner: Arc<dyn Partitioner>) {
        for ext in partitioner.supported_extensions() {
            self.partitioners
                .insert(ext.to_lowercase(), partitioner.clone());
        }
        self.by_name
            .insert(partitioner.name().to_lowercase(), partitioner);
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn Partitioner>> {
        self.partitioners.get(&ext.to_lowercase()).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Partitioner>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    pub fn supports(&self, ext: &str) -> bool {
        self.partitioners.contains_key(&ext.to_lowercase())
    }

    /// All registered extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.partitioners.keys().map(|s| s.as_str()).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Find the partitioner for a path by its extension.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn Partitioner>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat("file has no extension".into()))?;

        self.get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("no partitioner for .{}", ext)))
    }

    /// Partition a file with the matching partitioner.
    pub fn partition(&self, path: &Path, params: &PartitionParams) -> Result<Vec<Element>> {
        self.resolve(path)?.partition(path, params)
    }
}

impl Default for PartitionerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPartitioner {
        registrations: AtomicUsize,
    }

    impl Partitioner for CountingPartitioner {
        fn supported_extensions(&self) -> &[&str] {
            &["pptx"]
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn partition(&self, _path: &Path, _params: &PartitionParams) -> Result<Vec<Element>> {
            Ok(Vec::new())
        }

        fn register_picture_handler(&self) -> Result<bool> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("hi_res".parse::<Strategy>().unwrap(), Strategy::HiRes);
        assert_eq!("OCR_ONLY".parse::<Strategy>().unwrap(), Strategy::OcrOnly);
        assert!("slow".parse::<Strategy>().is_err());
        assert_eq!(Strategy::HiRes.to_string(), "hi_res");
    }

    #[test]
    fn test_pdf_params() {
        let params = PartitionParams::for_kind(FileKind::Pdf, &ProcessOptions::default());
        assert!(params.extract_image_block_to_payload);
        assert_eq!(params.extract_image_block_types.len(), 4);
        assert_eq!(params.languages, vec!["deu", "eng"]);
        assert_eq!(params.pdfminer_word_margin, Some(0.1));
        assert_eq!(params.pdfminer_char_margin, Some(0.5));
        assert!(params.detect_language_per_element);
    }

    #[test]
    fn test_image_params_force_hi_res() {
        let options = ProcessOptions::default().with_strategy(Strategy::Fast);
        let params = PartitionParams::for_kind(FileKind::Image, &options);
        assert_eq!(params.strategy, Strategy::HiRes);
    }

    #[test]
    fn test_office_params() {
        let options = ProcessOptions::default();
        let pptx = PartitionParams::for_kind(FileKind::Pptx, &options);
        assert!(pptx.include_slide_notes);
        assert!(pptx.requires_picture_handler);
        assert_eq!(pptx.starting_page_number, Some(1));

        let xlsx = PartitionParams::for_kind(FileKind::Xlsx, &options);
        assert_eq!(xlsx.find_subtable, Some(false));
        assert_eq!(xlsx.include_header, Some(false));
        assert!(!xlsx.extract_images);
    }

    #[test]
    fn test_registry_dispatch() {
        let registry = PartitionerRegistry::with_defaults();
        assert!(registry.supports("JSON"));
        assert!(!registry.supports("pdf"));
        assert!(registry.get_by_name("elements-json").is_some());
        assert!(matches!(
            registry.resolve(Path::new("report.pdf")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(registry.resolve(Path::new("README")).is_err());
    }

    #[test]
    fn test_picture_handler_registers_once() {
        let partitioner = CountingPartitioner {
            registrations: AtomicUsize::new(0),
        };
        assert!(ensure_picture_handler(&partitioner));
        assert!(ensure_picture_handler(&partitioner));
        assert!(partitioner.registrations.load(Ordering::SeqCst) <= 1);
    }
}
