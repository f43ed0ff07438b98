//! One processing request: file in, element sequence or error report out.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::model::Element;

use super::{ensure_picture_handler, FileKind, PartitionParams, Partitioner, PartitionerRegistry, Strategy};

/// Options for processing an uploaded document.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub strategy: Strategy,

    /// Infer table structure
    pub include_tables: bool,

    /// Extract embedded images where the format allows it
    pub include_images: bool,

    /// OCR language hints
    pub languages: Vec<String>,
}

impl ProcessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the partitioning strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable or disable table structure inference.
    pub fn with_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }

    /// Set OCR language hints.
    pub fn with_languages<S: Into<String>>(mut self, languages: impl IntoIterator<Item = S>) -> Self {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            include_tables: true,
            include_images: true,
            languages: vec!["deu".to_string(), "eng".to_string()],
        }
    }
}

/// Result of one processing request.
///
/// A failed request carries no partial element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessReport {
    Success {
        elements: Vec<Element>,
        element_count: usize,
        /// Seconds spent partitioning
        processing_time: f64,
        method: String,
        image_support: bool,
        /// Image-like elements
        image_elements: usize,
        /// Image-like elements carrying a payload
        images_with_payload: usize,
    },
    #[serde(rename = "error")]
    Failure {
        error: String,
        processing_time: f64,
        method: String,
    },
}

impl ProcessReport {
    fn success(elements: Vec<Element>, started: Instant, method: String, image_support: bool) -> Self {
        let image_like: Vec<&Element> = elements
            .iter()
            .filter(|e| e.element_type.is_image_like())
            .collect();
        let images_with_payload = image_like
            .iter()
            .filter(|e| e.image_payload().is_some())
            .count();

        ProcessReport::Success {
            element_count: elements.len(),
            image_elements: image_like.len(),
            images_with_payload,
            processing_time: started.elapsed().as_secs_f64(),
            method,
            image_support,
            elements,
        }
    }

    fn failure(error: impl ToString, started: Instant, method: impl Into<String>) -> Self {
        ProcessReport::Failure {
            error: error.to_string(),
            processing_time: started.elapsed().as_secs_f64(),
            method: method.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessReport::Success { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            ProcessReport::Success { .. } => "success",
            ProcessReport::Failure { .. } => "error",
        }
    }

    /// Elements of a successful request.
    pub fn elements(&self) -> Option<&[Element]> {
        match self {
            ProcessReport::Success { elements, .. } => Some(elements),
            ProcessReport::Failure { .. } => None,
        }
    }

    pub fn into_elements(self) -> Option<Vec<Element>> {
        match self {
            ProcessReport::Success { elements, .. } => Some(elements),
            ProcessReport::Failure { .. } => None,
        }
    }

    /// Number of elements; zero for a failed request.
    pub fn element_count(&self) -> usize {
        match self {
            ProcessReport::Success { element_count, .. } => *element_count,
            ProcessReport::Failure { .. } => 0,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProcessReport::Success { .. } => None,
            ProcessReport::Failure { error, .. } => Some(error),
        }
    }

    pub fn processing_time(&self) -> f64 {
        match self {
            ProcessReport::Success { processing_time, .. }
            | ProcessReport::Failure { processing_time, .. } => *processing_time,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            ProcessReport::Success { method, .. } | ProcessReport::Failure { method, .. } => method,
        }
    }
}

const GENERIC_METHOD: &str = "local";

/// Method label and image support for the format-specific path.
fn tuned_method(kind: FileKind, picture_handler: bool) -> (String, bool) {
    match kind {
        FileKind::Pdf => ("pdf_tuned".to_string(), true),
        FileKind::Image => ("image_hi_res".to_string(), true),
        FileKind::Docx => ("docx_with_images".to_string(), true),
        FileKind::Pptx => (format!("pptx_picture_handler_{}", picture_handler), picture_handler),
        FileKind::Xlsx => ("xlsx_no_image_support".to_string(), false),
        FileKind::Other => (GENERIC_METHOD.to_string(), false),
    }
}

/// Partition a file.
///
/// The format-specific parameters are tried first; if the partitioner
/// rejects them, the request is retried once with generic parameters.
/// Failures never escape: they become a [`ProcessReport::Failure`].
pub fn process_file<P: AsRef<Path>>(
    registry: &PartitionerRegistry,
    path: P,
    options: &ProcessOptions,
) -> ProcessReport {
    let path = path.as_ref();
    let started = Instant::now();

    let partitioner = match registry.resolve(path) {
        Ok(p) => p,
        Err(e) => return ProcessReport::failure(e, started, GENERIC_METHOD),
    };
    let kind = match super::detect_kind(path) {
        Ok(kind) => kind,
        Err(e) => return ProcessReport::failure(e, started, GENERIC_METHOD),
    };

    info!("Processing {} as {} with {}", path.display(), kind, partitioner.name());

    let params = PartitionParams::for_kind(kind, options);
    if kind != FileKind::Other {
        match run_tuned(partitioner.as_ref(), path, kind, &params) {
            Ok((elements, method, image_support)) => {
                return ProcessReport::success(elements, started, method, image_support);
            }
            Err(e) => warn!("Tuned {} partitioning failed, retrying generic: {}", kind, e),
        }
    }

    match partitioner.partition(path, &PartitionParams::generic(options)) {
        Ok(elements) => {
            ProcessReport::success(elements, started, GENERIC_METHOD.to_string(), kind.supports_images())
        }
        Err(e) => {
            warn!("Partitioning {} failed: {}", path.display(), e);
            ProcessReport::failure(e, started, GENERIC_METHOD)
        }
    }
}

fn run_tuned(
    partitioner: &dyn Partitioner,
    path: &Path,
    kind: FileKind,
    params: &PartitionParams,
) -> Result<(Vec<Element>, String, bool)> {
    let picture_handler = params.requires_picture_handler && ensure_picture_handler(partitioner);
    if params.requires_picture_handler && !picture_handler {
        warn!("Picture handler not active; slide images will be missing");
    }

    let elements = partitioner.partition(path, params)?;
    let (method, image_support) = tuned_method(kind, picture_handler);
    Ok((elements, method, image_support))
}

/// Partition an in-memory upload.
///
/// The bytes are written to a scratch file named after `filename`'s
/// extension; the file is removed on every exit path.
pub fn process_bytes(
    registry: &PartitionerRegistry,
    data: &[u8],
    filename: &str,
    options: &ProcessOptions,
) -> ProcessReport {
    let started = Instant::now();

    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| FileKind::from_bytes(data).default_extension().to_string());

    let scratch = match write_scratch(data, &ext) {
        Ok(file) => file,
        Err(e) => return ProcessReport::failure(e, started, GENERIC_METHOD),
    };
    debug!("Wrote {} bytes of {} to {}", data.len(), filename, scratch.path().display());

    process_file(registry, scratch.path(), options)
}

fn write_scratch(data: &[u8], ext: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("ragpack-")
        .suffix(&format!(".{}", ext))
        .tempfile()?;
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}
