//! ZIP packaging of images and knowledge-base import bundles.
//!
//! Two archives are produced, both in memory:
//!
//! - an image archive with every decodable image payload, a `manifest.json`
//!   and a `README.md`;
//! - an import package with the RAG documents as JSON lines, a preview,
//!   the images under `images/`, a `manifest.json` and an `IMPORT_GUIDE.md`.
//!
//! Images are named by page and content hash so RAG documents can refer to
//! them through their `image_hash` attribute.

mod archive;
mod guide;
mod manifest;

pub use archive::decode_payload;
pub use manifest::{ImageEntry, ImageManifest, ImportInfo, ImportManifest};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::{collect_images, ExtractedImage};
use crate::model::Element;
use crate::outcome::Outcome;
use crate::render::{RagExporter, RagGrouping, RagOptions};
use crate::vision::{VisionClient, VisionOptions};

use archive::ArchiveWriter;

/// JSON-lines RAG documents inside an import package.
pub const RAG_FILE: &str = "rag_data.jsonl";

/// Pretty JSON preview of the leading RAG documents.
pub const PREVIEW_FILE: &str = "rag_data_preview.json";

/// Folder holding images inside an import package.
pub const IMAGES_FOLDER: &str = "images/";

pub const MANIFEST_FILE: &str = "manifest.json";
pub const README_FILE: &str = "README.md";
pub const IMPORT_GUIDE_FILE: &str = "IMPORT_GUIDE.md";

/// Options for archive packaging.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Source document name recorded in manifests and RAG documents
    pub source: String,

    /// Fixed export timestamp; the current time when unset
    pub export_date: Option<DateTime<Utc>>,

    /// Describe images in the RAG documents of an import package
    pub describe_images: bool,

    /// Vision service configuration
    pub vision: VisionOptions,

    /// Number of documents in `rag_data_preview.json`
    pub preview_limit: usize,
}

impl PackageOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Pin the export timestamp.
    pub fn with_export_date(mut self, date: DateTime<Utc>) -> Self {
        self.export_date = Some(date);
        self
    }

    /// Enable or disable image descriptions.
    pub fn with_image_descriptions(mut self, describe: bool) -> Self {
        self.describe_images = describe;
        self
    }

    /// Set vision service options.
    pub fn with_vision(mut self, vision: VisionOptions) -> Self {
        self.vision = vision;
        self
    }

    /// Set the preview size.
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    fn export_date(&self) -> String {
        self.export_date.unwrap_or_else(Utc::now).to_rfc3339()
    }

    fn rag_options(&self) -> RagOptions {
        RagOptions {
            source: self.source.clone(),
            grouping: RagGrouping::Element,
            describe_images: self.describe_images,
            vision: self.vision.clone(),
            preview_limit: self.preview_limit,
        }
    }
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            source: "document".to_string(),
            export_date: None,
            describe_images: false,
            vision: VisionOptions::default(),
            preview_limit: 5,
        }
    }
}

/// Image-only archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArchive {
    /// ZIP bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub total_images: usize,
    pub total_size_bytes: usize,
    pub manifest: ImageManifest,
}

/// Knowledge-base import package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPackage {
    /// ZIP bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub total_size_bytes: usize,
    pub rag_element_count: usize,
    pub images_count: usize,
    pub manifest: ImportManifest,
}

/// Export every image payload as a ZIP archive.
pub fn export_images(elements: &[Element], options: &PackageOptions) -> Outcome<ImageArchive> {
    Packager::new(options.clone()).export_images(elements)
}

/// Build a knowledge-base import package.
pub fn export_import_package(
    elements: &[Element],
    options: &PackageOptions,
) -> Outcome<ImportPackage> {
    Packager::new(options.clone()).export_import_package(elements)
}

/// Archive builder.
pub struct Packager {
    options: PackageOptions,
    vision: Option<VisionClient>,
}

impl Packager {
    /// Create a new packager.
    pub fn new(options: PackageOptions) -> Self {
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

    /// Export every image payload as a ZIP archive.
    ///
    /// Returns a warning when no element carries an image payload.
    pub fn export_images(&self, elements: &[Element]) -> Outcome<ImageArchive> {
        let images = collect_images(elements);
        if images.is_empty() {
            return Outcome::warning("No images with base64 data found");
        }
        self.build_image_archive(&images).into()
    }

    /// Build a knowledge-base import package.
    pub fn export_import_package(&self, elements: &[Element]) -> Outcome<ImportPackage> {
        self.build_import_package(elements).into()
    }

    fn build_image_archive(&self, images: &[ExtractedImage]) -> Result<ImageArchive> {
        let total = images.len();
        let export_date = self.options.export_date();

        let mut writer = ArchiveWriter::new();
        let batch = writer.add_images(images, |image| image.flat_filename())?;
        if batch.failed > 0 {
            warn!("{} of {} images could not be decoded", batch.failed, total);
        }

        let total_size_bytes = batch.entries.iter().map(|e| e.size_bytes).sum();
        let manifest = ImageManifest {
            source_document: self.options.source.clone(),
            export_date: export_date.clone(),
            total_images: total,
            images_exported: batch.entries.len(),
            images_failed: batch.failed,
            images: batch.entries,
        };

        writer.add_text(MANIFEST_FILE, &serde_json::to_string_pretty(&manifest)?)?;
        writer.add_text(
            README_FILE,
            &guide::images_readme(&self.options.source, &export_date, manifest.images_exported),
        )?;
        let bytes = writer.finish()?;

        info!(
            "Exported {} images ({} bytes) from {}",
            manifest.images_exported, total_size_bytes, self.options.source
        );

        Ok(ImageArchive {
            bytes,
            total_images: manifest.images_exported,
            total_size_bytes,
            manifest,
        })
    }

    fn build_import_package(&self, elements: &[Element]) -> Result<ImportPackage> {
        let mut exporter = RagExporter::new(self.options.rag_options());
        if self.options.describe_images {
            let vision = self
                .vision
                .clone()
                .unwrap_or_else(|| VisionClient::from_options(&self.options.vision));
            exporter = exporter.with_vision(vision);
        }
        let rag = exporter.export(elements)?;

        let images = collect_images(elements);
        let export_date = self.options.export_date();

        let mut writer = ArchiveWriter::new();
        writer.add_text(RAG_FILE, &rag.json_lines)?;
        writer.add_text(PREVIEW_FILE, &rag.json_preview)?;

        let batch = writer.add_images(&images, |image| image.package_filename())?;
        if batch.failed > 0 {
            warn!("{} of {} images could not be decoded", batch.failed, images.len());
        }

        let manifest = ImportManifest {
            source_document: self.options.source.clone(),
            export_date: export_date.clone(),
            total_elements: rag.document_count,
            total_images: images.len(),
            rag_format: "json_lines".to_string(),
            images_included: batch.entries.len(),
            images_failed: batch.failed,
            image_descriptions: rag.image_descriptions.clone(),
            images: batch.entries,
            import_info: ImportInfo::default(),
        };

        writer.add_text(MANIFEST_FILE, &serde_json::to_string_pretty(&manifest)?)?;
        writer.add_text(
            IMPORT_GUIDE_FILE,
            &guide::import_guide(
                &self.options.source,
                &export_date,
                rag.document_count,
                manifest.images_included,
                self.options.describe_images,
            ),
        )?;
        let bytes = writer.finish()?;

        info!(
            "Built import package for {}: {} documents, {} images",
            self.options.source, rag.document_count, manifest.images_included
        );

        Ok(ImportPackage {
            total_size_bytes: bytes.len(),
            rag_element_count: rag.document_count,
            images_count: manifest.images_included,
            manifest,
            bytes,
        })
    }
}
