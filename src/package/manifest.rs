//! Archive manifests.

use serde::{Deserialize, Serialize};

use crate::render::ImageDescriptionStats;

/// One image written into an archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Path inside the archive
    pub filename: String,
    pub hash: String,
    /// Page number, or the element index when the page is unknown
    pub page: u64,
    pub element_index: usize,
    pub element_type: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

fn find_by_hash<'a>(images: &'a [ImageEntry], hash: &str) -> Option<&'a str> {
    images
        .iter()
        .find(|img| img.hash == hash)
        .map(|img| img.filename.as_str())
}

/// Manifest of an image-only archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    pub source_document: String,
    pub export_date: String,
    /// Images found with a payload
    pub total_images: usize,
    pub images_exported: usize,
    /// Images whose payload could not be decoded
    pub images_failed: usize,
    pub images: Vec<ImageEntry>,
}

impl ImageManifest {
    /// Archive filename of the image with the given content hash.
    pub fn image_by_hash(&self, hash: &str) -> Option<&str> {
        find_by_hash(&self.images, hash)
    }
}

/// Where the import package keeps its parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub rag_file: String,
    pub images_folder: String,
    pub format: String,
    pub hash_algorithm: String,
    pub ready_for_import: bool,
}

impl Default for ImportInfo {
    fn default() -> Self {
        Self {
            rag_file: super::RAG_FILE.to_string(),
            images_folder: super::IMAGES_FOLDER.to_string(),
            format: "Knowledge base JSON lines (metadataAttributes + content)".to_string(),
            hash_algorithm: "MD5".to_string(),
            ready_for_import: true,
        }
    }
}

/// Manifest of a knowledge-base import package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportManifest {
    pub source_document: String,
    pub export_date: String,
    /// Number of RAG documents
    pub total_elements: usize,
    /// Images found with a payload
    pub total_images: usize,
    pub rag_format: String,
    pub images_included: usize,
    /// Images whose payload could not be decoded
    pub images_failed: usize,
    pub image_descriptions: Option<ImageDescriptionStats>,
    pub images: Vec<ImageEntry>,
    pub import_info: ImportInfo,
}

impl ImportManifest {
    /// Archive filename of the image with the given content hash.
    pub fn image_by_hash(&self, hash: &str) -> Option<&str> {
        find_by_hash(&self.images, hash)
    }
}
