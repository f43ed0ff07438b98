//! Image collection and content hashing.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::model::{Element, ElementType};

/// Number of payload characters fed into the content hash.
pub const HASH_SAMPLE_CHARS: usize = 1000;

/// MIME type assumed when an image element does not record one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Content hash of a base64 payload.
///
/// Only the first [`HASH_SAMPLE_CHARS`] characters are hashed, so the result
/// is a stable cross-reference key rather than an integrity check.
pub fn content_hash(base64: &str) -> String {
    let sample = match base64.char_indices().nth(HASH_SAMPLE_CHARS) {
        Some((end, _)) => &base64[..end],
        None => base64,
    };
    let digest = Md5::digest(sample.as_bytes());
    format!("{:x}", digest)
}

/// File extension for an image MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else if mime.contains("gif") {
        "gif"
    } else if mime.contains("webp") {
        "webp"
    } else {
        "png"
    }
}

/// An image payload found in the element sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Position of the source element
    pub element_index: usize,

    /// Type tag of the source element
    pub element_type: ElementType,

    /// Content hash of the payload
    pub hash: String,

    /// Base64 payload
    #[serde(skip_serializing)]
    pub base64: String,

    /// MIME type (defaults to PNG)
    pub mime_type: String,

    /// File extension derived from the MIME type
    pub extension: String,

    /// Page number, if known
    pub page_number: Option<u32>,

    /// Caption text of the element
    pub caption: String,
}

impl ExtractedImage {
    /// Page used for file naming; falls back to the element index.
    pub fn naming_page(&self) -> u64 {
        self.page_number
            .map(u64::from)
            .unwrap_or(self.element_index as u64)
    }

    /// First 8 characters of the hash.
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(8)]
    }

    /// `page_<NNN>_hash_<8>.<ext>`
    pub fn flat_filename(&self) -> String {
        format!(
            "page_{:03}_hash_{}.{}",
            self.naming_page(),
            self.short_hash(),
            self.extension
        )
    }

    /// `images/page_<NNN>_<8>.<ext>`
    pub fn package_filename(&self) -> String {
        format!(
            "images/page_{:03}_{}.{}",
            self.naming_page(),
            self.short_hash(),
            self.extension
        )
    }

    /// Payload as a data URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Collect every image-like element carrying a non-empty payload.
pub fn collect_images(elements: &[Element]) -> Vec<ExtractedImage> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.element_type.is_image_like())
        .filter_map(|(index, element)| {
            let (base64, mime) = element.image_payload()?;
            let mime_type = mime
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_IMAGE_MIME)
                .to_string();
            Some(ExtractedImage {
                element_index: index,
                element_type: element.element_type.clone(),
                hash: content_hash(base64),
                base64: base64.to_string(),
                extension: extension_for_mime(&mime_type).to_string(),
                mime_type,
                page_number: element.page_number(),
                caption: element.trimmed_text().to_string(),
            })
        })
        .collect()
}
