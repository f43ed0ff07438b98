//! File kind detection from extensions and magic bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// Document family, used to pick partitioning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Image,
    Other,
}

/// Extensions treated as raster images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "webp"];

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";
const BMP_MAGIC: &[u8] = b"BM";
const TIFF_LE_MAGIC: &[u8] = b"II*\x00";
const TIFF_BE_MAGIC: &[u8] = b"MM\x00*";

/// Bytes read from a file header for detection.
const HEADER_LEN: usize = 16;

impl FileKind {
    /// Detect from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "docx" => FileKind::Docx,
            "pptx" | "ppt" => FileKind::Pptx,
            "xlsx" | "xls" => FileKind::Xlsx,
            e if IMAGE_EXTENSIONS.contains(&e) => FileKind::Image,
            _ => FileKind::Other,
        }
    }

    /// Detect from the extension of a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileKind::Other)
    }

    /// Detect from file content.
    ///
    /// ZIP containers are inspected to tell the Office formats apart.
    pub fn from_bytes(data: &[u8]) -> Self {
        if data.starts_with(PDF_MAGIC) {
            FileKind::Pdf
        } else if data.starts_with(ZIP_MAGIC) {
            office_kind(data)
        } else if data.starts_with(PNG_MAGIC)
            || data.starts_with(JPEG_MAGIC)
            || data.starts_with(TIFF_LE_MAGIC)
            || data.starts_with(TIFF_BE_MAGIC)
            || is_webp(data)
            || (data.starts_with(BMP_MAGIC) && data.len() >= HEADER_LEN)
        {
            FileKind::Image
        } else {
            FileKind::Other
        }
    }

    /// Canonical extension used for scratch files.
    pub fn default_extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Pptx => "pptx",
            FileKind::Xlsx => "xlsx",
            FileKind::Image => "png",
            FileKind::Other => "bin",
        }
    }

    /// Whether the partitioner can deliver image payloads for this kind.
    pub fn supports_images(&self) -> bool {
        matches!(self, FileKind::Pdf | FileKind::Pptx | FileKind::Image)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Pptx => "pptx",
            FileKind::Xlsx => "xlsx",
            FileKind::Image => "image",
            FileKind::Other => "other",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

fn office_kind(data: &[u8]) -> FileKind {
    let Ok(mut archive) = ZipArchive::new(Cursor::new(data)) else {
        return FileKind::Other;
    };
    for i in 0..archive.len() {
        let Ok(entry) = archive.by_index(i) else {
            continue;
        };
        let name = entry.name();
        if name.starts_with("word/") {
            return FileKind::Docx;
        }
        if name.starts_with("ppt/") {
            return FileKind::Pptx;
        }
        if name.starts_with("xl/") {
            return FileKind::Xlsx;
        }
    }
    FileKind::Other
}

/// Detect the kind of a file, preferring its extension over its content.
pub fn detect_kind<P: AsRef<Path>>(path: P) -> crate::Result<FileKind> {
    let path = path.as_ref();
    let kind = FileKind::from_path(path);
    if kind != FileKind::Other {
        return Ok(kind);
    }

    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;
    Ok(FileKind::from_bytes(&data))
}
