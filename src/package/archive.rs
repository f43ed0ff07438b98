//! In-memory ZIP archive assembly.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::extract::ExtractedImage;

use super::manifest::ImageEntry;

/// Decode a base64 image payload.
///
/// Embedded whitespace and a leading `data:<mime>;base64,` prefix are accepted.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let data = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(cleaned)?)
}

/// Deflate-compressed archive written to memory.
pub(crate) struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

/// Counts of one image batch.
#[derive(Debug, Default)]
pub(crate) struct ImageBatch {
    pub entries: Vec<ImageEntry>,
    pub failed: usize,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    fn options() -> FileOptions {
        FileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    /// Add a file. A name already in the archive gets a numeric suffix.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<String> {
        let name = self.unique_name(name);
        self.zip.start_file(name.as_str(), Self::options())?;
        self.zip.write_all(bytes)?;
        self.names.insert(name.clone());
        Ok(name)
    }

    /// Add a UTF-8 text file.
    pub fn add_text(&mut self, name: &str, text: &str) -> Result<String> {
        self.add(name, text.as_bytes())
    }

    /// Decode and add images. Undecodable payloads are logged and counted.
    pub fn add_images<F>(&mut self, images: &[ExtractedImage], filename: F) -> Result<ImageBatch>
    where
        F: Fn(&ExtractedImage) -> String,
    {
        let mut batch = ImageBatch::default();
        for image in images {
            let bytes = match decode_payload(&image.base64) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        "Skipping image {} (element {}): {}",
                        image.short_hash(),
                        image.element_index,
                        e
                    );
                    batch.failed += 1;
                    continue;
                }
            };
            let name = self.add(&filename(image), &bytes)?;
            batch.entries.push(ImageEntry {
                filename: name,
                hash: image.hash.clone(),
                page: image.naming_page(),
                element_index: image.element_index,
                element_type: image.element_type.to_string(),
                mime_type: image.mime_type.clone(),
                size_bytes: bytes.len(),
            });
        }
        Ok(batch)
    }

    /// Finish the archive and return its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.names.contains(name) {
            return name.to_string();
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (name, String::new()),
        };
        (2..)
            .map(|n| format!("{}_{}{}", stem, n, ext))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_decode_payload_variants() {
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_payload("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_payload("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(decode_payload("not base64!").is_err());
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let mut writer = ArchiveWriter::new();
        assert_eq!(writer.add("a.png", b"1").unwrap(), "a.png");
        assert_eq!(writer.add("a.png", b"2").unwrap(), "a_2.png");
        assert_eq!(writer.add("a.png", b"3").unwrap(), "a_3.png");

        let bytes = writer.finish().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        let mut content = String::new();
        archive.by_name("a_2.png").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "2");
    }
}
