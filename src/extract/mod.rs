//! Side-artifact extraction: images, tables, contact data and text metrics.

mod contacts;
mod images;
mod metrics;
mod tables;

pub use contacts::{extract_contacts, ContactHit, ContactInfo};
pub use images::{
    collect_images, content_hash, extension_for_mime, ExtractedImage, DEFAULT_IMAGE_MIME,
    HASH_SAMPLE_CHARS,
};
pub use metrics::{text_metrics, TextMetrics};
pub use tables::{collect_tables, naive_csv, ExtractedTable};
