//! Element model for partitioned document content.
//!
//! Elements are produced once per file by the partitioning collaborator and
//! are read-only for every exporter. The only in-place change is the
//! optional text cleaning step.

mod element;
mod metadata;

pub use element::{Element, ElementType};
pub use metadata::{
    ElementMetadata, EmailInfo, Emphasis, Hierarchy, ImageInfo, Link, LinkInfo, SourceInfo,
};
