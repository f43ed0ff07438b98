//! Loader for element JSON written by the partitioning library.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Result;
use crate::model::Element;

use super::{PartitionParams, Partitioner};

/// Elements read from a JSON array, with the indices that needed recovery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedElements {
    pub elements: Vec<Element>,
    /// Input indices whose metadata was unreadable; those elements are kept
    /// without metadata
    pub failed_metadata: Vec<usize>,
    /// Input indices that could not be read at all
    pub skipped: Vec<usize>,
}

impl LoadedElements {
    /// Read each array item on its own.
    ///
    /// An item whose metadata does not parse is kept with `metadata: None`;
    /// an item that still does not parse is skipped. Either way the
    /// remaining items are read.
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut loaded = Self::default();

        for (index, mut value) in values.into_iter().enumerate() {
            let err = match Element::deserialize(&value) {
                Ok(element) => {
                    loaded.elements.push(element);
                    continue;
                }
                Err(e) => e,
            };

            let had_metadata = value
                .as_object_mut()
                .and_then(|item| item.remove("metadata"))
                .is_some();
            match Element::deserialize(&value) {
                Ok(element) if had_metadata => {
                    warn!("Dropping unreadable metadata of element {}: {}", index, err);
                    loaded.elements.push(element);
                    loaded.failed_metadata.push(index);
                }
                _ => {
                    warn!("Skipping unreadable element {}: {}", index, err);
                    loaded.skipped.push(index);
                }
            }
        }

        loaded
    }
}

/// Parse an element JSON array, recovering per element.
pub fn load_elements_json(json: &str) -> Result<LoadedElements> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(LoadedElements::from_values(values))
}

/// Parse an element JSON array from a reader, recovering per element.
pub fn load_elements_reader<R: Read>(reader: R) -> Result<LoadedElements> {
    let values: Vec<Value> = serde_json::from_reader(reader)?;
    Ok(LoadedElements::from_values(values))
}

/// Parse an element JSON array.
///
/// Only a malformed document is an error; see [`LoadedElements`] for the
/// per-element recovery.
pub fn elements_from_json(json: &str) -> Result<Vec<Element>> {
    Ok(load_elements_json(json)?.elements)
}

/// Parse an element JSON array from a reader.
pub fn elements_from_reader<R: Read>(reader: R) -> Result<Vec<Element>> {
    Ok(load_elements_reader(reader)?.elements)
}

/// Partitioner for files that already hold partitioned elements.
#[derive(Debug, Clone, Default)]
pub struct JsonElementsPartitioner;

impl JsonElementsPartitioner {
    pub fn new() -> Self {
        Self
    }
}

impl Partitioner for JsonElementsPartitioner {
    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn name(&self) -> &str {
        "elements-json"
    }

    fn partition(&self, path: &Path, params: &PartitionParams) -> Result<Vec<Element>> {
        let reader = BufReader::new(File::open(path)?);
        let loaded = load_elements_reader(reader)?;
        debug!(
            "Loaded {} elements from {} ({} without metadata, {} skipped)",
            loaded.elements.len(),
            path.display(),
            loaded.failed_metadata.len(),
            loaded.skipped.len()
        );
        let mut elements = loaded.elements;
        if !params.include_page_breaks {
            elements.retain(|e| !e.element_type.is_page_break());
        }
        Ok(elements)
    }
}
