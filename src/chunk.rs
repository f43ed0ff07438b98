//! Size-bounded chunking of element sequences.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::model::{Element, ElementMetadata, ElementType};

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Pack consecutive elements up to the size limits
    #[default]
    Basic,
    /// Like `Basic`, but every title starts a new chunk
    ByTitle,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Basic => "basic",
            ChunkStrategy::ByTitle => "by_title",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = Error;

    /// Unknown names fall back to `Basic`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "by_title" | "title" => Ok(ChunkStrategy::ByTitle),
            _ => Ok(ChunkStrategy::Basic),
        }
    }
}

/// Chunking limits.
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    pub strategy: ChunkStrategy,

    /// Hard upper bound on chunk length in characters
    pub max_characters: usize,

    /// A chunk this long is closed before the next element is added
    pub new_after_n_chars: usize,

    /// Characters repeated between pieces of a split element
    pub overlap: usize,
}

impl ChunkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the hard and soft size limits.
    pub fn with_limits(mut self, max_characters: usize, new_after_n_chars: usize) -> Self {
        self.max_characters = max_characters;
        self.new_after_n_chars = new_after_n_chars;
        self
    }

    /// Set the overlap.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_characters == 0 {
            return Err(Error::Other("max_characters must be positive".to_string()));
        }
        if self.overlap >= self.max_characters {
            return Err(Error::Other(format!(
                "overlap ({}) must be smaller than max_characters ({})",
                self.overlap, self.max_characters
            )));
        }
        Ok(())
    }

    fn soft_limit(&self) -> usize {
        self.new_after_n_chars.min(self.max_characters)
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Basic,
            max_characters: 1000,
            new_after_n_chars: 800,
            overlap: 50,
        }
    }
}

/// One chunk of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `CompositeElement` for text, `Table`/`TableChunk` for tables
    #[serde(rename = "type")]
    pub element_type: ElementType,

    pub text: String,

    /// Page of the first contributing element
    pub page_number: Option<u32>,

    /// Indices of the contributing input elements
    pub orig_elements: Vec<usize>,

    /// Set on the second and later pieces of a split element
    pub is_continuation: bool,
}

impl Chunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Convert into an element for the exporters.
    pub fn to_element(&self) -> Element {
        let mut metadata = ElementMetadata::new();
        metadata.page_number = self.page_number;
        if self.is_continuation {
            metadata.is_continuation = Some(true);
        }
        Element::new(self.element_type.clone(), self.text.clone()).with_metadata(metadata)
    }
}

/// Result of a chunking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunks: Vec<Chunk>,
    pub chunk_count: usize,
    pub processing_time_ms: u64,
    pub strategy: ChunkStrategy,
}

/// Split elements into chunks.
pub fn chunk_elements(elements: &[Element], options: &ChunkOptions) -> Result<ChunkResult> {
    options.validate()?;
    let start = Instant::now();

    let mut chunker = Chunker::new(options);
    for (index, element) in elements.iter().enumerate() {
        chunker.add(index, element);
    }
    let chunks = chunker.finish();

    debug!(
        "Chunked {} elements into {} chunks ({})",
        elements.len(),
        chunks.len(),
        options.strategy
    );

    Ok(ChunkResult {
        chunk_count: chunks.len(),
        processing_time_ms: start.elapsed().as_millis() as u64,
        strategy: options.strategy,
        chunks,
    })
}

struct Chunker<'a> {
    options: &'a ChunkOptions,
    chunks: Vec<Chunk>,
    texts: Vec<&'a str>,
    indices: Vec<usize>,
    page_number: Option<u32>,
    len: usize,
}

impl<'a> Chunker<'a> {
    fn new(options: &'a ChunkOptions) -> Self {
        Self {
            options,
            chunks: Vec::new(),
            texts: Vec::new(),
            indices: Vec::new(),
            page_number: None,
            len: 0,
        }
    }

    fn add(&mut self, index: usize, element: &'a Element) {
        let text = element.trimmed_text();
        if text.is_empty() || element.element_type.is_page_break() {
            return;
        }

        if self.options.strategy == ChunkStrategy::ByTitle && element.element_type == ElementType::Title {
            self.flush();
        }

        let text_len = text.chars().count();

        if element.element_type.is_table_like() {
            self.flush();
            self.push_split(index, element, text, ElementType::Table, ElementType::TableChunk);
            return;
        }

        if text_len > self.options.max_characters {
            self.flush();
            self.push_split(
                index,
                element,
                text,
                ElementType::CompositeElement,
                ElementType::CompositeElement,
            );
            return;
        }

        if !self.texts.is_empty() {
            let combined = self.len + 2 + text_len;
            if combined > self.options.max_characters || self.len >= self.options.soft_limit() {
                self.flush();
            }
        }

        if self.texts.is_empty() {
            self.page_number = element.page_number();
            self.len = text_len;
        } else {
            self.len += 2 + text_len;
        }
        self.texts.push(text);
        self.indices.push(index);
    }

    fn push_split(
        &mut self,
        index: usize,
        element: &Element,
        text: &str,
        whole_type: ElementType,
        piece_type: ElementType,
    ) {
        let pieces = split_text(text, self.options.max_characters, self.options.overlap);
        let split = pieces.len() > 1;
        for (n, piece) in pieces.into_iter().enumerate() {
            self.chunks.push(Chunk {
                element_type: if split { piece_type.clone() } else { whole_type.clone() },
                text: piece,
                page_number: element.page_number(),
                orig_elements: vec![index],
                is_continuation: n > 0,
            });
        }
    }

    fn flush(&mut self) {
        if self.texts.is_empty() {
            return;
        }
        self.chunks.push(Chunk {
            element_type: ElementType::CompositeElement,
            text: self.texts.join("\n\n"),
            page_number: self.page_number.take(),
            orig_elements: std::mem::take(&mut self.indices),
            is_continuation: false,
        });
        self.texts.clear();
        self.len = 0;
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Split text into pieces of at most `max` characters.
///
/// Pieces break at whitespace in the second half of the window when
/// possible, and each piece after the first repeats the last `overlap`
/// characters of the previous window.
fn split_text(text: &str, max: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + max).min(total);
        if end < total {
            if let Some(ws) = (start + max / 2..end).rev().find(|&j| chars[j].is_whitespace()) {
                end = ws;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        if end >= total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_packs_small_elements() {
        let elements = vec![
            Element::title("Intro").with_page(1),
            Element::narrative("First paragraph."),
            Element::page_break(),
            Element::narrative("Second paragraph."),
        ];
        let result = chunk_elements(&elements, &ChunkOptions::default()).unwrap();

        assert_eq!(result.chunk_count, 1);
        let chunk = &result.chunks[0];
        assert_eq!(chunk.text, "Intro\n\nFirst paragraph.\n\nSecond paragraph.");
        assert_eq!(chunk.orig_elements, vec![0, 1, 3]);
        assert_eq!(chunk.page_number, Some(1));
        assert_eq!(result.strategy, ChunkStrategy::Basic);
    }

    #[test]
    fn test_by_title_starts_new_chunk() {
        let elements = vec![
            Element::title("One"),
            Element::narrative("Body one."),
            Element::title("Two"),
            Element::narrative("Body two."),
        ];
        let options = ChunkOptions::new().with_strategy(ChunkStrategy::ByTitle);
        let result = chunk_elements(&elements, &options).unwrap();

        assert_eq!(result.chunk_count, 2);
        assert_eq!(result.chunks[1].text, "Two\n\nBody two.");
    }

    #[test]
    fn test_soft_and_hard_limits() {
        let elements: Vec<Element> = (0..5).map(|_| Element::narrative("x".repeat(300))).collect();
        let result = chunk_elements(&elements, &ChunkOptions::default()).unwrap();

        // A fourth element would push the first chunk past 1000 characters.
        for chunk in &result.chunks {
            assert!(chunk.len() <= 1000);
        }
        assert_eq!(result.chunk_count, 2);
        assert_eq!(result.chunks[0].orig_elements, vec![0, 1, 2]);
    }

    #[test]
    fn test_tables_are_isolated() {
        let elements = vec![
            Element::narrative("Before"),
            Element::table("a b c", Some("<table></table>")),
            Element::narrative("After"),
        ];
        let result = chunk_elements(&elements, &ChunkOptions::default()).unwrap();

        assert_eq!(result.chunk_count, 3);
        assert_eq!(result.chunks[1].element_type, ElementType::Table);
        assert_eq!(result.chunks[1].text, "a b c");
    }

    #[test]
    fn test_oversize_element_split_with_overlap() {
        let elements = vec![Element::narrative("a".repeat(2500))];
        let result = chunk_elements(&elements, &ChunkOptions::default()).unwrap();

        let lengths: Vec<usize> = result.chunks.iter().map(Chunk::len).collect();
        assert_eq!(lengths, vec![1000, 1000, 600]);
        assert!(!result.chunks[0].is_continuation);
        assert!(result.chunks[1].is_continuation);
        assert_eq!(result.chunks[2].to_element().metadata.unwrap().is_continuation, Some(true));
    }

    #[test]
    fn test_split_prefers_whitespace() {
        let text = format!("{} {}", "a".repeat(700), "b".repeat(700));
        let pieces = split_text(&text, 1000, 50);
        assert_eq!(pieces[0], "a".repeat(700));
        assert!(pieces[1].ends_with(&"b".repeat(700)));
    }

    #[test]
    fn test_invalid_options() {
        let options = ChunkOptions::new().with_overlap(1000);
        assert!(chunk_elements(&[], &options).is_err());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("by_title".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::ByTitle);
        assert_eq!("unknown".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Basic);
    }
}
