//! Simple text statistics over an element sequence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::Element;

/// Text statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Number of elements in the input, including empty ones
    pub total_elements: usize,

    /// Characters of all non-empty texts, each followed by one separator
    pub total_characters: usize,

    /// Whitespace-separated tokens
    pub total_words: usize,

    /// Count of `.`, `!` and `?`
    pub total_sentences: usize,

    /// Non-empty elements per type tag
    pub element_types: BTreeMap<String, usize>,

    /// Mean character length of non-empty texts
    pub average_element_length: f64,
}

/// Compute text statistics.
pub fn text_metrics(elements: &[Element]) -> TextMetrics {
    let mut metrics = TextMetrics {
        total_elements: elements.len(),
        ..Default::default()
    };

    let mut all_text = String::new();
    let mut lengths = Vec::new();

    for element in elements {
        let text = element.trimmed_text();
        if text.is_empty() {
            continue;
        }
        all_text.push_str(text);
        all_text.push(' ');
        lengths.push(text.chars().count());
        *metrics
            .element_types
            .entry(element.element_type.to_string())
            .or_insert(0) += 1;
    }

    metrics.total_characters = all_text.chars().count();
    metrics.total_words = all_text.split_whitespace().count();
    metrics.total_sentences = all_text
        .chars()
        .filter(|c| matches!(c, '.' | '!' | '?'))
        .count();
    if !lengths.is_empty() {
        metrics.average_element_length = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_metrics() {
        let elements = vec![
            Element::title("Intro"),
            Element::narrative("One sentence. Two!"),
            Element::page_break(),
        ];
        let metrics = text_metrics(&elements);

        assert_eq!(metrics.total_elements, 3);
        assert_eq!(metrics.total_words, 4);
        assert_eq!(metrics.total_sentences, 2);
        // "Intro " + "One sentence. Two! "
        assert_eq!(metrics.total_characters, 25);
        assert_eq!(metrics.element_types["Title"], 1);
        assert!(!metrics.element_types.contains_key("PageBreak"));
        assert!((metrics.average_element_length - 11.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_input() {
        let metrics = text_metrics(&[]);
        assert_eq!(metrics.total_elements, 0);
        assert_eq!(metrics.average_element_length, 0.0);
    }
}
