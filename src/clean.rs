//! Element text cleaning.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::model::Element;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Options for element cleaning.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Rejoin paragraphs split by hard line breaks
    pub group_broken_paragraphs: bool,

    /// Collapse runs of whitespace into single spaces
    pub clean_extra_whitespace: bool,

    /// Drop elements whose text becomes empty. Page breaks, images with a
    /// payload and tables with HTML are always kept.
    pub drop_empty: bool,
}

impl CleanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitespace cleanup only.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: false,
            fix_ligatures: false,
            remove_replacement_char: false,
            group_broken_paragraphs: false,
            clean_extra_whitespace: true,
            drop_empty: false,
        }
    }

    /// Enable or disable paragraph grouping.
    pub fn with_paragraph_grouping(mut self, enabled: bool) -> Self {
        self.group_broken_paragraphs = enabled;
        self
    }

    /// Enable or disable dropping of emptied elements.
    pub fn with_drop_empty(mut self, enabled: bool) -> Self {
        self.drop_empty = enabled;
        self
    }
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_replacement_char: true,
            group_broken_paragraphs: true,
            clean_extra_whitespace: true,
            drop_empty: false,
        }
    }
}

/// Cleaned elements with before/after counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanResult {
    pub elements: Vec<Element>,
    pub original_count: usize,
    pub cleaned_count: usize,
    /// Elements whose text changed
    pub modified_count: usize,
}

/// Clean element texts with the given options.
pub fn clean_elements(elements: &[Element], options: &CleanOptions) -> CleanResult {
    CleanPipeline::new(options.clone()).clean_elements(elements)
}

/// Text cleanup pipeline applied to each element.
pub struct CleanPipeline {
    options: CleanOptions,
    ligature_map: Vec<(&'static str, &'static str)>,
    paragraph_split_regex: Regex,
    bullet_regex: Regex,
}

impl CleanPipeline {
    /// Create a new pipeline with the given options.
    pub fn new(options: CleanOptions) -> Self {
        Self {
            options,
            ligature_map: vec![
                ("\u{FB00}", "ff"),
                ("\u{FB01}", "fi"),
                ("\u{FB02}", "fl"),
                ("\u{FB03}", "ffi"),
                ("\u{FB04}", "ffl"),
                ("\u{FB05}", "st"),
                ("\u{FB06}", "st"),
            ],
            paragraph_split_regex: Regex::new(r"\n[ \t]*\n\s*").expect("valid paragraph regex"),
            bullet_regex: Regex::new(r"^\s*(?:[•●○■□◆◇▪▫►▻\-\*]|\d+[.)])\s").expect("valid bullet regex"),
        }
    }

    /// Clean every element. Element order is preserved.
    pub fn clean_elements(&self, elements: &[Element]) -> CleanResult {
        let mut cleaned = Vec::with_capacity(elements.len());
        let mut modified_count = 0;

        for element in elements {
            let text = self.clean_text(&element.text);
            if text != element.text {
                modified_count += 1;
            }
            if self.options.drop_empty && text.is_empty() && !carries_content(element) {
                continue;
            }
            let mut element = element.clone();
            element.text = text;
            cleaned.push(element);
        }

        debug!(
            "Cleaned {} elements into {} ({} modified)",
            elements.len(),
            cleaned.len(),
            modified_count
        );

        CleanResult {
            original_count: elements.len(),
            cleaned_count: cleaned.len(),
            modified_count,
            elements: cleaned,
        }
    }

    /// Clean one text.
    pub fn clean_text(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.options.normalize_unicode {
            result = result.nfc().collect();
        }

        if self.options.fix_ligatures {
            for (ligature, replacement) in &self.ligature_map {
                result = result.replace(ligature, replacement);
            }
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.group_broken_paragraphs {
            result = self.group_broken_paragraphs(&result);
            if self.options.clean_extra_whitespace {
                // Paragraph separators survive the collapse.
                result = result
                    .split(PARAGRAPH_SEPARATOR)
                    .map(clean_extra_whitespace)
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(PARAGRAPH_SEPARATOR);
            }
        } else if self.options.clean_extra_whitespace {
            result = clean_extra_whitespace(&result);
        }

        result.trim().to_string()
    }

    /// Rejoin paragraphs that were split by hard line breaks.
    ///
    /// Paragraphs are separated by blank lines. A paragraph made only of
    /// short lines (fewer than five words each) is kept line by line, bullet
    /// lists keep one item per line, everything else is joined with spaces.
    pub fn group_broken_paragraphs(&self, text: &str) -> String {
        let mut paragraphs = Vec::new();

        for paragraph in self.paragraph_split_regex.split(text) {
            let lines: Vec<&str> = paragraph
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            if lines.is_empty() {
                continue;
            }

            let bulleted = lines.iter().any(|line| self.bullet_regex.is_match(line));
            let all_short = lines.iter().all(|line| line.split_whitespace().count() < 5);

            if bulleted || all_short {
                paragraphs.extend(lines.iter().map(|line| line.to_string()));
            } else {
                paragraphs.push(lines.join(" "));
            }
        }

        paragraphs.join(PARAGRAPH_SEPARATOR)
    }
}

fn carries_content(element: &Element) -> bool {
    element.element_type.is_page_break()
        || element.image_payload().is_some()
        || element.text_as_html().is_some()
}

impl Default for CleanPipeline {
    fn default() -> Self {
        Self::new(CleanOptions::default())
    }
}

/// Replace non-breaking spaces and line breaks with spaces and collapse runs.
pub fn clean_extra_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
