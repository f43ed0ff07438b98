//! Markdown export for element sequences.

use crate::extract::{content_hash, DEFAULT_IMAGE_MIME};
use crate::model::{Element, ElementType};

use super::{heading_level, MarkdownOptions};

/// Convert elements to Markdown.
pub fn to_markdown(elements: &[Element], options: &MarkdownOptions) -> String {
    MarkdownExporter::new(options.clone()).render(elements)
}

/// Markdown exporter.
pub struct MarkdownExporter {
    options: MarkdownOptions,
}

impl MarkdownExporter {
    /// Create a new Markdown exporter.
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    /// Render elements to Markdown. Parts are separated by a blank line.
    pub fn render(&self, elements: &[Element]) -> String {
        let mut parts = Vec::new();
        for element in elements {
            self.render_element(&mut parts, element);
        }
        parts.join("\n\n")
    }

    fn render_element(&self, parts: &mut Vec<String>, element: &Element) {
        if element.element_type.is_image_like() {
            self.render_image(parts, element);
            return;
        }
        if element.element_type.is_table_like() {
            self.render_table(parts, element);
            return;
        }
        if element.element_type.is_page_break() {
            parts.push("---".to_string());
            return;
        }

        let text = element.trimmed_text();
        if text.is_empty() {
            return;
        }

        if self.options.include_metadata {
            if let Some(badges) = self.badges(element) {
                parts.push(badges);
            }
        }

        let mut display = self.escape(text);
        display = self.apply_emphasis(display, element);

        let depth = element.category_depth().unwrap_or(0);
        let links = element
            .metadata
            .as_ref()
            .map(|m| m.links.all_links())
            .unwrap_or_default();

        match element.element_type {
            ElementType::Title => {
                let hashes = "#".repeat(heading_level(depth));
                parts.push(format!("{} {}", hashes, display));
            }
            ElementType::ListItem => {
                let indent = "  ".repeat(depth as usize);
                parts.push(format!("{}- {}", indent, display));
            }
            ElementType::Header | ElementType::PageHeader => {
                parts.push(format!("> **HEADER:** {}", display));
            }
            ElementType::Footer | ElementType::PageFooter => {
                parts.push(format!("> *FOOTER:* {}", display));
            }
            _ => {
                for &(url, link_text) in &links {
                    let label = link_text.unwrap_or(url);
                    display.push_str(&format!(" [{}]({})", label, url));
                }
                parts.push(display);
            }
        }
    }

    fn render_image(&self, parts: &mut Vec<String>, element: &Element) {
        let text = element.trimmed_text();
        let Some((data, mime)) = element.image_payload() else {
            if !text.is_empty() {
                parts.push(format!("**[Image without data: {}]**", self.escape(text)));
            }
            return;
        };

        if self.options.include_metadata {
            if let Some(page) = element.page_number() {
                parts.push(format!("> Image - page {}", page));
            }
        }

        let alt = if text.is_empty() {
            format!("Extracted image ({})", element.element_type)
        } else {
            text.chars().take(self.options.alt_text_chars).collect()
        };
        let alt = self.escape(&alt);

        if self.options.embed_images {
            let mime = mime.unwrap_or(DEFAULT_IMAGE_MIME);
            parts.push(format!("![{}](data:{};base64,{})", alt, mime, data));
            if !text.is_empty() {
                parts.push(format!("*{}*", self.escape(text)));
            }
        } else {
            let hash = content_hash(data);
            parts.push(format!("**[Image: {} ({})]**", alt, &hash[..8]));
        }
    }

    fn render_table(&self, parts: &mut Vec<String>, element: &Element) {
        if self.options.include_metadata {
            if let Some(page) = element.page_number() {
                parts.push(format!("> Table - page {}", page));
            }
        }
        match element.text_as_html() {
            Some(html) => parts.push(html.to_string()),
            None => {
                let text = element.trimmed_text();
                if !text.is_empty() {
                    parts.push(format!("```\n{}\n```", text));
                }
            }
        }
    }

    fn badges(&self, element: &Element) -> Option<String> {
        let meta = element.metadata.as_ref()?;
        let mut badges = Vec::new();
        if let Some(page) = meta.page_number {
            badges.push(format!("Page {}", page));
        }
        if let Some(langs) = meta.languages.as_ref().filter(|l| !l.is_empty()) {
            badges.push(format!("Languages: {}", langs.join(", ")));
        }
        if let Some(depth) = meta.hierarchy.category_depth {
            badges.push(format!("Level {}", depth));
        }
        if badges.is_empty() {
            None
        } else {
            Some(format!("> {}", badges.join(" | ")))
        }
    }

    fn apply_emphasis(&self, mut text: String, element: &Element) -> String {
        let Some(contents) = element
            .metadata
            .as_ref()
            .and_then(|m| m.emphasis.emphasized_text_contents.as_ref())
        else {
            return text;
        };
        for emphasized in contents {
            let emphasized = self.escape(emphasized.trim());
            if emphasized.is_empty() || !text.contains(emphasized.as_str()) {
                continue;
            }
            text = text.replacen(emphasized.as_str(), &format!("**{}**", emphasized), 1);
        }
        text
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_text {
            escape_markdown_html(text)
        } else {
            text.to_string()
        }
    }
}

/// Escape characters that Markdown renderers pass through as raw HTML.
fn escape_markdown_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_title() {
        let elements = vec![Element::title("Report").with_depth(0)];
        assert_eq!(to_markdown(&elements, &MarkdownOptions::plain()), "## Report");
    }

    #[test]
    fn test_heading_level_capped() {
        let elements = vec![Element::title("Deep").with_depth(9)];
        assert_eq!(to_markdown(&elements, &MarkdownOptions::plain()), "###### Deep");
    }

    #[test]
    fn test_list_and_page_break() {
        let elements = vec![
            Element::list_item("First").with_depth(1),
            Element::page_break(),
            Element::narrative("After"),
        ];
        let md = to_markdown(&elements, &MarkdownOptions::plain());
        assert_eq!(md, "  - First\n\n---\n\nAfter");
    }

    #[test]
    fn test_table_html_verbatim() {
        let html = "<table><tr><td>a</td></tr></table>";
        let elements = vec![Element::table("a", Some(html))];
        assert_eq!(to_markdown(&elements, &MarkdownOptions::plain()), html);
    }

    #[test]
    fn test_table_without_html_is_fenced() {
        let elements = vec![Element::table("a b\nc d", None)];
        assert_eq!(
            to_markdown(&elements, &MarkdownOptions::plain()),
            "```\na b\nc d\n```"
        );
    }

    #[test]
    fn test_image_embedding() {
        let elements = vec![Element::image("Chart", "aGVsbG8=", "image/jpeg")];

        let embedded = to_markdown(&elements, &MarkdownOptions::new().with_embed_images(true));
        assert!(embedded.contains("![Chart](data:image/jpeg;base64,aGVsbG8=)"));
        assert!(embedded.contains("*Chart*"));

        let plain = to_markdown(&elements, &MarkdownOptions::plain());
        assert!(!plain.contains("aGVsbG8="));
        assert!(plain.starts_with("**[Image: Chart"));
    }

    #[test]
    fn test_escaping_toggle() {
        let elements = vec![Element::narrative("a <b> & c")];
        assert_eq!(
            to_markdown(&elements, &MarkdownOptions::plain()),
            "a &lt;b&gt; &amp; c"
        );
        assert_eq!(
            to_markdown(&elements, &MarkdownOptions::plain().with_escape(false)),
            "a <b> & c"
        );
    }

    #[test]
    fn test_header_footer_and_badges() {
        let elements = vec![
            Element::new(ElementType::Header, "Top").with_page(2),
            Element::new(ElementType::Footer, "Bottom"),
        ];
        let md = to_markdown(&elements, &MarkdownOptions::plain().with_metadata(true));
        assert_eq!(md, "> Page 2\n\n> **HEADER:** Top\n\n> *FOOTER:* Bottom");
    }

    #[test]
    fn test_emphasis() {
        let mut element = Element::narrative("Very important note");
        element.metadata_mut().emphasis.emphasized_text_contents = Some(vec!["important".into()]);
        assert_eq!(
            to_markdown(&[element], &MarkdownOptions::plain()),
            "Very **important** note"
        );
    }
}
