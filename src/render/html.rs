//! HTML export for element sequences.

use crate::extract::DEFAULT_IMAGE_MIME;
use crate::model::{Element, ElementType};

use super::{heading_level, HtmlOptions};

/// Convert elements to an HTML fragment.
pub fn to_html(elements: &[Element], options: &HtmlOptions) -> String {
    HtmlExporter::new(options.clone()).render(elements)
}

/// HTML exporter.
///
/// Output is a single `<div class="document-content">` wrapper with one
/// block per element. Element text is escaped unless
/// [`HtmlOptions::escape_text`] is disabled.
pub struct HtmlExporter {
    options: HtmlOptions,
}

impl HtmlExporter {
    /// Create a new HTML exporter.
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    /// Render elements to HTML.
    pub fn render(&self, elements: &[Element]) -> String {
        let mut parts = vec![r#"<div class="document-content">"#.to_string()];
        for element in elements {
            self.render_element(&mut parts, element);
        }
        parts.push("</div>".to_string());
        parts.join("\n")
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
            parts.push(r#"<hr style="border: 1px dashed #ccc; margin: 20px 0;" />"#.to_string());
            return;
        }

        let text = element.trimmed_text();
        if text.is_empty() {
            return;
        }

        parts.push(r#"<div class="element">"#.to_string());
        if self.options.include_metadata {
            if let Some(badges) = self.badges(element) {
                parts.push(badges);
            }
        }

        let display = self.apply_emphasis(self.escape(text), element);
        let depth = element.category_depth().unwrap_or(0);
        let indent = depth * 20;

        let body = match element.element_type {
            ElementType::Title => {
                let level = heading_level(depth);
                format!(
                    r#"<h{level} style="margin-left: {indent}px; color: #333;">{display}</h{level}>"#
                )
            }
            ElementType::ListItem => {
                format!(r#"<li style="margin-left: {indent}px;">{display}</li>"#)
            }
            ElementType::Header | ElementType::PageHeader => format!(
                r#"<div style="background: #f0f0f0; padding: 10px; border-left: 4px solid #007acc;"><strong>HEADER:</strong> {display}</div>"#
            ),
            ElementType::Footer | ElementType::PageFooter => format!(
                r#"<div style="background: #f9f9f9; padding: 10px; border-top: 1px solid #ddd; font-size: 0.9em;"><em>FOOTER:</em> {display}</div>"#
            ),
            ElementType::NarrativeText => {
                format!(r#"<p style="line-height: 1.6;">{display}</p>"#)
            }
            _ => format!("<p>{display}</p>"),
        };
        parts.push(body);

        if let Some(meta) = &element.metadata {
            let links = meta.links.all_links();
            if !links.is_empty() {
                let anchors: Vec<String> = links
                    .iter()
                    .map(|&(url, link_text)| {
                        format!(
                            r#"<a href="{}">{}</a>"#,
                            escape_html(url),
                            self.escape(link_text.unwrap_or(url))
                        )
                    })
                    .collect();
                parts.push(format!(
                    r#"<p class="links">Links: {}</p>"#,
                    anchors.join(", ")
                ));
            }
        }

        parts.push("</div>".to_string());
    }

    fn render_image(&self, parts: &mut Vec<String>, element: &Element) {
        let text = element.trimmed_text();
        let Some((data, mime)) = element.image_payload() else {
            if !text.is_empty() {
                parts.push(format!(
                    r#"<p style="color: #999; font-style: italic;">[Image without data: {}]</p>"#,
                    self.escape(text)
                ));
            }
            return;
        };

        parts.push(r#"<div class="image-container" style="margin: 20px 0; text-align: center;">"#.to_string());
        if self.options.include_metadata {
            if let Some(page) = element.page_number() {
                parts.push(format!(
                    r#"<div class="metadata-badge">Image - page {}</div>"#,
                    page
                ));
            }
        }

        let alt = if text.is_empty() {
            format!("Extracted image ({})", element.element_type)
        } else {
            text.to_string()
        };

        if self.options.embed_images {
            let mime = mime.unwrap_or(DEFAULT_IMAGE_MIME);
            parts.push(format!(
                r#"<img src="data:{};base64,{}" alt="{}" style="max-width: 100%; height: auto;" />"#,
                self.escape(mime),
                self.escape(data),
                escape_html(&alt)
            ));
            if !text.is_empty() {
                parts.push(format!(
                    r#"<p class="image-caption" style="font-style: italic; color: #666;">{}</p>"#,
                    self.escape(text)
                ));
            }
        } else {
            parts.push(format!(
                r#"<p style="color: #999; font-style: italic;">[Image: {}]</p>"#,
                self.escape(&alt)
            ));
        }
        parts.push("</div>".to_string());
    }

    fn render_table(&self, parts: &mut Vec<String>, element: &Element) {
        parts.push(r#"<div class="table-container" style="margin: 20px 0; overflow-x: auto;">"#.to_string());
        if self.options.include_metadata {
            if let Some(page) = element.page_number() {
                parts.push(format!(
                    r#"<div class="metadata-badge">Table - page {}</div>"#,
                    page
                ));
            }
        }
        match element.text_as_html() {
            Some(html) => parts.push(html.to_string()),
            None => parts.push(format!(
                r#"<pre style="background: #f5f5f5; padding: 10px;">{}</pre>"#,
                self.escape(element.trimmed_text())
            )),
        }
        parts.push("</div>".to_string());
    }

    fn badges(&self, element: &Element) -> Option<String> {
        let meta = element.metadata.as_ref()?;
        let mut badges = Vec::new();
        if let Some(page) = meta.page_number {
            badges.push(format!(r#"<span class="badge">Page {}</span>"#, page));
        }
        if let Some(langs) = meta.languages.as_ref().filter(|l| !l.is_empty()) {
            badges.push(format!(
                r#"<span class="badge">{}</span>"#,
                escape_html(&langs.join(", "))
            ));
        }
        if let Some(depth) = meta.hierarchy.category_depth {
            badges.push(format!(r#"<span class="badge">Level {}</span>"#, depth));
        }
        if badges.is_empty() {
            None
        } else {
            Some(format!(
                r#"<div class="metadata-badges">{}</div>"#,
                badges.join(" ")
            ))
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
            text = text.replacen(
                emphasized.as_str(),
                &format!("<strong>{}</strong>", emphasized),
                1,
            );
        }
        text
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_text {
            escape_html(text)
        } else {
            text.to_string()
        }
    }
}

/// Escape the characters that are significant in HTML text and attributes.
fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Link;

    #[test]
    fn test_title_heading() {
        let html = to_html(&[Element::title("Report").with_depth(0)], &HtmlOptions::plain());
        assert!(html.starts_with(r#"<div class="document-content">"#));
        assert!(html.contains(r#"<h2 style="margin-left: 0px; color: #333;">Report</h2>"#));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_nested_list_item_indent() {
        let html = to_html(&[Element::list_item("Item").with_depth(2)], &HtmlOptions::plain());
        assert!(html.contains(r#"<li style="margin-left: 40px;">Item</li>"#));
    }

    #[test]
    fn test_table_html_verbatim() {
        let table = "<table><tr><td>1</td></tr></table>";
        let html = to_html(&[Element::table("1", Some(table))], &HtmlOptions::plain());
        assert!(html.contains(table));
    }

    #[test]
    fn test_text_escaped_by_default() {
        let elements = [Element::narrative("<script>alert(1)</script>")];
        let html = to_html(&elements, &HtmlOptions::plain());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let raw = to_html(&elements, &HtmlOptions::plain().with_escape(false));
        assert!(raw.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_image_variants() {
        let elements = [Element::image("Logo", "aGk=", "image/gif").with_page(1)];

        let embedded = to_html(&elements, &HtmlOptions::with_images());
        assert!(embedded.contains(r#"src="data:image/gif;base64,aGk=""#));
        assert!(embedded.contains("Image - page 1"));
        assert!(embedded.contains("image-caption"));

        let plain = to_html(&elements, &HtmlOptions::plain());
        assert!(!plain.contains("aGk="));
        assert!(plain.contains("[Image: Logo]"));
    }

    #[test]
    fn test_image_source_escaped() {
        let elements = [Element::image("x", r#"aGk=" onerror="alert(1)"#, r#"image/png"><b"#)];
        let html = to_html(&elements, &HtmlOptions::with_images());
        assert!(!html.contains(r#"" onerror=""#));
        assert!(!html.contains("\"><b"));
        assert!(html.contains("data:image/png&quot;&gt;&lt;b;base64,aGk=&quot; onerror="));
    }

    #[test]
    fn test_links_and_page_break() {
        let mut linked = Element::narrative("Docs");
        linked.metadata_mut().links.links = Some(vec![Link::Url("https://a.example".into())]);
        let html = to_html(&[linked, Element::page_break()], &HtmlOptions::plain());
        assert!(html.contains(r#"<a href="https://a.example">https://a.example</a>"#));
        assert!(html.contains("<hr "));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a&b"c'"#), "a&amp;b&quot;c&#39;");
    }
}
