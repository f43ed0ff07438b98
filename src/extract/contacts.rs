//! Contact information extraction (emails, phone numbers, IPs, URLs).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::model::Element;

/// Characters of element text kept as context for each match.
const CONTEXT_CHARS: usize = 100;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[a-z0-9.\-+_]+@[a-z0-9.\-+_]+\.[a-z]+").expect("valid email regex")
    })
}

fn us_phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+?1[-. ]?)?\(?\b\d{3}\)?[-. ]?\d{3}[-. ]\d{4}\b(?: *x\d+)?")
            .expect("valid phone regex")
    })
}

fn ipv4_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
        )
        .expect("valid ip regex")
    })
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid url regex"))
}

/// One match with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactHit {
    /// Matched value
    pub value: String,
    /// Position of the source element
    pub element_index: usize,
    /// Type tag of the source element
    pub element_type: String,
    /// Leading characters of the element text
    pub context: String,
}

/// All contact information found in a sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<ContactHit>,
    pub phone_numbers: Vec<ContactHit>,
    pub ip_addresses: Vec<ContactHit>,
    pub urls: Vec<ContactHit>,
}

impl ContactInfo {
    /// Total number of hits across all categories.
    pub fn total(&self) -> usize {
        self.emails.len() + self.phone_numbers.len() + self.ip_addresses.len() + self.urls.len()
    }
}

/// Scan element texts for contact information.
pub fn extract_contacts(elements: &[Element]) -> ContactInfo {
    let mut info = ContactInfo::default();

    for (index, element) in elements.iter().enumerate() {
        let text = element.trimmed_text();
        if text.is_empty() {
            continue;
        }
        let context: String = text.chars().take(CONTEXT_CHARS).collect();
        let hit = |value: &str| ContactHit {
            value: value.to_string(),
            element_index: index,
            element_type: element.element_type.to_string(),
            context: context.clone(),
        };

        info.emails
            .extend(email_regex().find_iter(text).map(|m| hit(&m.as_str().to_lowercase())));
        info.phone_numbers
            .extend(us_phone_regex().find_iter(text).map(|m| hit(m.as_str().trim())));
        info.ip_addresses
            .extend(ipv4_regex().find_iter(text).map(|m| hit(m.as_str())));
        info.urls
            .extend(url_regex().find_iter(text).map(|m| hit(m.as_str())));
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_all_kinds() {
        let elements = vec![
            Element::narrative("Contact Jane.Doe@Example.com or call (555) 123-4567."),
            Element::narrative("Server at 192.168.1.20, docs at https://docs.example.org/guide."),
            Element::page_break(),
        ];
        let info = extract_contacts(&elements);

        assert_eq!(info.emails.len(), 1);
        assert_eq!(info.emails[0].value, "jane.doe@example.com");
        assert_eq!(info.phone_numbers.len(), 1);
        assert_eq!(info.ip_addresses[0].value, "192.168.1.20");
        assert_eq!(info.ip_addresses[0].element_index, 1);
        assert!(info.urls[0].value.starts_with("https://docs.example.org/guide"));
        assert_eq!(info.total(), 4);
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let info = extract_contacts(&[Element::narrative("version 999.1.1.1")]);
        assert!(info.ip_addresses.is_empty());
    }
}
