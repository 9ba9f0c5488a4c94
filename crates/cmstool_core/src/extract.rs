//! Builds a content record from component markup without modifying it: texts
//! from headings, paragraphs, buttons and known text-styled elements, images
//! from `<img>` tags, links from anchors.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::candidates;
use crate::heuristics;
use crate::keys::{ElementKind, KeyAllocator, KeyContext, semantic_key};
use crate::tokens;

/// Element classes the site's stylesheet treats as visible text.
const TEXT_STYLE_CLASSES: [&str; 5] = [
    "rt-text-style",
    "rt-button-text",
    "rt-dropdown-link",
    "rt-menu-font",
    "rt-contact-text",
];

/// Link-key special cases by href, in priority order.
const LINK_HREF_KEYS: [(&str, &str); 6] = [
    ("mailto:", "email_link"),
    ("tel:", "phone_link"),
    ("facebook", "social_facebook"),
    ("twitter", "social_twitter"),
    ("linkedin", "social_linkedin"),
    ("instagram", "social_instagram"),
];

/// Link-key nav words by visible text.
const LINK_TEXT_KEYS: [&str; 4] = ["home", "about", "contact", "service"];

static HEADINGS: Lazy<Vec<(u8, Regex)>> = Lazy::new(|| {
    (1..=6)
        .map(|level| {
            let pattern = format!("(?is)<h{level}[^>]*>(.*?)</h{level}>");
            (level, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

static PARAGRAPHS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid regex"));
static BUTTONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<button\b[^>]*>(.*?)</button>").expect("valid regex"));
static TEXT_STYLED: Lazy<Vec<Regex>> = Lazy::new(|| {
    TEXT_STYLE_CLASSES
        .iter()
        .map(|class| {
            let pattern = format!(
                r#"(?is)<(?:div|span|a|li)\b[^>]*class=["'][^"']*{class}[^"']*["'][^>]*>(.*?)</(?:div|span|a|li)>"#
            );
            Regex::new(&pattern).expect("valid regex")
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkContent {
    pub href: String,
    pub text: String,
}

/// One component's editable content. Serialized as the on-disk record; map
/// ordering is lexicographic so records diff cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub component_name: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, ImageContent>,
    #[serde(default)]
    pub links: BTreeMap<String, LinkContent>,
}

impl ContentRecord {
    pub fn empty(component_name: &str) -> Self {
        Self {
            component_name: component_name.to_string(),
            last_modified: String::new(),
            texts: BTreeMap::new(),
            images: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn total_entries(&self) -> usize {
        self.texts.len() + self.images.len() + self.links.len()
    }
}

/// Read-only extraction. `last_modified` is left empty; the store stamps it
/// on save.
pub fn extract_content(markup: &str, component_name: &str) -> ContentRecord {
    let mut record = ContentRecord::empty(component_name);
    extract_texts(markup, &mut record);
    extract_images(markup, &mut record);
    extract_links(markup, &mut record);
    record
}

fn usable_text(text: &str) -> bool {
    !text.is_empty()
        && !tokens::contains_lookup_call(text)
        && !heuristics::is_counter_number(text)
}

fn extract_texts(markup: &str, record: &mut ContentRecord) {
    let mut allocator = KeyAllocator::default();
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |record: &mut ContentRecord, context: &KeyContext, raw: &str| {
        let text = candidates::inner_text(raw);
        if !usable_text(&text) || !seen.insert(text.clone()) {
            return;
        }
        let base = semantic_key(&text, context).unwrap_or_else(|| context.fallback_key());
        let key = allocator.allocate(&base);
        record.texts.insert(key, text);
    };

    for (level, pattern) in HEADINGS.iter() {
        for (ordinal, found) in pattern.captures_iter(markup).enumerate() {
            let context = KeyContext::plain(ElementKind::Heading(*level), ordinal + 1);
            push(record, &context, &found[1]);
        }
    }

    for (ordinal, found) in PARAGRAPHS.captures_iter(markup).enumerate() {
        let context = KeyContext::plain(ElementKind::Paragraph, ordinal + 1);
        push(record, &context, &found[1]);
    }

    for (ordinal, found) in BUTTONS.captures_iter(markup).enumerate() {
        let context = KeyContext::plain(ElementKind::Button, ordinal + 1);
        push(record, &context, &found[1]);
    }

    let mut styled_ordinal = 0;
    for pattern in TEXT_STYLED.iter() {
        for found in pattern.captures_iter(markup) {
            styled_ordinal += 1;
            let context = KeyContext::plain(ElementKind::Text, styled_ordinal);
            push(record, &context, &found[1]);
        }
    }
}

fn image_key_from_alt(alt: &str) -> Option<String> {
    let normalized: String = alt
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed: String = normalized.chars().take(30).collect();
    let trimmed = trimmed.trim_matches('_').to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn extract_images(markup: &str, record: &mut ContentRecord) {
    let mut allocator = KeyAllocator::default();
    let mut seen_urls: HashSet<String> = HashSet::new();

    for (index, tag) in candidates::image_tags(markup).into_iter().enumerate() {
        if tag.tag.contains("getImage") {
            continue;
        }
        let Some(url) = tag.src else {
            continue;
        };
        if !seen_urls.insert(url.clone()) {
            continue;
        }
        let alt = tag.alt.unwrap_or_default();
        let base = image_key_from_alt(&alt).unwrap_or_else(|| format!("image_{}", index + 1));
        let key = allocator.allocate(&base);
        record.images.insert(key, ImageContent { url, alt });
    }
}

fn link_key(href: &str, text: &str) -> Option<String> {
    let href_lower = href.to_lowercase();
    for (needle, key) in LINK_HREF_KEYS {
        if href_lower.contains(needle) {
            return Some(key.to_string());
        }
        // x.com counts as twitter.
        if needle == "twitter" && href_lower.contains("x.com") {
            return Some(key.to_string());
        }
    }
    let text_lower = text.to_lowercase();
    LINK_TEXT_KEYS
        .iter()
        .find(|word| text_lower.contains(**word))
        .map(|word| format!("link_{word}"))
}

fn extract_links(markup: &str, record: &mut ContentRecord) {
    let mut allocator = KeyAllocator::default();
    let mut seen_hrefs: HashSet<String> = HashSet::new();

    for (index, anchor) in candidates::anchor_tags(markup).into_iter().enumerate() {
        if anchor.tag.contains("getLink") {
            continue;
        }
        let Some(href) = anchor.href else {
            continue;
        };
        if href == "#" || !seen_hrefs.insert(href.clone()) {
            continue;
        }
        if anchor.text.len() < 2 {
            continue;
        }
        let context = KeyContext::plain(ElementKind::Link, index + 1);
        let base = link_key(&href, &anchor.text)
            .or_else(|| semantic_key(&anchor.text, &context))
            .unwrap_or_else(|| context.fallback_key());
        let key = allocator.allocate(&base);
        record.links.insert(
            key,
            LinkContent {
                href,
                text: anchor.text,
            },
        );
    }
}
