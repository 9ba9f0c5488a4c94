//! Finds candidate spans: text between adjacent tag delimiters and the values
//! of the recognized attributes. No worthiness filtering happens here; that
//! is the heuristics layer's job.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::heuristics::ATTRIBUTE_RULES;
use crate::regions::{SourceRegion, in_excluded_region};
use crate::tokens;

static TAG_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r">([^<]+)<").expect("valid regex"));

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img[^>]*>").expect("valid regex"));
static SRC_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)src=["']([^"']+)["']"#).expect("valid regex"));
static ALT_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)alt=["']([^"']*)["']"#).expect("valid regex"));

static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("valid regex"));
static HREF_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href=["']([^"']+)["']"#).expect("valid regex"));

static NESTED_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static ATTRIBUTE_VALUES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    ATTRIBUTE_RULES
        .iter()
        .map(|(name, _)| {
            let pattern = format!(r#"(?i){name}=["']([^"']+)["']"#);
            (*name, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    TagText,
    Attribute(&'static str),
}

/// A span eligible for migration. `position`/`length` cover the full match
/// (including the surrounding `>`/`<` or the attribute name and quotes) so a
/// replacement can rewrite it wholesale; `text` is the raw inner value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub position: usize,
    pub length: usize,
    pub text: String,
    pub line: usize,
    pub kind: CandidateKind,
}

/// 1-based line number of a byte offset.
pub fn line_number(text: &str, position: usize) -> usize {
    text[..position.min(text.len())]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1
}

/// All `>text<` spans outside the excluded regions.
pub fn tag_text_candidates(text: &str, regions: &[SourceRegion]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for found in TAG_TEXT.captures_iter(text) {
        let Some(whole) = found.get(0) else { continue };
        if in_excluded_region(regions, whole.start()) {
            continue;
        }
        out.push(Candidate {
            position: whole.start(),
            length: whole.len(),
            text: found[1].to_string(),
            line: line_number(text, whole.start()),
            kind: CandidateKind::TagText,
        });
    }
    out
}

/// All recognized attribute-value spans outside the excluded regions.
pub fn attribute_candidates(text: &str, regions: &[SourceRegion]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (name, pattern) in ATTRIBUTE_VALUES.iter() {
        for found in pattern.captures_iter(text) {
            let Some(whole) = found.get(0) else { continue };
            if in_excluded_region(regions, whole.start()) {
                continue;
            }
            out.push(Candidate {
                position: whole.start(),
                length: whole.len(),
                text: found[1].to_string(),
                line: line_number(text, whole.start()),
                kind: CandidateKind::Attribute(name),
            });
        }
    }
    out
}

/// Visible text of an element body: nested tags stripped, whitespace
/// collapsed.
pub fn inner_text(raw: &str) -> String {
    tokens::collapse_whitespace(&NESTED_TAG.replace_all(raw, " "))
}

/// One `<img>` tag and its interesting attributes.
#[derive(Debug, Clone)]
pub struct ImageTag {
    pub position: usize,
    pub line: usize,
    pub tag: String,
    pub src: Option<String>,
    pub alt: Option<String>,
}

pub fn image_tags(text: &str) -> Vec<ImageTag> {
    IMG_TAG
        .find_iter(text)
        .map(|found| {
            let tag = found.as_str();
            ImageTag {
                position: found.start(),
                line: line_number(text, found.start()),
                tag: tag.to_string(),
                src: SRC_ATTR.captures(tag).map(|c| c[1].to_string()),
                alt: ALT_ATTR.captures(tag).map(|c| c[1].to_string()),
            }
        })
        .collect()
}

/// One `<a>...</a>` element. `inner_start`/`inner_end` delimit the body so a
/// rewrite can replace the visible text without touching the tags.
#[derive(Debug, Clone)]
pub struct AnchorTag {
    pub position: usize,
    pub line: usize,
    pub tag: String,
    pub href: Option<String>,
    pub text: String,
    pub inner_start: usize,
    pub inner_end: usize,
}

pub fn anchor_tags(text: &str) -> Vec<AnchorTag> {
    ANCHOR
        .captures_iter(text)
        .filter_map(|found| {
            let whole = found.get(0)?;
            let inner = found.get(1)?;
            Some(AnchorTag {
                position: whole.start(),
                line: line_number(text, whole.start()),
                tag: whole.as_str().to_string(),
                href: HREF_ATTR.captures(whole.as_str()).map(|c| c[1].to_string()),
                text: inner_text(inner.as_str()),
                inner_start: inner.start(),
                inner_end: inner.end(),
            })
        })
        .collect()
}
