//! Read-only drift audit: finds literal text, images, and links present in
//! the markup but absent from the component's content record.

use std::collections::HashSet;

use serde::Serialize;

use crate::candidates::{self, CandidateKind};
use crate::extract::ContentRecord;
use crate::heuristics;
use crate::regions;
use crate::tokens;

#[derive(Debug, Clone, Serialize)]
pub struct MissingText {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingAttribute {
    pub line: usize,
    pub attribute: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingImage {
    pub line: usize,
    pub url: String,
    pub alt: String,
    pub url_missing: bool,
    pub alt_missing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingLink {
    pub line: usize,
    pub href: String,
    pub text: String,
    pub href_missing: bool,
    pub text_missing: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MissingReport {
    pub texts: Vec<MissingText>,
    pub attributes: Vec<MissingAttribute>,
    pub images: Vec<MissingImage>,
    pub links: Vec<MissingLink>,
}

impl MissingReport {
    pub fn total(&self) -> usize {
        self.texts.len() + self.attributes.len() + self.images.len() + self.links.len()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Spans too trivial to count as drift.
fn ignorable(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || trimmed.len() < 3
        || heuristics::is_counter_number(trimmed)
        || tokens::contains_lookup_call(text)
}

/// Compare markup against a record by value: an item is missing when its
/// literal value appears nowhere in the record's corresponding map.
pub fn audit_markup(markup: &str, record: &ContentRecord) -> MissingReport {
    let mut report = MissingReport::default();
    let excluded = regions::excluded_regions(markup);

    // Anchor text lives in the links map, so it counts as known here too.
    let known_texts: HashSet<&str> = record
        .texts
        .values()
        .map(String::as_str)
        .chain(record.links.values().map(|l| l.text.as_str()))
        .collect();

    for candidate in candidates::tag_text_candidates(markup, &excluded) {
        if ignorable(&candidate.text) {
            continue;
        }
        let collapsed = tokens::collapse_whitespace(&candidate.text);
        if !known_texts.contains(collapsed.as_str()) {
            report.texts.push(MissingText {
                line: candidate.line,
                text: collapsed,
            });
        }
    }

    for candidate in candidates::attribute_candidates(markup, &excluded) {
        let CandidateKind::Attribute(attribute) = candidate.kind else {
            continue;
        };
        // src/alt on images are audited through the image set below.
        if attribute == "alt" {
            continue;
        }
        if ignorable(&candidate.text) {
            continue;
        }
        if !known_texts.contains(candidate.text.as_str()) {
            report.attributes.push(MissingAttribute {
                line: candidate.line,
                attribute: attribute.to_string(),
                text: candidate.text,
            });
        }
    }

    audit_images(markup, record, &mut report);
    audit_links(markup, record, &mut report);
    report
}

fn audit_images(markup: &str, record: &ContentRecord, report: &mut MissingReport) {
    let known_urls: HashSet<&str> = record.images.values().map(|i| i.url.as_str()).collect();
    let known_alts: HashSet<&str> = record
        .images
        .values()
        .map(|i| i.alt.as_str())
        .filter(|alt| !alt.is_empty())
        .collect();

    for found in candidates::image_tags(markup) {
        if found.tag.contains("getImage") {
            continue;
        }
        let url_missing = found
            .src
            .as_deref()
            .is_some_and(|url| !known_urls.contains(url));
        let alt_missing = found
            .alt
            .as_deref()
            .is_some_and(|alt| !alt.is_empty() && !known_alts.contains(alt));
        if url_missing || alt_missing {
            report.images.push(MissingImage {
                line: found.line,
                url: found.src.unwrap_or_default(),
                alt: found.alt.unwrap_or_default(),
                url_missing,
                alt_missing,
            });
        }
    }
}

fn audit_links(markup: &str, record: &ContentRecord, report: &mut MissingReport) {
    let known_hrefs: HashSet<&str> = record.links.values().map(|l| l.href.as_str()).collect();
    let known_texts: HashSet<&str> = record.links.values().map(|l| l.text.as_str()).collect();

    for found in candidates::anchor_tags(markup) {
        if found.tag.contains("getLink") {
            continue;
        }
        let Some(href) = found.href else {
            continue;
        };
        if href == "#" {
            continue;
        }
        let href_missing = !known_hrefs.contains(href.as_str());
        let text_missing = found.text.len() >= 2 && !known_texts.contains(found.text.as_str());
        if href_missing || text_missing {
            report.links.push(MissingLink {
                line: found.line,
                href,
                text: found.text,
                href_missing,
                text_missing,
            });
        }
    }
}
