//! Applies an existing content record back onto component markup: literal
//! values that match record entries become lookup calls keyed by the record.
//! Files that already carry the integration are left alone.

use anyhow::Result;
use regex::Regex;

use crate::candidates;
use crate::extract::ContentRecord;
use crate::heuristics::ATTRIBUTE_RULES;
use crate::migrate::{add_integration, has_integration};
use crate::regions::{self, in_excluded_region};
use crate::rewrite::{Edit, apply_edits};
use crate::tokens;

#[derive(Debug, Clone)]
pub struct IntegrateOutcome {
    pub code: String,
    pub replaced: usize,
    pub already_integrated: bool,
}

impl IntegrateOutcome {
    pub fn changed(&self) -> bool {
        !self.already_integrated
    }
}

/// Rewrite `code` against `record`. Returns early, untouched, when the file
/// already has the content prop and helpers.
pub fn integrate_markup(code: &str, record: &ContentRecord) -> Result<IntegrateOutcome> {
    if has_integration(code) {
        return Ok(IntegrateOutcome {
            code: code.to_string(),
            replaced: 0,
            already_integrated: true,
        });
    }

    let mut replaced = 0;
    let mut output = add_integration(code);
    output = replace_texts(&output, record, &mut replaced)?;
    output = replace_images(&output, record, &mut replaced)?;
    output = replace_links(&output, record, &mut replaced)?;

    Ok(IntegrateOutcome {
        code: output,
        replaced,
        already_integrated: false,
    })
}

/// Matches planned against the same text can collide (a value contained in
/// another, or two keys with the same value). Keep the earliest, drop the
/// rest, then hand a clean batch to the rewriter.
fn apply_non_overlapping(code: &str, mut edits: Vec<Edit>, replaced: &mut usize) -> Result<String> {
    edits.sort_by_key(|edit| (edit.position, edit.length));
    let mut kept: Vec<Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if kept.last().is_none_or(|last| edit.position >= last.end()) {
            kept.push(edit);
        }
    }
    *replaced += kept.len();
    apply_edits(code, &kept)
}

fn replace_texts(code: &str, record: &ContentRecord, replaced: &mut usize) -> Result<String> {
    let excluded = regions::excluded_regions(code);
    let mut edits = Vec::new();

    for (key, value) in &record.texts {
        let escaped = regex::escape(value);
        let tag_pattern = Regex::new(&format!(r">\s*{escaped}\s*<"))?;
        for found in tag_pattern.find_iter(code) {
            if in_excluded_region(&excluded, found.start()) {
                continue;
            }
            edits.push(Edit {
                position: found.start(),
                length: found.len(),
                replacement: tokens::wrapped_tag_text(key, value),
            });
        }
        for (attribute, _) in ATTRIBUTE_RULES {
            let attr_pattern = Regex::new(&format!(r#"(?i){attribute}=["']{escaped}["']"#))?;
            for found in attr_pattern.find_iter(code) {
                if in_excluded_region(&excluded, found.start()) {
                    continue;
                }
                edits.push(Edit {
                    position: found.start(),
                    length: found.len(),
                    replacement: tokens::wrapped_attribute(attribute, key, value),
                });
            }
        }
    }

    apply_non_overlapping(code, edits, replaced)
}

fn replace_images(code: &str, record: &ContentRecord, replaced: &mut usize) -> Result<String> {
    let excluded = regions::excluded_regions(code);
    let mut edits = Vec::new();

    for (key, image) in &record.images {
        let src_pattern = Regex::new(&format!(
            r#"(?i)src=["']{}["']"#,
            regex::escape(&image.url)
        ))?;
        for found in src_pattern.find_iter(code) {
            if in_excluded_region(&excluded, found.start()) {
                continue;
            }
            edits.push(Edit {
                position: found.start(),
                length: found.len(),
                replacement: tokens::image_url_attribute(key, &image.url),
            });
        }
        if image.alt.is_empty() {
            continue;
        }
        let alt_pattern = Regex::new(&format!(
            r#"(?i)alt=["']{}["']"#,
            regex::escape(&image.alt)
        ))?;
        for found in alt_pattern.find_iter(code) {
            if in_excluded_region(&excluded, found.start()) {
                continue;
            }
            edits.push(Edit {
                position: found.start(),
                length: found.len(),
                replacement: tokens::image_alt_attribute(key, &image.alt),
            });
        }
    }

    apply_non_overlapping(code, edits, replaced)
}

fn replace_links(code: &str, record: &ContentRecord, replaced: &mut usize) -> Result<String> {
    let excluded = regions::excluded_regions(code);
    let mut edits = Vec::new();
    let anchors = candidates::anchor_tags(code);

    for (key, link) in &record.links {
        let href_pattern = Regex::new(&format!(
            r#"(?i)href=["']{}["']"#,
            regex::escape(&link.href)
        ))?;
        for found in href_pattern.find_iter(code) {
            if in_excluded_region(&excluded, found.start()) {
                continue;
            }
            edits.push(Edit {
                position: found.start(),
                length: found.len(),
                replacement: tokens::link_href_attribute(key, &link.href),
            });
        }
        for anchor in &anchors {
            if anchor.tag.contains("getLink") || anchor.text != link.text {
                continue;
            }
            if in_excluded_region(&excluded, anchor.position) {
                continue;
            }
            edits.push(Edit {
                position: anchor.inner_start,
                length: anchor.inner_end - anchor.inner_start,
                replacement: tokens::link_text_call(key, &link.text),
            });
        }
    }

    apply_non_overlapping(code, edits, replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ImageContent, LinkContent, extract_content};

    #[test]
    fn replaces_known_text_with_lookup_calls() {
        let markup = "<h1>Lorem ipsum dolor sit amet</h1>";
        let record = extract_content(markup, "home");
        let outcome = integrate_markup(markup, &record).expect("integrate");
        assert!(
            outcome
                .code
                .contains("<h1>{getText('hero_heading', 'Lorem ipsum dolor sit amet')}</h1>")
        );
        assert_eq!(outcome.replaced, 1);
    }

    #[test]
    fn adds_the_script_block() {
        let markup = "<h1>Lorem ipsum dolor sit amet</h1>";
        let record = extract_content(markup, "home");
        let outcome = integrate_markup(markup, &record).expect("integrate");
        assert!(outcome.code.contains("export let content"));
        assert!(outcome.code.contains("const getLink"));
    }

    #[test]
    fn already_integrated_files_are_skipped() {
        let markup = "<script>export let content = {};\nconst getText = (k, f) => f;</script><h1>Lorem ipsum dolor sit amet</h1>";
        let record = extract_content("<h1>Lorem ipsum dolor sit amet</h1>", "home");
        let outcome = integrate_markup(markup, &record).expect("integrate");
        assert!(outcome.already_integrated);
        assert_eq!(outcome.code, markup);
        assert_eq!(outcome.replaced, 0);
    }

    #[test]
    fn replaces_attribute_values_matching_text_entries() {
        let markup = r#"<input placeholder="Enter your email">"#;
        let mut record = ContentRecord::empty("home");
        record
            .texts
            .insert("enter_your_email".to_string(), "Enter your email".to_string());
        let outcome = integrate_markup(markup, &record).expect("integrate");
        assert!(
            outcome
                .code
                .contains("placeholder={getText('enter_your_email', 'Enter your email')}")
        );
    }

    #[test]
    fn replaces_image_src_and_alt() {
        let markup = r#"<img src="/images/team.jpg" alt="Team photo">"#;
        let mut record = ContentRecord::empty("about");
        record.images.insert(
            "team_photo".to_string(),
            ImageContent {
                url: "/images/team.jpg".to_string(),
                alt: "Team photo".to_string(),
            },
        );
        let outcome = integrate_markup(markup, &record).expect("integrate");
        assert!(
            outcome
                .code
                .contains("src={getImage('team_photo').url || '/images/team.jpg'}")
        );
        assert!(
            outcome
                .code
                .contains("alt={getImage('team_photo').alt || 'Team photo'}")
        );
        assert_eq!(outcome.replaced, 2);
    }

    #[test]
    fn replaces_link_href_and_inner_text() {
        let markup = r#"<a href="/contact" class="nav">Contact us</a>"#;
        let mut record = ContentRecord::empty("nav");
        record.links.insert(
            "link_contact".to_string(),
            LinkContent {
                href: "/contact".to_string(),
                text: "Contact us".to_string(),
            },
        );
        let outcome = integrate_markup(markup, &record).expect("integrate");
        assert!(
            outcome
                .code
                .contains("href={getLink('link_contact').href || '/contact'}")
        );
        assert!(
            outcome
                .code
                .contains(">{getLink('link_contact').text || 'Contact us'}</a>")
        );
        assert!(outcome.code.contains(r#"class="nav""#));
    }

    #[test]
    fn literals_inside_script_blocks_are_not_replaced() {
        let markup = "<p>Sed feugiat neque magna</p>";
        let record = extract_content(markup, "home");
        // The inserted helpers quote nothing from the record, but a file with
        // its own script strings must keep them literal.
        let source =
            "<style>.x { content: 'Sed feugiat neque magna'; }</style><p>Sed feugiat neque magna</p>";
        let outcome = integrate_markup(source, &record).expect("integrate");
        assert!(outcome.code.contains("content: 'Sed feugiat neque magna';"));
        assert!(
            outcome
                .code
                .contains("<p>{getText('sed_feugiat_neque', 'Sed feugiat neque magna')}</p>")
        );
    }

    #[test]
    fn overlapping_matches_keep_the_earliest() {
        let mut record = ContentRecord::empty("home");
        record
            .texts
            .insert("a".to_string(), "Get in touch".to_string());
        record
            .texts
            .insert("b".to_string(), "Get in touch".to_string());
        let outcome = integrate_markup("<p>Get in touch</p>", &record).expect("integrate");
        assert_eq!(outcome.replaced, 1);
        assert!(outcome.code.contains("{getText('a', 'Get in touch')}"));
    }
}
