//! The migration write path: excluded regions -> candidates -> heuristics ->
//! key generation -> edit batch -> rewrite. Runs as two sequential batches
//! per file (between-tag text, then attribute values) and is idempotent:
//! re-running over its own output plans zero edits.

use anyhow::Result;
use rand::Rng;
use serde::Serialize;

use crate::candidates::{self, CandidateKind};
use crate::heuristics;
use crate::keys::{ElementKind, KeyAllocator, KeyContext, generate_key};
use crate::regions;
use crate::rewrite::{Edit, apply_edits};
use crate::tokens;

const CONTENT_PROP_MARKER: &str = "export let content";

const INTEGRATION_SNIPPET: &str = "\n\t// CMS integration\n\texport let content = { texts: {}, images: {}, links: {} };\n\tconst getText = (key, fallback) => content.texts?.[key] || fallback;\n\tconst getImage = (key) => content.images?.[key] || {};\n\tconst getLink = (key) => content.links?.[key] || {};\n";

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Window size for the already-wrapped lookaround check.
    pub lookaround_window: usize,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            lookaround_window: regions::DEFAULT_LOOKAROUND_WINDOW,
        }
    }
}

/// One wrapped item, for the per-file change log.
#[derive(Debug, Clone, Serialize)]
pub struct WrappedItem {
    pub line: usize,
    pub key: String,
    pub attribute: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct MigrateOutcome {
    pub code: String,
    pub added_integration: bool,
    pub wrapped: Vec<WrappedItem>,
}

impl MigrateOutcome {
    pub fn changed(&self) -> bool {
        self.added_integration || !self.wrapped.is_empty()
    }
}

pub fn has_integration(code: &str) -> bool {
    code.contains(CONTENT_PROP_MARKER) && code.contains("getText")
}

/// Insert the content-prop helpers, inside the first `<script>` tag when one
/// exists, otherwise as a new leading script block.
pub fn add_integration(code: &str) -> String {
    if let Some(open_start) = code.find("<script")
        && let Some(relative_end) = code[open_start..].find('>')
    {
        let insert_at = open_start + relative_end + 1;
        let mut output = String::with_capacity(code.len() + INTEGRATION_SNIPPET.len());
        output.push_str(&code[..insert_at]);
        output.push_str(INTEGRATION_SNIPPET);
        output.push_str(&code[insert_at..]);
        return output;
    }
    format!("<script>{INTEGRATION_SNIPPET}</script>\n\n{code}")
}

/// Run the full migration over one file's text with a caller-supplied
/// randomness source for the degenerate key fallback.
pub fn migrate_markup_with_rng(
    code: &str,
    options: &MigrateOptions,
    rng: &mut impl Rng,
) -> Result<MigrateOutcome> {
    let mut output = code.to_string();
    let mut wrapped = Vec::new();

    let added_integration = if has_integration(&output) {
        false
    } else {
        output = add_integration(&output);
        true
    };

    output = wrap_tag_text(&output, options, rng, &mut wrapped)?;
    output = wrap_attributes(&output, options, rng, &mut wrapped)?;

    Ok(MigrateOutcome {
        code: output,
        added_integration,
        wrapped,
    })
}

/// Convenience wrapper using thread-local randomness.
pub fn migrate_markup(code: &str, options: &MigrateOptions) -> Result<MigrateOutcome> {
    migrate_markup_with_rng(code, options, &mut rand::thread_rng())
}

fn wrap_tag_text(
    code: &str,
    options: &MigrateOptions,
    rng: &mut impl Rng,
    log: &mut Vec<WrappedItem>,
) -> Result<String> {
    let excluded = regions::excluded_regions(code);
    let mut allocator = KeyAllocator::default();
    let mut edits = Vec::new();

    for candidate in candidates::tag_text_candidates(code, &excluded) {
        if !heuristics::is_migratable_text(&candidate.text) {
            continue;
        }
        if regions::inside_lookup_call(code, candidate.position, options.lookaround_window) {
            continue;
        }
        let context = KeyContext::plain(ElementKind::Text, log.len() + 1);
        let generated = generate_key(candidate.text.trim(), &context, rng);
        let key = allocator.allocate(&generated.key);
        edits.push(Edit {
            position: candidate.position,
            length: candidate.length,
            replacement: tokens::wrapped_tag_text(&key, &candidate.text),
        });
        log.push(WrappedItem {
            line: candidate.line,
            key,
            attribute: None,
            text: tokens::collapse_whitespace(&candidate.text),
        });
    }

    apply_edits(code, &edits)
}

fn wrap_attributes(
    code: &str,
    options: &MigrateOptions,
    rng: &mut impl Rng,
    log: &mut Vec<WrappedItem>,
) -> Result<String> {
    let excluded = regions::excluded_regions(code);
    let mut allocator = KeyAllocator::default();
    let mut edits = Vec::new();

    for candidate in candidates::attribute_candidates(code, &excluded) {
        let CandidateKind::Attribute(attribute) = candidate.kind else {
            continue;
        };
        if !heuristics::should_wrap_attribute(attribute, &candidate.text) {
            continue;
        }
        if regions::inside_lookup_call(code, candidate.position, options.lookaround_window) {
            continue;
        }
        let context = KeyContext::plain(ElementKind::Text, log.len() + 1);
        let generated = generate_key(&candidate.text, &context, rng);
        let key = allocator.allocate(&generated.key);
        edits.push(Edit {
            position: candidate.position,
            length: candidate.length,
            replacement: tokens::wrapped_attribute(attribute, &key, &candidate.text),
        });
        log.push(WrappedItem {
            line: candidate.line,
            key,
            attribute: Some(attribute.to_string()),
            text: tokens::collapse_whitespace(&candidate.text),
        });
    }

    apply_edits(code, &edits)
}
