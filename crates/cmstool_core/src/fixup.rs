//! Repair passes for damage earlier migrations left behind: template-literal
//! fallbacks, multiline fallbacks, dropped closing braces, leftover `srcset`
//! attributes, and stale `alt` text. Each pass is idempotent on its own
//! output.

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::rewrite::{Edit, apply_edits};
use crate::tokens;

static BACKTICK_FALLBACK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"getText\('([^']+)',\s*`([^`]*)`\)").expect("valid regex"));

static UNCLOSED_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{getText\(([^)]*)\)<").expect("valid regex"));

// The quoted value may span lines; [^"] crosses newlines on its own.
static SRCSET_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s*srcset\s*=\s*"[^"]*""#).expect("valid regex"));

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<img[^>]*>").expect("valid regex"));
// Wrapped expressions first so a `{...}` value is never half-matched as text.
static ALT_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"alt=(?:\{[^}]*\}|"[^"]*"|'[^']*')"#).expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixupPass {
    /// `getText('k', `v`)` -> `getText('k', 'v')`.
    BacktickQuotes,
    /// Multiline template fallbacks collapsed onto one line.
    CollapseTemplates,
    /// `{getText(...)<` -> `{getText(...)}<`.
    ClosingBraces,
    /// Drops `srcset="..."` attributes, multiline values included.
    StripSrcset,
    /// Rewrites every `<img>` alt, wrapped or literal, to the component name.
    AltComponentName,
}

impl FixupPass {
    pub const ALL: [FixupPass; 5] = [
        FixupPass::BacktickQuotes,
        FixupPass::CollapseTemplates,
        FixupPass::ClosingBraces,
        FixupPass::StripSrcset,
        FixupPass::AltComponentName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BacktickQuotes => "backticks",
            Self::CollapseTemplates => "collapse",
            Self::ClosingBraces => "braces",
            Self::StripSrcset => "srcset",
            Self::AltComponentName => "alt",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "backticks" => Ok(Self::BacktickQuotes),
            "collapse" => Ok(Self::CollapseTemplates),
            "braces" => Ok(Self::ClosingBraces),
            "srcset" => Ok(Self::StripSrcset),
            "alt" => Ok(Self::AltComponentName),
            other => bail!(
                "unknown fixup pass: {other:?} (expected backticks, collapse, braces, srcset, or alt)"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixupOutcome {
    pub code: String,
    pub changes: usize,
}

pub fn apply_fixup(code: &str, pass: FixupPass, component_name: &str) -> Result<FixupOutcome> {
    let edits = match pass {
        FixupPass::BacktickQuotes => backtick_edits(code, false),
        FixupPass::CollapseTemplates => backtick_edits(code, true),
        FixupPass::ClosingBraces => closing_brace_edits(code),
        FixupPass::StripSrcset => srcset_edits(code),
        FixupPass::AltComponentName => alt_edits(code, component_name),
    };
    let changes = edits.len();
    let code = apply_edits(code, &edits)?;
    Ok(FixupOutcome { code, changes })
}

/// Both template-literal passes share the match; `collapse_only` keeps the
/// backticks and only flattens embedded newlines, while the full pass
/// re-quotes with single quotes.
fn backtick_edits(code: &str, collapse_only: bool) -> Vec<Edit> {
    let mut edits = Vec::new();
    for found in BACKTICK_FALLBACK.captures_iter(code) {
        let Some(whole) = found.get(0) else { continue };
        let key = &found[1];
        let value = &found[2];
        let replacement = if collapse_only {
            if !value.contains('\n') {
                continue;
            }
            format!(
                "getText('{key}', `{}`)",
                tokens::collapse_whitespace(value)
            )
        } else {
            format!(
                "getText('{key}', '{}')",
                tokens::escape_single_quotes(&tokens::collapse_whitespace(value))
            )
        };
        edits.push(Edit {
            position: whole.start(),
            length: whole.len(),
            replacement,
        });
    }
    edits
}

fn srcset_edits(code: &str) -> Vec<Edit> {
    SRCSET_ATTRIBUTE
        .find_iter(code)
        .map(|found| Edit {
            position: found.start(),
            length: found.len(),
            replacement: String::new(),
        })
        .collect()
}

/// One edit per `<img>` that carries an alt, skipping tags whose alt is
/// already the component name so reruns report zero changes.
fn alt_edits(code: &str, component_name: &str) -> Vec<Edit> {
    let replacement_value = format!("alt=\"{component_name}\"");
    let mut edits = Vec::new();
    for tag in IMG_TAG.find_iter(code) {
        let Some(alt) = ALT_ATTRIBUTE.find(tag.as_str()) else {
            continue;
        };
        if alt.as_str() == replacement_value {
            continue;
        }
        edits.push(Edit {
            position: tag.start() + alt.start(),
            length: alt.len(),
            replacement: replacement_value.clone(),
        });
    }
    edits
}

fn closing_brace_edits(code: &str) -> Vec<Edit> {
    UNCLOSED_CALL
        .captures_iter(code)
        .filter_map(|found| {
            let whole = found.get(0)?;
            Some(Edit {
                position: whole.start(),
                length: whole.len(),
                replacement: format!("{{getText({})}}<", &found[1]),
            })
        })
        .collect()
}
