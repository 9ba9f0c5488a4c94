//! Classifies byte ranges of a markup file that the migration pass must never
//! touch: embedded script blocks, embedded style blocks, and positions already
//! inside a lookup call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tokens;

pub const DEFAULT_LOOKAROUND_WINDOW: usize = 100;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid regex"));

/// A span of source text excluded from candidate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRegion {
    pub start: usize,
    pub end: usize,
}

impl SourceRegion {
    /// The end is treated inclusively here; a candidate starting exactly at
    /// the region's end offset is still skipped. Long candidates that start
    /// inside a region but extend past it are skipped whole, and candidates
    /// that start after the region but overlap backwards are not. Both are
    /// pinned behaviors.
    pub fn covers(&self, position: usize) -> bool {
        position >= self.start && position <= self.end
    }
}

/// All fenced script/style spans of `text`.
pub fn excluded_regions(text: &str) -> Vec<SourceRegion> {
    let mut regions = Vec::new();
    for block in [&*SCRIPT_BLOCK, &*STYLE_BLOCK] {
        for found in block.find_iter(text) {
            regions.push(SourceRegion {
                start: found.start(),
                end: found.end(),
            });
        }
    }
    regions
}

pub fn in_excluded_region(regions: &[SourceRegion], position: usize) -> bool {
    regions.iter().any(|region| region.covers(position))
}

/// Bounded-lookaround check for positions already inside a `{getText(...)}`
/// call: an opener must appear within `window` bytes before the position and
/// a closer within `window` bytes after it. This is an approximation, not a
/// parser; a call whose opener or closer falls outside the window is treated
/// as not wrapped.
pub fn inside_lookup_call(text: &str, position: usize, window: usize) -> bool {
    let position = floor_char_boundary(text, position.min(text.len()));
    let start = floor_char_boundary(text, position.saturating_sub(window));
    let end = ceil_char_boundary(text, position.saturating_add(window).min(text.len()));

    let before = &text[start..position];
    let after = &text[position..end];
    before.contains(tokens::TEXT_CALL_OPEN) && after.contains(tokens::CALL_CLOSE)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_script_and_style_blocks() {
        let text = "<script>let x = 1;</script><p>Hi</p><style>.a { color: red; }</style>";
        let regions = excluded_regions(text);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].start, 0);
        assert_eq!(&text[regions[0].start..regions[0].end], "<script>let x = 1;</script>");
        assert_eq!(
            &text[regions[1].start..regions[1].end],
            "<style>.a { color: red; }</style>"
        );
    }

    #[test]
    fn script_block_matching_is_non_greedy() {
        let text = "<script>a</script><p>keep</p><script>b</script>";
        let regions = excluded_regions(text);
        assert_eq!(regions.len(), 2);
        let keep_position = text.find("keep").expect("present");
        assert!(!in_excluded_region(&regions, keep_position));
    }

    #[test]
    fn region_end_is_inclusive() {
        let region = SourceRegion { start: 4, end: 10 };
        assert!(region.covers(4));
        assert!(region.covers(10));
        assert!(!region.covers(11));
        assert!(!region.covers(3));
    }

    #[test]
    fn multiline_style_block_is_excluded() {
        let text = "<style>\n.a {\n  color: red;\n}\n</style>\n<p>Lorem ipsum dolor</p>";
        let regions = excluded_regions(text);
        assert_eq!(regions.len(), 1);
        let inside = text.find("color").expect("present");
        assert!(in_excluded_region(&regions, inside));
    }

    #[test]
    fn detects_position_inside_lookup_call() {
        let text = "<h1>{getText('hero_heading', 'Lorem ipsum dolor')}</h1>";
        let position = text.find("Lorem").expect("present");
        assert!(inside_lookup_call(text, position, DEFAULT_LOOKAROUND_WINDOW));
    }

    #[test]
    fn plain_text_is_not_inside_lookup_call() {
        let text = "<h1>Lorem ipsum dolor</h1>";
        let position = text.find("Lorem").expect("present");
        assert!(!inside_lookup_call(text, position, DEFAULT_LOOKAROUND_WINDOW));
    }

    #[test]
    fn opener_outside_window_is_not_recognized() {
        // The documented window-edge failure mode: padding pushes the opener
        // out of range, so the position reads as unwrapped.
        let padding = "x".repeat(150);
        let text = format!("{{getText('k', '{padding}yyy')}}");
        let position = text.find("yyy").expect("present");
        assert!(!inside_lookup_call(&text, position, DEFAULT_LOOKAROUND_WINDOW));
        assert!(inside_lookup_call(&text, position, 200));
    }

    #[test]
    fn window_clamps_to_char_boundaries() {
        let text = format!("{}{{getText('k', 'value')}}", "\u{e9}".repeat(60));
        let position = text.find("value").expect("present");
        // Must not panic on a window edge landing mid-char.
        let _ = inside_lookup_call(&text, position, DEFAULT_LOOKAROUND_WINDOW);
    }
}
