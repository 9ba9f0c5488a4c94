//! Decides whether a candidate span is migratable content. The rules are
//! data tables, not control flow: extend the tables to change behavior.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tokens;

/// Boilerplate phrase corpus: templated Latin filler plus the site's common
/// UI microcopy. Case-insensitive; a candidate matching any entry is content.
const BOILERPLATE_PATTERNS: [&str; 26] = [
    r"lorem\s+ipsum",
    r"dolor\s+sit\s+amet",
    r"consectetur\s+adipiscing",
    r"elit.*proin",
    r"sed\s+feugiat",
    r"neque\s+magna",
    r"ornare.*vulputate",
    r"malesuada\s+tempor",
    r"eget\s+auctor",
    r"your\s+name",
    r"enter\s+your",
    r"email.*address",
    r"phone.*number",
    r"^submit",
    r"^inquire",
    r"please\s+wait",
    r"thank\s+you.*received",
    r"oops.*went\s+wrong",
    r"something\s+went\s+wrong",
    r"i\s+agree\s+to",
    r"terms\s+and\s+conditions",
    r"send\s+a\s+message",
    r"contact\s+us",
    r"get\s+in\s+touch",
    r"main\s+office",
    r"phone\s+no",
];

/// Recognized attribute names and the minimum value length (exclusive) each
/// one must exceed before its value is wrapped.
pub const ATTRIBUTE_RULES: [(&str, usize); 5] = [
    ("placeholder", 3),
    ("value", 3),
    ("title", 5),
    ("data-wait", 3),
    ("alt", 3),
];

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    BOILERPLATE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("valid regex"))
        .collect()
});

static ADDRESS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+\s+[a-z]+,\s*[a-z]+\s+\d{5}").expect("valid regex"));
static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\d{3}\)\s*\d{3}[- ]?\d{4}").expect("valid regex"));
static COUNTER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+[KM%]?$").expect("valid regex"));
static IDENTIFIER_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9_-]+$").expect("valid regex"));

pub fn attribute_minimum(attribute: &str) -> Option<usize> {
    ATTRIBUTE_RULES
        .iter()
        .find(|(name, _)| *name == attribute)
        .map(|(_, minimum)| *minimum)
}

/// Counter/animation numbers are never content: a single digit, or up to four
/// characters of digits with an optional K/M/% suffix.
pub fn is_counter_number(text: &str) -> bool {
    if text.len() == 1 && text.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    text.len() <= 4 && COUNTER_SHAPE.is_match(text)
}

pub fn is_boilerplate(text: &str) -> bool {
    BOILERPLATE.iter().any(|pattern| pattern.is_match(text))
}

/// Is this between-tag text worth migrating?
pub fn is_migratable_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < 5 {
        return false;
    }
    if tokens::contains_lookup_call(text) {
        return false;
    }
    if is_counter_number(trimmed) {
        return false;
    }
    if is_boilerplate(text) {
        return true;
    }
    ADDRESS_LINE.is_match(text) || PHONE_NUMBER.is_match(text)
}

/// Is this attribute value worth wrapping? Boilerplate always qualifies; the
/// per-attribute length minimum decides the rest, except that `value` never
/// wraps an identifier-only token on the length path alone (IDs and machine
/// values stay literal).
pub fn should_wrap_attribute(attribute: &str, text: &str) -> bool {
    if tokens::contains_lookup_call(text) {
        return false;
    }
    if is_counter_number(text.trim()) {
        return false;
    }
    if is_migratable_text(text) {
        return true;
    }
    let Some(minimum) = attribute_minimum(attribute) else {
        return false;
    };
    if attribute == "value" && IDENTIFIER_ONLY.is_match(text) {
        return false;
    }
    text.len() > minimum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lorem_ipsum_is_migratable() {
        assert!(is_migratable_text("Lorem ipsum dolor sit amet"));
        assert!(is_migratable_text("Sed feugiat neque magna"));
    }

    #[test]
    fn ui_microcopy_is_migratable() {
        assert!(is_migratable_text("Enter your email address"));
        assert!(is_migratable_text("Get in touch"));
        assert!(is_migratable_text("I agree to the Terms and Conditions"));
    }

    #[test]
    fn address_and_phone_shapes_are_migratable() {
        assert!(is_migratable_text("123 Main, Springfield 62704"));
        assert!(is_migratable_text("(555) 867-5309"));
    }

    #[test]
    fn short_text_is_rejected() {
        assert!(!is_migratable_text("Hi"));
        assert!(!is_migratable_text("  ab  "));
    }

    #[test]
    fn generic_prose_without_known_patterns_is_rejected() {
        assert!(!is_migratable_text("The quick brown fox jumps"));
    }

    #[test]
    fn already_wrapped_text_is_rejected() {
        assert!(!is_migratable_text("{getText('k', 'Lorem ipsum dolor')}"));
    }

    #[test]
    fn counter_numbers_are_never_candidates() {
        assert!(is_counter_number("5"));
        assert!(is_counter_number("42%"));
        assert!(is_counter_number("10K"));
        assert!(is_counter_number("999M"));
        assert!(!is_counter_number("12345"));
        assert!(!is_counter_number("42 items"));
    }

    #[test]
    fn counter_number_is_not_migratable_regardless_of_length_rule() {
        assert!(!is_migratable_text("5"));
        assert!(!is_migratable_text("42%"));
        assert!(!should_wrap_attribute("placeholder", "42%"));
    }

    #[test]
    fn placeholder_threshold() {
        assert!(should_wrap_attribute("placeholder", "Your full name"));
        assert!(!should_wrap_attribute("placeholder", "abc"));
    }

    #[test]
    fn value_rejects_identifier_only_tokens() {
        assert!(!should_wrap_attribute("value", "hero-cta_01"));
        assert!(!should_wrap_attribute("value", "HeroCta01"));
        assert!(should_wrap_attribute("value", "Send a message"));
    }

    #[test]
    fn value_boilerplate_wins_over_identifier_shape() {
        assert!(should_wrap_attribute("value", "submit-btn"));
        assert!(should_wrap_attribute("value", "inquire"));
    }

    #[test]
    fn title_uses_longer_threshold() {
        assert!(!should_wrap_attribute("title", "Close"));
        assert!(should_wrap_attribute("title", "Close the dialog"));
    }

    #[test]
    fn boilerplate_attribute_value_qualifies_below_threshold_shape() {
        assert!(should_wrap_attribute("value", "Submit"));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        assert!(!should_wrap_attribute("data-id", "Some long enough text"));
    }

    #[test]
    fn already_wrapped_attribute_is_rejected() {
        assert!(!should_wrap_attribute("alt", "{getText('k', 'Photo')}"));
        assert!(!should_wrap_attribute("alt", "getImage key expression"));
    }
}
