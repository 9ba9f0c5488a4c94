//! The lookup-call token shapes the rendering layer consumes. The migration
//! and integration passes write them; the already-wrapped checks recognize
//! them.

pub const TEXT_CALL_OPEN: &str = "{getText";
pub const CALL_CLOSE: &str = ")}";

/// True when the text already carries any lookup call, for any of the three
/// content kinds. Used to keep every pass from wrapping twice.
pub fn contains_lookup_call(text: &str) -> bool {
    text.contains(TEXT_CALL_OPEN) || text.contains("getImage") || text.contains("getLink")
}

/// Collapse all whitespace runs (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', "\\'")
}

fn fallback_literal(text: &str) -> String {
    escape_single_quotes(&collapse_whitespace(text))
}

pub fn text_call(key: &str, fallback: &str) -> String {
    format!("{{getText('{key}', '{}')}}", fallback_literal(fallback))
}

/// Replacement for a full `>text<` span.
pub fn wrapped_tag_text(key: &str, fallback: &str) -> String {
    format!(">{}<", text_call(key, fallback))
}

/// Replacement for a full `attr="text"` span.
pub fn wrapped_attribute(attribute: &str, key: &str, fallback: &str) -> String {
    format!("{attribute}={}", text_call(key, fallback))
}

pub fn image_url_attribute(key: &str, url: &str) -> String {
    format!("src={{getImage('{key}').url || '{}'}}", escape_single_quotes(url))
}

pub fn image_alt_attribute(key: &str, alt: &str) -> String {
    format!("alt={{getImage('{key}').alt || '{}'}}", escape_single_quotes(alt))
}

pub fn link_href_attribute(key: &str, href: &str) -> String {
    format!("href={{getLink('{key}').href || '{}'}}", escape_single_quotes(href))
}

pub fn link_text_call(key: &str, text: &str) -> String {
    format!("{{getLink('{key}').text || '{}'}}", fallback_literal(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_call_collapses_and_escapes() {
        let call = text_call("hero_heading", "It's  a\n test");
        assert_eq!(call, "{getText('hero_heading', 'It\\'s a test')}");
    }

    #[test]
    fn wrapped_tag_text_keeps_delimiters() {
        assert_eq!(
            wrapped_tag_text("greeting", "Hi there"),
            ">{getText('greeting', 'Hi there')}<"
        );
    }

    #[test]
    fn wrapped_attribute_names_the_attribute() {
        assert_eq!(
            wrapped_attribute("placeholder", "enter_your_name", "Enter your name"),
            "placeholder={getText('enter_your_name', 'Enter your name')}"
        );
    }

    #[test]
    fn recognizes_all_three_call_kinds() {
        assert!(contains_lookup_call("{getText('k', 'v')}"));
        assert!(contains_lookup_call("src={getImage('k').url || '/a.png'}"));
        assert!(contains_lookup_call("href={getLink('k').href || '/'}"));
        assert!(!contains_lookup_call("plain text"));
    }

    #[test]
    fn image_and_link_attributes_use_fallback_form() {
        assert_eq!(
            image_url_attribute("team_photo", "/a.png"),
            "src={getImage('team_photo').url || '/a.png'}"
        );
        assert_eq!(
            link_href_attribute("link_home", "/home"),
            "href={getLink('link_home').href || '/home'}"
        );
    }
}
