//! Derives short, readable content keys from text spans.

use std::collections::HashMap;

use rand::Rng;

/// Named special cases, evaluated in order after the context hint: the first
/// entry whose keywords all appear in the meaningful tokens wins.
const KEYWORD_KEYS: [(&[&str], &str); 5] = [
    (&["get", "started"], "button_get_started"),
    (&["watch", "video"], "button_watch_video"),
    (&["learn", "more"], "button_learn_more"),
    (&["contact"], "button_contact"),
    (&["read", "more"], "link_read_more"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading(u8),
    Paragraph,
    Button,
    Text,
    Link,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading(1) => "h1",
            Self::Heading(2) => "h2",
            Self::Heading(3) => "h3",
            Self::Heading(4) => "h4",
            Self::Heading(5) => "h5",
            Self::Heading(_) => "h6",
            Self::Paragraph => "paragraph",
            Self::Button => "button",
            Self::Text => "text",
            Self::Link => "link",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    pub kind: ElementKind,
    pub ordinal: usize,
    pub hint: Option<&'a str>,
}

impl KeyContext<'_> {
    pub fn plain(kind: ElementKind, ordinal: usize) -> Self {
        Self {
            kind,
            ordinal,
            hint: None,
        }
    }

    /// Deterministic fallback for text that has no meaningful tokens.
    pub fn fallback_key(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.ordinal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    pub key: String,
    /// True when the key carries a random suffix because the text reduced to
    /// zero meaningful tokens. Callers that need determinism must substitute
    /// their own fallback instead of using a degenerate key.
    pub degenerate: bool,
}

/// Deterministic key derivation: lowercase, keep letters/digits/spaces, drop
/// tokens of length <= 2, then hint prefix > named special cases > joined
/// leading tokens. `None` when no meaningful tokens remain.
pub fn semantic_key(text: &str, context: &KeyContext) -> Option<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = normalized.split_whitespace().filter(|w| w.len() > 2).collect();
    if words.is_empty() {
        return None;
    }

    if let Some(hint) = context.hint {
        let joined = words.iter().take(3).copied().collect::<Vec<_>>().join("_");
        return Some(format!("{hint}_{joined}"));
    }

    match context.kind {
        ElementKind::Heading(1) => return Some("hero_heading".to_string()),
        ElementKind::Heading(2) if context.ordinal == 1 => {
            return Some("section_heading".to_string());
        }
        ElementKind::Heading(3) if context.ordinal == 1 => {
            return Some("subsection_heading".to_string());
        }
        _ => {}
    }

    for (keywords, key) in KEYWORD_KEYS {
        if keywords.iter().all(|keyword| words.contains(keyword)) {
            return Some((*key).to_string());
        }
    }

    Some(words.iter().take(3).copied().collect::<Vec<_>>().join("_"))
}

/// Full key generation including the degenerate random-suffix path.
pub fn generate_key(text: &str, context: &KeyContext, rng: &mut impl Rng) -> GeneratedKey {
    match semantic_key(text, context) {
        Some(key) => GeneratedKey {
            key,
            degenerate: false,
        },
        None => GeneratedKey {
            key: format!("text_{}", random_suffix(rng)),
            degenerate: true,
        },
    }
}

fn random_suffix(rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Per-invocation key uniqueness within one component's batch. First use of a
/// base key returns it untouched; collisions get `_2`, `_3`, ... suffixes.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    used: HashMap<String, usize>,
}

impl KeyAllocator {
    pub fn allocate(&mut self, base: &str) -> String {
        let count = {
            let entry = self.used.entry(base.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        if count == 1 {
            return base.to_string();
        }
        let mut suffix = count;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.used.contains_key(&candidate) {
                self.used.insert(candidate.clone(), 1);
                return candidate;
            }
            suffix += 1;
        }
    }
}
