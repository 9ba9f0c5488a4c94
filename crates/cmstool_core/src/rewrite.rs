use anyhow::{Result, bail};

/// One textual substitution, expressed against the original text's offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub position: usize,
    pub length: usize,
    pub replacement: String,
}

impl Edit {
    pub fn end(&self) -> usize {
        self.position + self.length
    }
}

/// Apply a batch of edits to `text`, highest offset first.
///
/// The whole batch is validated before anything is spliced: every span must
/// lie on char boundaries inside `text`, and no two spans may overlap. A
/// violation indicates a logic defect in the pass that planned the batch and
/// fails loudly; spans are never skipped or clamped.
pub fn apply_edits(text: &str, edits: &[Edit]) -> Result<String> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|left, right| right.position.cmp(&left.position));

    for edit in &ordered {
        let Some(end) = edit.position.checked_add(edit.length) else {
            bail!("edit span overflows: position {} + length {}", edit.position, edit.length);
        };
        if end > text.len() {
            bail!(
                "edit out of bounds: [{}, {}) exceeds text length {}",
                edit.position,
                end,
                text.len()
            );
        }
        if !text.is_char_boundary(edit.position) || !text.is_char_boundary(end) {
            bail!(
                "edit span [{}, {}) is not aligned to char boundaries",
                edit.position,
                end
            );
        }
    }

    // Sorted descending, so each edit must end at or before the next-higher
    // edit's start.
    for pair in ordered.windows(2) {
        if pair[1].end() > pair[0].position {
            bail!(
                "overlapping edits at positions {} and {}",
                pair[1].position,
                pair[0].position
            );
        }
    }

    let mut output = text.to_string();
    for edit in ordered {
        output.replace_range(edit.position..edit.end(), &edit.replacement);
    }
    Ok(output)
}
