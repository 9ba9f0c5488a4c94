//! On-disk content records: one JSON file per component under the content
//! directory, stamped with a modification time on every save.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::extract::ContentRecord;
use crate::runtime::ResolvedPaths;

static COMPONENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

/// Component names become file names, so anything outside the safe set is
/// rejected before it touches the filesystem.
pub fn validate_component_name(name: &str) -> Result<()> {
    if name.is_empty() || !COMPONENT_NAME.is_match(name) {
        bail!("invalid component name: {name:?}");
    }
    Ok(())
}

pub fn record_path(paths: &ResolvedPaths, component: &str) -> Result<PathBuf> {
    validate_component_name(component)?;
    Ok(paths.content_dir.join(format!("{component}.json")))
}

pub fn record_exists(paths: &ResolvedPaths, component: &str) -> bool {
    record_path(paths, component)
        .map(|path| path.is_file())
        .unwrap_or(false)
}

pub fn load_record(paths: &ResolvedPaths, component: &str) -> Result<ContentRecord> {
    let path = record_path(paths, component)?;
    if !path.is_file() {
        bail!("no content record for component '{component}' at {}", path.display());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: ContentRecord = serde_json::from_str(&raw)
        .with_context(|| format!("malformed content record {}", path.display()))?;
    if record.component_name != component {
        bail!(
            "content record {} names component '{}', expected '{component}'",
            path.display(),
            record.component_name
        );
    }
    Ok(record)
}

/// Write a record, stamping `last_modified` with the current UTC time.
pub fn save_record(paths: &ResolvedPaths, record: &ContentRecord) -> Result<PathBuf> {
    let path = record_path(paths, &record.component_name)?;
    let mut stamped = record.clone();
    stamped.last_modified = now_rfc3339()?;

    fs::create_dir_all(&paths.content_dir)
        .with_context(|| format!("failed to create {}", paths.content_dir.display()))?;
    let mut serialized = serde_json::to_string_pretty(&stamped)?;
    serialized.push('\n');
    fs::write(&path, serialized)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format timestamp")
}
