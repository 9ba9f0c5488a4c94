//! Locates component markup files under the project's components directory
//! and summarizes their migration state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::CmsConfig;
use crate::migrate::has_integration;
use crate::runtime::ResolvedPaths;
use crate::store::record_exists;

/// Resolve a bare component name to its file by walking the configured folder
/// order. First hit wins.
pub fn find_component_path(
    paths: &ResolvedPaths,
    config: &CmsConfig,
    name: &str,
) -> Option<PathBuf> {
    let filename = format!("{name}.{}", config.extension());
    for folder in config.folders() {
        let candidate = paths.components_dir.join(&folder).join(&filename);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    // Components that live directly under the components root.
    let flat = paths.components_dir.join(&filename);
    flat.is_file().then_some(flat)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScannedComponent {
    pub name: String,
    pub folder: String,
    pub relative_path: String,
    pub bytes: u64,
    pub integrated: bool,
    pub has_record: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub total: usize,
    pub integrated: usize,
    pub with_record: usize,
    pub by_folder: BTreeMap<String, usize>,
}

/// All component files under the components directory, sorted by relative
/// path.
pub fn scan_components(
    paths: &ResolvedPaths,
    config: &CmsConfig,
) -> Result<Vec<ScannedComponent>> {
    let mut out = Vec::new();
    if !paths.components_dir.exists() {
        return Ok(out);
    }

    let extension = config.extension();
    for entry in WalkDir::new(&paths.components_dir).follow_links(false) {
        let entry = entry
            .with_context(|| format!("failed to walk {}", paths.components_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        out.push(read_scanned_component(paths, path)?);
    }
    out.sort_by(|left, right| left.relative_path.cmp(&right.relative_path));
    Ok(out)
}

pub fn scan_stats(paths: &ResolvedPaths, config: &CmsConfig) -> Result<ScanStats> {
    let components = scan_components(paths, config)?;
    let mut by_folder: BTreeMap<String, usize> = BTreeMap::new();
    let mut integrated = 0usize;
    let mut with_record = 0usize;

    for component in &components {
        *by_folder.entry(component.folder.clone()).or_insert(0) += 1;
        if component.integrated {
            integrated += 1;
        }
        if component.has_record {
            with_record += 1;
        }
    }

    Ok(ScanStats {
        total: components.len(),
        integrated,
        with_record,
        by_folder,
    })
}

/// Paths for batch commands running with `--all`.
pub fn all_component_files(paths: &ResolvedPaths, config: &CmsConfig) -> Result<Vec<PathBuf>> {
    Ok(scan_components(paths, config)?
        .into_iter()
        .map(|component| paths.components_dir.join(component.relative_path))
        .collect())
}

fn read_scanned_component(paths: &ResolvedPaths, path: &Path) -> Result<ScannedComponent> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;

    let relative = path
        .strip_prefix(&paths.components_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let folder = relative
        .rsplit_once('/')
        .map(|(parent, _)| parent.to_string())
        .unwrap_or_default();

    Ok(ScannedComponent {
        integrated: has_integration(&content),
        has_record: record_exists(paths, &name),
        name,
        folder,
        relative_path: relative,
        bytes: metadata.len(),
    })
}
