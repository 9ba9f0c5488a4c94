use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXTENSION: &str = "svelte";

/// Component folders searched in order when a name is given without a path.
pub const DEFAULT_COMPONENT_FOLDERS: [&str; 10] = [
    "home",
    "shared",
    "about",
    "team",
    "contact",
    "pricing",
    "service-one",
    "service-two",
    "home-one",
    "home-two",
];

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct CmsConfig {
    #[serde(default)]
    pub components: ComponentsSection,
    #[serde(default)]
    pub migration: MigrationSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ComponentsSection {
    pub folders: Option<Vec<String>>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct MigrationSection {
    pub lookaround_window: Option<usize>,
}

impl CmsConfig {
    /// Folder search order: config > built-in defaults.
    pub fn folders(&self) -> Vec<String> {
        match &self.components.folders {
            Some(folders) if !folders.is_empty() => folders.clone(),
            _ => DEFAULT_COMPONENT_FOLDERS
                .iter()
                .map(|f| (*f).to_string())
                .collect(),
        }
    }

    pub fn extension(&self) -> &str {
        self.components
            .extension
            .as_deref()
            .unwrap_or(DEFAULT_EXTENSION)
    }

    pub fn lookaround_window(&self) -> usize {
        self.migration
            .lookaround_window
            .unwrap_or(crate::regions::DEFAULT_LOOKAROUND_WINDOW)
    }
}

/// Load and parse a CmsConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<CmsConfig> {
    if !config_path.exists() {
        return Ok(CmsConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: CmsConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_uses_builtin_folders() {
        let config = CmsConfig::default();
        assert_eq!(config.folders().len(), DEFAULT_COMPONENT_FOLDERS.len());
        assert_eq!(config.folders()[0], "home");
        assert_eq!(config.extension(), "svelte");
        assert_eq!(config.lookaround_window(), 100);
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/config.toml")).expect("load config");
        assert!(config.components.folders.is_none());
    }

    #[test]
    fn load_config_parses_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[components]
folders = ["landing", "shared"]
extension = "html"

[migration]
lookaround_window = 200
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.folders(), vec!["landing", "shared"]);
        assert_eq!(config.extension(), "html");
        assert_eq!(config.lookaround_window(), 200);
    }

    #[test]
    fn load_config_tolerates_partial_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[components]\nextension = \"html\"\n").expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.extension(), "html");
        assert_eq!(config.folders()[0], "home");
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[components\nextension = \"oops\"").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn empty_folder_list_falls_back_to_defaults() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[components]\nfolders = []\n").expect("write config");
        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.folders().len(), DEFAULT_COMPONENT_FOLDERS.len());
    }
}
