use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const COMPONENTS_SUBDIR: &str = "src/lib/components";
pub const CONTENT_SUBDIR: &str = "static/content";
pub const STATE_SUBDIR: &str = ".cmstool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Heuristic,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub content_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
    pub executable_dir: Option<PathBuf>,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        let executable_dir = env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));
        Ok(Self {
            cwd,
            executable_dir,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub components_dir: PathBuf,
    pub content_dir: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub root_source: ValueSource,
    pub content_source: ValueSource,
    pub config_source: ValueSource,
}

impl ResolvedPaths {
    /// Everything rooted at `project_root` with default sources. Test and
    /// library convenience; the CLI goes through `resolve_paths`.
    pub fn for_project_root(project_root: &Path) -> Self {
        Self {
            components_dir: project_root.join(COMPONENTS_SUBDIR),
            content_dir: project_root.join(CONTENT_SUBDIR),
            state_dir: project_root.join(STATE_SUBDIR),
            config_path: project_root.join(STATE_SUBDIR).join("config.toml"),
            project_root: project_root.to_path_buf(),
            root_source: ValueSource::Default,
            content_source: ValueSource::Default,
            config_source: ValueSource::Default,
        }
    }

    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\ncomponents_dir={}\ncontent_dir={} ({})\nstate_dir={}\nconfig_path={} ({})",
            normalize_for_display(&self.project_root),
            self.root_source.as_str(),
            normalize_for_display(&self.components_dir),
            normalize_for_display(&self.content_dir),
            self.content_source.as_str(),
            normalize_for_display(&self.state_dir),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeStatus {
    pub project_root_exists: bool,
    pub components_exists: bool,
    pub content_dir_exists: bool,
    pub state_dir_exists: bool,
    pub config_exists: bool,
    pub record_count: usize,
    pub warnings: Vec<String>,
}

pub fn inspect_runtime(paths: &ResolvedPaths) -> Result<RuntimeStatus> {
    let project_root_exists = paths.project_root.exists();
    let components_exists = paths.components_dir.exists();
    let content_dir_exists = paths.content_dir.exists();
    let state_dir_exists = paths.state_dir.exists();
    let config_exists = paths.config_path.exists();

    let record_count = if content_dir_exists {
        let entries = fs::read_dir(&paths.content_dir)
            .with_context(|| format!("failed to inspect {}", paths.content_dir.display()))?;
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().extension().is_some_and(|ext| ext == "json")
            })
            .count()
    } else {
        0
    };

    let mut warnings = Vec::new();
    if !components_exists {
        warnings.push(format!(
            "{COMPONENTS_SUBDIR}/ is missing; component lookups will find nothing"
        ));
    }
    if !content_dir_exists {
        warnings.push(format!(
            "{CONTENT_SUBDIR}/ is missing; run `cmstool init` before extract or integrate"
        ));
    }
    if !state_dir_exists {
        warnings.push(format!(
            "{STATE_SUBDIR}/ is missing; run `cmstool init` before migration commands"
        ));
    }

    Ok(RuntimeStatus {
        project_root_exists,
        components_exists,
        content_dir_exists,
        state_dir_exists,
        config_exists,
        record_count,
        warnings,
    })
}

pub fn ensure_runtime_ready(paths: &ResolvedPaths, status: &RuntimeStatus) -> Result<()> {
    if !status.content_dir_exists || !status.state_dir_exists {
        bail!(
            "Runtime layout is not initialized.\nRequired paths:\n  - {CONTENT_SUBDIR}/ ({})\n  - {STATE_SUBDIR}/ ({})\nRun: cmstool init --project-root {}",
            if status.content_dir_exists { "ok" } else { "missing" },
            if status.state_dir_exists { "ok" } else { "missing" },
            normalize_for_display(&paths.project_root)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub created_dirs: Vec<PathBuf>,
    pub wrote_config: bool,
}

pub fn resolve_paths(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> Result<ResolvedPaths> {
    resolve_paths_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<ResolvedPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let (project_root, root_source) = resolve_project_root(context, overrides, &lookup_env)
        .context("failed to resolve project root")?;

    let components_dir = project_root.join(COMPONENTS_SUBDIR);
    let state_dir = project_root.join(STATE_SUBDIR);

    let (content_dir, content_source) = if let Some(path) = overrides.content_dir.as_deref() {
        (
            absolutize(path, &project_root),
            ValueSource::Flag,
        )
    } else if let Some(value) = lookup_env("CMSTOOL_CONTENT_DIR") {
        (
            absolutize(Path::new(value.trim()), &project_root),
            ValueSource::Env,
        )
    } else {
        (project_root.join(CONTENT_SUBDIR), ValueSource::Default)
    };

    let (config_path, config_source) = if let Some(path) = overrides.config.as_deref() {
        (
            absolutize(path, &project_root),
            ValueSource::Flag,
        )
    } else if let Some(value) = lookup_env("CMSTOOL_CONFIG") {
        (
            absolutize(Path::new(value.trim()), &project_root),
            ValueSource::Env,
        )
    } else {
        (state_dir.join("config.toml"), ValueSource::Default)
    };

    Ok(ResolvedPaths {
        project_root,
        components_dir,
        content_dir,
        state_dir,
        config_path,
        root_source,
        content_source,
        config_source,
    })
}

pub fn init_layout(paths: &ResolvedPaths, options: &InitOptions) -> Result<InitReport> {
    let mut created_dirs = Vec::new();

    let required_dirs = [paths.content_dir.clone(), paths.state_dir.clone()];
    for dir in &required_dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            created_dirs.push(dir.clone());
        }
    }

    let wrote_config = write_text_file(
        &paths.config_path,
        &render_materialized_config(paths),
        options.force,
    )?;

    Ok(InitReport {
        created_dirs,
        wrote_config,
    })
}

pub fn render_materialized_config(paths: &ResolvedPaths) -> String {
    let project_root = normalize_for_display(&paths.project_root);
    let components_dir = normalize_for_display(&paths.components_dir);
    let content_dir = normalize_for_display(&paths.content_dir);

    format!(
        "# cmstool runtime configuration (materialized by `cmstool init`)\n\n[components]\n# folders = [\"home\", \"shared\", \"about\"]\n# extension = \"svelte\"\n\n[migration]\n# lookaround_window = 100\n\n[paths]\nproject_root = \"{project_root}\"\ncomponents_dir = \"{components_dir}\"\ncontent_dir = \"{content_dir}\"\n",
    )
}

fn resolve_project_root<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: &F,
) -> Result<(PathBuf, ValueSource)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.project_root.as_deref() {
        return Ok((absolutize(path, &context.cwd), ValueSource::Flag));
    }

    if let Some(value) = lookup_env("CMSTOOL_PROJECT_ROOT") {
        return Ok((
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        ));
    }

    let root = detect_project_root_heuristic(&context.cwd, context.executable_dir.as_deref());
    Ok((root, ValueSource::Heuristic))
}

fn detect_project_root_heuristic(cwd: &Path, executable_dir: Option<&Path>) -> PathBuf {
    let mut seen = HashSet::new();
    for candidate in candidate_roots(cwd, executable_dir) {
        let key = normalize_for_display(&candidate);
        if !seen.insert(key) {
            continue;
        }
        if candidate.join(COMPONENTS_SUBDIR).exists() {
            return candidate;
        }
    }
    cwd.to_path_buf()
}

fn candidate_roots(cwd: &Path, executable_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut out = ancestors(cwd);
    if let Some(exe_dir) = executable_dir {
        out.extend(ancestors(exe_dir));
    }
    out
}

fn ancestors(path: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut cursor = Some(path);
    while let Some(current) = cursor {
        out.push(current.to_path_buf());
        cursor = current.parent();
    }
    out
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn write_text_file(path: &Path, content: &str, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent directory {}", parent.display()))?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::tempdir;

    use super::{
        InitOptions, PathOverrides, ResolutionContext, ValueSource, ensure_runtime_ready,
        init_layout, inspect_runtime, resolve_paths_with_lookup,
    };

    #[test]
    fn resolve_paths_prefers_flag_over_env() {
        let temp = tempdir().expect("tempdir");
        let cwd = temp.path().join("cwd");
        let from_flag = temp.path().join("flag-root");
        fs::create_dir_all(&cwd).expect("create cwd");

        let overrides = PathOverrides {
            project_root: Some(from_flag.clone()),
            ..PathOverrides::default()
        };
        let context = ResolutionContext {
            cwd: cwd.clone(),
            executable_dir: None,
        };

        let env = HashMap::from([(
            "CMSTOOL_PROJECT_ROOT".to_string(),
            temp.path().join("env-root").to_string_lossy().to_string(),
        )]);

        let resolved = resolve_paths_with_lookup(&context, &overrides, |key| env.get(key).cloned())
            .expect("resolve paths");
        assert_eq!(resolved.project_root, from_flag);
        assert_eq!(resolved.root_source, ValueSource::Flag);
    }

    #[test]
    fn env_content_dir_resolves_relative_to_root() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("project");
        fs::create_dir_all(&root).expect("create root");

        let context = ResolutionContext {
            cwd: root.clone(),
            executable_dir: None,
        };
        let overrides = PathOverrides {
            project_root: Some(root.clone()),
            ..PathOverrides::default()
        };
        let env = HashMap::from([(
            "CMSTOOL_CONTENT_DIR".to_string(),
            "content/records".to_string(),
        )]);

        let resolved = resolve_paths_with_lookup(&context, &overrides, |key| env.get(key).cloned())
            .expect("resolve paths");
        assert_eq!(resolved.content_dir, root.join("content/records"));
        assert_eq!(resolved.content_source, ValueSource::Env);
    }

    #[test]
    fn heuristic_finds_root_with_components_dir() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("site");
        let nested = root.join("src").join("routes");
        fs::create_dir_all(root.join("src/lib/components")).expect("create components");
        fs::create_dir_all(&nested).expect("create nested");

        let context = ResolutionContext {
            cwd: nested,
            executable_dir: None,
        };
        let resolved = resolve_paths_with_lookup(&context, &PathOverrides::default(), |_| None)
            .expect("resolve paths");
        assert_eq!(resolved.project_root, root);
        assert_eq!(resolved.root_source, ValueSource::Heuristic);
    }

    #[test]
    fn init_layout_creates_expected_dirs_and_config() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("project");
        fs::create_dir_all(&root).expect("create root");

        let context = ResolutionContext {
            cwd: root.clone(),
            executable_dir: None,
        };
        let overrides = PathOverrides {
            project_root: Some(root.clone()),
            ..PathOverrides::default()
        };
        let paths = resolve_paths_with_lookup(&context, &overrides, |_| None).expect("resolve");

        let report = init_layout(&paths, &InitOptions::default()).expect("init");
        assert!(!report.created_dirs.is_empty());
        assert!(report.wrote_config);
        assert!(paths.content_dir.exists());
        assert!(paths.state_dir.exists());
        assert!(paths.config_path.exists());
    }

    #[test]
    fn init_layout_keeps_existing_config_without_force() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("project");
        fs::create_dir_all(&root).expect("create root");
        let overrides = PathOverrides {
            project_root: Some(root.clone()),
            ..PathOverrides::default()
        };
        let context = ResolutionContext {
            cwd: root.clone(),
            executable_dir: None,
        };
        let paths = resolve_paths_with_lookup(&context, &overrides, |_| None).expect("resolve");

        init_layout(&paths, &InitOptions::default()).expect("init");
        fs::write(&paths.config_path, "[components]\nextension = \"html\"\n").expect("write");

        let second = init_layout(&paths, &InitOptions::default()).expect("init");
        assert!(!second.wrote_config);
        let kept = fs::read_to_string(&paths.config_path).expect("read");
        assert!(kept.contains("html"));

        let forced = init_layout(&paths, &InitOptions { force: true }).expect("init");
        assert!(forced.wrote_config);
    }

    #[test]
    fn readiness_fails_without_init() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("project");
        fs::create_dir_all(&root).expect("create root");
        let context = ResolutionContext {
            cwd: root.clone(),
            executable_dir: None,
        };
        let overrides = PathOverrides {
            project_root: Some(root.clone()),
            ..PathOverrides::default()
        };
        let paths = resolve_paths_with_lookup(&context, &overrides, |_| None).expect("resolve");
        let status = inspect_runtime(&paths).expect("inspect");
        let err = ensure_runtime_ready(&paths, &status).expect_err("must fail");
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn inspect_counts_content_records() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("project");
        fs::create_dir_all(&root).expect("create root");
        let overrides = PathOverrides {
            project_root: Some(root.clone()),
            ..PathOverrides::default()
        };
        let context = ResolutionContext {
            cwd: root.clone(),
            executable_dir: None,
        };
        let paths = resolve_paths_with_lookup(&context, &overrides, |_| None).expect("resolve");
        init_layout(&paths, &InitOptions::default()).expect("init");
        fs::write(paths.content_dir.join("home.json"), "{}").expect("write");
        fs::write(paths.content_dir.join("about.json"), "{}").expect("write");
        fs::write(paths.content_dir.join("notes.txt"), "x").expect("write");

        let status = inspect_runtime(&paths).expect("inspect");
        assert_eq!(status.record_count, 2);
        assert!(status.content_dir_exists);
    }
}
