use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use cmstool_core::audit::audit_markup;
use cmstool_core::config::{CmsConfig, load_config};
use cmstool_core::extract::extract_content;
use cmstool_core::filesystem::{
    ScanStats, all_component_files, find_component_path, scan_stats,
};
use cmstool_core::fixup::{FixupPass, apply_fixup};
use cmstool_core::integrate::integrate_markup;
use cmstool_core::migrate::{MigrateOptions, migrate_markup};
use cmstool_core::runtime::{
    InitOptions, PathOverrides, ResolutionContext, ResolvedPaths, ensure_runtime_ready,
    init_layout, inspect_runtime, resolve_paths,
};
use cmstool_core::store::{load_record, save_record};
use similar::TextDiff;

#[derive(Debug, Parser)]
#[command(
    name = "cmstool",
    version,
    about = "Migrates literal component copy into editable content records"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    content_dir: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    content_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            content_dir: cli.content_dir.clone(),
            config: cli.config.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init(InitArgs),
    Status,
    Migrate(BatchArgs),
    Extract(BatchArgs),
    Integrate(BatchArgs),
    Audit(AuditArgs),
    Fixup(FixupArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long, help = "Overwrite an existing config file")]
    force: bool,
}

#[derive(Debug, Args)]
struct BatchArgs {
    #[arg(long, help = "Report changes without writing files")]
    dry_run: bool,
    #[arg(long, help = "Run over every component file")]
    all: bool,
    #[arg(value_name = "COMPONENT", help = "Component names to process")]
    components: Vec<String>,
}

#[derive(Debug, Args)]
struct AuditArgs {
    #[arg(long, help = "Audit every component file")]
    all: bool,
    #[arg(value_name = "COMPONENT")]
    components: Vec<String>,
}

#[derive(Debug, Args)]
struct FixupArgs {
    #[arg(value_name = "PASS", help = "backticks, collapse, braces, srcset, or alt")]
    pass: String,
    #[arg(long, help = "Report changes without writing files")]
    dry_run: bool,
    #[arg(long, help = "Run over every component file")]
    all: bool,
    #[arg(value_name = "COMPONENT")]
    components: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Init(args)) => run_init(&runtime, args),
        Some(Commands::Status) => run_status(&runtime),
        Some(Commands::Migrate(args)) => run_migrate(&runtime, args),
        Some(Commands::Extract(args)) => run_extract(&runtime, args),
        Some(Commands::Integrate(args)) => run_integrate(&runtime, args),
        Some(Commands::Audit(args)) => run_audit(&runtime, args),
        Some(Commands::Fixup(args)) => run_fixup(&runtime, args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_init(runtime: &RuntimeOptions, args: InitArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = init_layout(&paths, &InitOptions { force: args.force })?;

    println!("Initialized cmstool runtime layout");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!("components_dir: {}", normalize_path(&paths.components_dir));
    println!("content_dir: {}", normalize_path(&paths.content_dir));
    println!("state_dir: {}", normalize_path(&paths.state_dir));
    println!("config_path: {}", normalize_path(&paths.config_path));
    println!("created_dirs: {}", report.created_dirs.len());
    println!("wrote_config: {}", report.wrote_config);
    print_diagnostics(runtime, &paths);

    Ok(())
}

fn run_status(runtime: &RuntimeOptions) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;
    let status = inspect_runtime(&paths)?;
    let scan = scan_stats(&paths, &config)?;

    println!("runtime status");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!(
        "project_root_exists: {}",
        format_flag(status.project_root_exists)
    );
    println!("components_exists: {}", format_flag(status.components_exists));
    println!(
        "content_dir_exists: {}",
        format_flag(status.content_dir_exists)
    );
    println!("state_dir_exists: {}", format_flag(status.state_dir_exists));
    println!("config_exists: {}", format_flag(status.config_exists));
    println!("content_records: {}", status.record_count);
    print_scan_stats("scan", &scan);
    if !status.warnings.is_empty() {
        println!("warnings:");
        for warning in &status.warnings {
            println!("  - {warning}");
        }
    }
    print_diagnostics(runtime, &paths);

    Ok(())
}

fn run_migrate(runtime: &RuntimeOptions, args: BatchArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;
    let status = inspect_runtime(&paths)?;
    ensure_runtime_ready(&paths, &status)?;

    let options = MigrateOptions {
        lookaround_window: config.lookaround_window(),
    };

    let targets = component_targets(&paths, &config, &args.components, args.all)?;
    println!("migrate");
    println!("targets: {}", targets.total());
    println!("dry_run: {}", args.dry_run);

    let mut failures = report_missing(&targets, &paths, &config);
    for path in &targets.files {
        if let Err(error) = migrate_one(path, &options, args.dry_run) {
            eprintln!("error: {}: {error:#}", normalize_path(path));
            failures += 1;
        }
    }
    print_diagnostics(runtime, &paths);
    finish_batch(failures, targets.total())
}

fn migrate_one(path: &Path, options: &MigrateOptions, dry_run: bool) -> Result<()> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let outcome = migrate_markup(&source, options)?;

    let name = normalize_path(path);
    if !outcome.changed() {
        println!("{name}: unchanged");
        return Ok(());
    }

    println!(
        "{name}: wrapped {} item(s), added_integration: {}",
        outcome.wrapped.len(),
        outcome.added_integration
    );
    for item in &outcome.wrapped {
        match &item.attribute {
            Some(attribute) => {
                println!("  line {}: [{attribute}] {} <- {:?}", item.line, item.key, item.text)
            }
            None => println!("  line {}: {} <- {:?}", item.line, item.key, item.text),
        }
    }

    if dry_run {
        print_unified_diff(&name, &source, &outcome.code);
        return Ok(());
    }
    fs::write(path, outcome.code)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn run_extract(runtime: &RuntimeOptions, args: BatchArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;
    let status = inspect_runtime(&paths)?;
    ensure_runtime_ready(&paths, &status)?;

    let targets = component_targets(&paths, &config, &args.components, args.all)?;
    println!("extract");
    println!("targets: {}", targets.total());
    println!("dry_run: {}", args.dry_run);

    let mut failures = report_missing(&targets, &paths, &config);
    for path in &targets.files {
        if let Err(error) = extract_one(&paths, path, args.dry_run) {
            eprintln!("error: {}: {error:#}", normalize_path(path));
            failures += 1;
        }
    }
    print_diagnostics(runtime, &paths);
    finish_batch(failures, targets.total())
}

fn extract_one(paths: &ResolvedPaths, path: &Path, dry_run: bool) -> Result<()> {
    let name = component_name(path)?;
    let markup =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let record = extract_content(&markup, &name);

    println!(
        "{name}: texts: {}, images: {}, links: {}",
        record.texts.len(),
        record.images.len(),
        record.links.len()
    );
    if dry_run {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    let written = save_record(paths, &record)?;
    println!("{name}: wrote {}", normalize_path(&written));
    Ok(())
}

fn run_integrate(runtime: &RuntimeOptions, args: BatchArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;
    let status = inspect_runtime(&paths)?;
    ensure_runtime_ready(&paths, &status)?;

    let targets = component_targets(&paths, &config, &args.components, args.all)?;
    println!("integrate");
    println!("targets: {}", targets.total());
    println!("dry_run: {}", args.dry_run);

    let mut failures = report_missing(&targets, &paths, &config);
    for path in &targets.files {
        if let Err(error) = integrate_one(&paths, path, args.dry_run) {
            eprintln!("error: {}: {error:#}", normalize_path(path));
            failures += 1;
        }
    }
    print_diagnostics(runtime, &paths);
    finish_batch(failures, targets.total())
}

fn integrate_one(paths: &ResolvedPaths, path: &Path, dry_run: bool) -> Result<()> {
    let name = component_name(path)?;
    let record = load_record(paths, &name)?;
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let outcome = integrate_markup(&source, &record)?;

    if outcome.already_integrated {
        println!("{name}: already integrated, skipped");
        return Ok(());
    }
    println!("{name}: replaced {} literal(s)", outcome.replaced);
    if dry_run {
        print_unified_diff(&name, &source, &outcome.code);
        return Ok(());
    }
    fs::write(path, outcome.code)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn run_audit(runtime: &RuntimeOptions, args: AuditArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;
    let status = inspect_runtime(&paths)?;
    ensure_runtime_ready(&paths, &status)?;

    let targets = component_targets(&paths, &config, &args.components, args.all)?;
    println!("audit");
    println!("targets: {}", targets.total());

    let mut failures = report_missing(&targets, &paths, &config);
    let mut missing_total = 0usize;
    for path in &targets.files {
        match audit_one(&paths, path) {
            Ok(missing) => missing_total += missing,
            Err(error) => {
                eprintln!("error: {}: {error:#}", normalize_path(path));
                failures += 1;
            }
        }
    }
    println!("missing_total: {missing_total}");
    print_diagnostics(runtime, &paths);
    finish_batch(failures, targets.total())?;
    if missing_total > 0 {
        bail!("{missing_total} item(s) are missing from content records");
    }
    Ok(())
}

fn audit_one(paths: &ResolvedPaths, path: &Path) -> Result<usize> {
    let name = component_name(path)?;
    let record = load_record(paths, &name)?;
    let markup =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let report = audit_markup(&markup, &record);

    if report.is_clean() {
        println!("{name}: clean");
        return Ok(0);
    }

    println!("{name}: {} missing item(s)", report.total());
    for item in &report.texts {
        println!("  line {}: text {:?}", item.line, item.text);
    }
    for item in &report.attributes {
        println!("  line {}: [{}] {:?}", item.line, item.attribute, item.text);
    }
    for item in &report.images {
        println!(
            "  line {}: image url={:?} (missing: {}) alt={:?} (missing: {})",
            item.line, item.url, item.url_missing, item.alt, item.alt_missing
        );
    }
    for item in &report.links {
        println!(
            "  line {}: link href={:?} (missing: {}) text={:?} (missing: {})",
            item.line, item.href, item.href_missing, item.text, item.text_missing
        );
    }
    Ok(report.total())
}

fn run_fixup(runtime: &RuntimeOptions, args: FixupArgs) -> Result<()> {
    let pass = FixupPass::parse(&args.pass)?;
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;

    let targets = component_targets(&paths, &config, &args.components, args.all)?;
    println!("fixup {}", pass.as_str());
    println!("targets: {}", targets.total());
    println!("dry_run: {}", args.dry_run);

    let mut failures = report_missing(&targets, &paths, &config);
    for path in &targets.files {
        if let Err(error) = fixup_one(path, pass, args.dry_run) {
            eprintln!("error: {}: {error:#}", normalize_path(path));
            failures += 1;
        }
    }
    print_diagnostics(runtime, &paths);
    finish_batch(failures, targets.total())
}

fn fixup_one(path: &Path, pass: FixupPass, dry_run: bool) -> Result<()> {
    let component = component_name(path)?;
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let outcome = apply_fixup(&source, pass, &component)?;

    let name = normalize_path(path);
    if outcome.changes == 0 {
        println!("{name}: unchanged");
        return Ok(());
    }
    println!("{name}: fixed {} call(s)", outcome.changes);
    if dry_run {
        print_unified_diff(&name, &source, &outcome.code);
        return Ok(());
    }
    fs::write(path, outcome.code)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug)]
struct ComponentTargets {
    files: Vec<PathBuf>,
    missing: Vec<String>,
}

impl ComponentTargets {
    fn total(&self) -> usize {
        self.files.len() + self.missing.len()
    }
}

/// Named components resolve through the configured folder order; `--all`
/// takes every component file. Naming nothing is a usage error, never an
/// implicit whole-tree run. A name that resolves to nothing is kept as a
/// missing unit so the batch can continue past it.
fn component_targets(
    paths: &ResolvedPaths,
    config: &CmsConfig,
    components: &[String],
    all: bool,
) -> Result<ComponentTargets> {
    if all {
        let files = all_component_files(paths, config)?;
        if files.is_empty() {
            bail!(
                "no component files found under {}",
                normalize_path(&paths.components_dir)
            );
        }
        return Ok(ComponentTargets {
            files,
            missing: Vec::new(),
        });
    }
    if components.is_empty() {
        bail!("no components named; pass one or more component names or --all");
    }

    let mut files = Vec::with_capacity(components.len());
    let mut missing = Vec::new();
    for name in components {
        match find_component_path(paths, config, name) {
            Some(path) => files.push(path),
            None => missing.push(name.clone()),
        }
    }
    Ok(ComponentTargets { files, missing })
}

/// Reports each unresolved component name and returns how many there were.
fn report_missing(targets: &ComponentTargets, paths: &ResolvedPaths, config: &CmsConfig) -> usize {
    for name in &targets.missing {
        eprintln!(
            "error: component '{name}' not found under {} (searched folders: {})",
            normalize_path(&paths.components_dir),
            config.folders().join(", ")
        );
    }
    targets.missing.len()
}

fn component_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .with_context(|| format!("no file name in {}", path.display()))
}

fn finish_batch(failures: usize, total: usize) -> Result<()> {
    if failures > 0 {
        bail!("{failures} of {total} component(s) failed");
    }
    Ok(())
}

fn print_unified_diff(name: &str, before: &str, after: &str) {
    let diff = TextDiff::from_lines(before, after);
    print!(
        "{}",
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("a/{name}"), &format!("b/{name}"))
    );
}

fn print_scan_stats(prefix: &str, stats: &ScanStats) {
    println!("{prefix}.total: {}", stats.total);
    println!("{prefix}.integrated: {}", stats.integrated);
    println!("{prefix}.with_record: {}", stats.with_record);
    if stats.by_folder.is_empty() {
        println!("{prefix}.by_folder: <empty>");
    } else {
        for (folder, count) in &stats.by_folder {
            println!("{prefix}.folder.{folder}: {count}");
        }
    }
}

fn print_diagnostics(runtime: &RuntimeOptions, paths: &ResolvedPaths) {
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<ResolvedPaths> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        content_dir: runtime.content_dir.clone(),
        config: runtime.config.clone(),
    };

    let initial = resolve_paths(&context, &overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    resolve_paths(&context, &overrides)
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
