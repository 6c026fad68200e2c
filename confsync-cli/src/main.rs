mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use confsync_core::adapters::{ProcessRunner, TokioFs};
use confsync_core::settings::{ConfigureSettings, UpgradeSettings};
use confsync_core::version::ConfigModuleVersionStore;
use confsync_core::{PackageManager, PatchMode, run_configure, run_upgrade};
use confsync_merge::ProjectType;
use confsync_patches::builtin_catalog;
use confsync_render::{
    render_configure_md, render_configure_text, render_upgrade_md, render_upgrade_text,
};
use confsync_types::report::ToolInfo;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "confsync",
    version,
    about = "Keeps a JavaScript/TypeScript project's config files in sync with a template."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile project files with the built-in template.
    Configure(ConfigureArgs),
    /// Check which versioned patches are pending (writes nothing).
    Lint(UpgradeArgs),
    /// Apply pending versioned patches and record the new version.
    Format(UpgradeArgs),
    /// List the versioned patch catalog.
    ListPatches(ListPatchesArgs),
}

#[derive(Debug, Parser)]
struct ConfigureArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Print the unified diff instead of writing.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Project type (overrides confsync.toml).
    #[arg(long = "type", value_enum)]
    project_type: Option<ProjectTypeArg>,

    /// Major Node.js version (overrides confsync.toml).
    #[arg(long)]
    node_version: Option<String>,

    /// Glob to leave untouched; repeatable, extends confsync.toml.
    #[arg(long)]
    exclude: Vec<String>,

    /// Output format (text, json, markdown).
    #[arg(long, value_enum, default_value = "text")]
    format: ReportFormat,
}

#[derive(Debug, Parser)]
struct UpgradeArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Package manager used for installs (default: detected from lockfiles).
    #[arg(long)]
    package_manager: Option<PackageManager>,

    /// Output format (text, json, markdown).
    #[arg(long, value_enum, default_value = "text")]
    format: ReportFormat,
}

#[derive(Debug, Parser)]
struct ListPatchesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ReportFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProjectTypeArg {
    Application,
    Package,
}

impl From<ProjectTypeArg> for ProjectType {
    fn from(arg: ProjectTypeArg) -> Self {
        match arg {
            ProjectTypeArg::Application => ProjectType::Application,
            ProjectTypeArg::Package => ProjectType::Package,
        }
    }
}

fn main() -> ExitCode {
    match real_main() {
        Ok(true) => ExitCode::from(0),
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

/// Returns whether the command fully succeeded.
fn real_main() -> anyhow::Result<bool> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Configure(args) => cmd_configure(args),
        Command::Lint(args) => cmd_upgrade(PatchMode::Lint, args),
        Command::Format(args) => cmd_upgrade(PatchMode::Format, args),
        Command::ListPatches(args) => cmd_list_patches(args),
    }
}

fn cmd_configure(args: ConfigureArgs) -> anyhow::Result<bool> {
    let repo_root = args.repo_root;
    let file_config = config::load_or_default(&repo_root).context("load confsync.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_configure_args(
        args.project_type.map(ProjectType::from),
        args.node_version.as_deref(),
        &args.exclude,
    );
    debug!(
        "merged config: type={:?}, node={}, exclude={:?}",
        merged.project_type, merged.node_version, merged.exclude
    );

    let settings = ConfigureSettings {
        repo_root,
        project_type: merged.project_type,
        node_version: merged.node_version,
        exclude: merged.exclude,
        dry_run: args.dry_run,
    };
    let outcome = run_configure(&settings, tool_info())?;

    match args.format {
        ReportFormat::Text => {
            if args.dry_run && !outcome.patch.is_empty() {
                print!("{}", outcome.patch);
                println!();
            }
            print!("{}", render_configure_text(&outcome.report));
        }
        ReportFormat::Markdown => print!("{}", render_configure_md(&outcome.report)),
        ReportFormat::Json => print_json(&outcome.report)?,
    }
    Ok(true)
}

fn cmd_upgrade(mode: PatchMode, args: UpgradeArgs) -> anyhow::Result<bool> {
    let repo_root = args.repo_root;
    let file_config = config::load_or_default(&repo_root).context("load confsync.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_upgrade_args(args.package_manager, None);

    let settings = UpgradeSettings {
        repo_root: repo_root.clone(),
        mode,
        package_manager: merged.package_manager,
    };
    let catalog = builtin_catalog(&merged.node_version);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start tokio runtime")?;
    let outcome = runtime.block_on(async {
        let fs = TokioFs::new(repo_root.clone());
        let runner = ProcessRunner::new(repo_root.clone());
        let store = ConfigModuleVersionStore::new(&fs);
        run_upgrade(&settings, &catalog, &fs, &runner, &store).await
    })?;

    match args.format {
        ReportFormat::Text => print!("{}", render_upgrade_text(&outcome.report)),
        ReportFormat::Markdown => print!("{}", render_upgrade_md(&outcome.report)),
        ReportFormat::Json => print_json(&outcome.report)?,
    }
    Ok(outcome.ok())
}

fn cmd_list_patches(args: ListPatchesArgs) -> anyhow::Result<bool> {
    let metas = builtin_catalog(confsync_domain::DEFAULT_NODE_VERSION).metas();

    match args.format {
        OutputFormat::Text => {
            println!("Available patches:\n");
            println!("  {:<10} DESCRIPTION", "VERSION");
            println!("  {:<10} -----------", "-------");
            for meta in &metas {
                println!("  {:<10} {}", meta.version.to_string(), meta.description);
            }
            println!();
            println!("Use 'confsync lint' to see which ones are pending.");
        }
        OutputFormat::Json => print_json(&metas)?,
    }
    Ok(true)
}

fn print_json<T: serde::Serialize>(v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    println!("{}", s);
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "confsync".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
