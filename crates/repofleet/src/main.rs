use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use repofleet_core::catalog::{ContentType, Feature};
use repofleet_core::config::{DEFAULT_FLEET_FILE, RequiredLists, load_fleet_config};
use repofleet_core::download::{DownloadOptions, RunStamp, run_downloads};
use repofleet_core::gh::{GhApi, GhCli};
use repofleet_core::ghas::{RepoStatus, run_check, run_enable};
use repofleet_core::outcome::{OperationResult, Outcome};
use repofleet_core::paginate::PaginationMode;
use repofleet_core::pool::TaskPool;
use repofleet_core::report::{ExitPolicy, FailureOrder, RunReport, render_progress};
use repofleet_core::settings::{Settings, Tool, load_settings, settings_path};
use tracing::info;
use tracing_subscriber::EnvFilter;

const PROGRESS_WIDTH: usize = 40;

#[derive(Debug, Parser)]
#[command(
    name = "repofleet",
    version,
    about = "Bulk GitHub repository operations through the gh CLI"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Tool settings file (TOML)")]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Bulk-apply topics to GitHub repos")]
    Topics(TopicsArgs),
    #[command(about = "Download SBOM, Dependabot & CodeQL data from GitHub repos")]
    Download(DownloadArgs),
    #[command(about = "Enable GHAS features on GitHub repos")]
    Ghas(GhasArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    #[arg(short = 'f', long, default_value = DEFAULT_FLEET_FILE, help = "Config file path")]
    file: PathBuf,
    #[arg(short = 'w', long, value_name = "N", help = "Parallel workers")]
    workers: Option<usize>,
    #[arg(short = 'n', long, help = "Preview without changing anything")]
    dry_run: bool,
    #[arg(short = 'v', long, help = "Show every result")]
    verbose: bool,
}

#[derive(Debug, Args)]
struct TopicsArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct DownloadArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(short = 'o', long, value_name = "DIR", help = "Output directory")]
    output: Option<PathBuf>,
    #[arg(
        short = 't',
        long,
        num_args = 1..,
        value_parser = ContentType::parse,
        help = "Content types to download: sbom, dependabot, codeql (default: all)"
    )]
    types: Vec<ContentType>,
    #[arg(long, help = "Let gh follow pagination and merge its output stream")]
    auto_paginate: bool,
}

#[derive(Debug, Args)]
struct GhasArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(
        long,
        num_args = 1..,
        value_parser = Feature::parse,
        help = "Features to enable (default: all)"
    )]
    features: Vec<Feature>,
    #[arg(long, help = "Just check current status, don't enable anything")]
    check: bool,
}

struct Runtime {
    settings: Settings,
    gh: GhCli,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    let runtime = load_runtime(cli.settings.as_deref())?;
    match command {
        Commands::Topics(args) => run_topics(&runtime, args),
        Commands::Download(args) => run_download(&runtime, args),
        Commands::Ghas(args) if args.check => run_ghas_check(&runtime, args),
        Commands::Ghas(args) => run_ghas_enable(&runtime, args),
    }
}

fn load_runtime(explicit: Option<&Path>) -> Result<Runtime> {
    let cwd = env::current_dir().context("failed to read current directory")?;
    let settings = load_settings(&settings_path(explicit, &cwd))?;
    let gh = GhCli::new(settings.gh_binary());
    Ok(Runtime { settings, gh })
}

fn run_topics(runtime: &Runtime, args: TopicsArgs) -> Result<ExitCode> {
    let common = args.common;
    let config = load_fleet_config(&common.file, RequiredLists::ReposAndTopics)?;
    preflight(&runtime.gh, common.dry_run)?;
    let pool = TaskPool::new(runtime.settings.workers(Tool::Topics, common.workers))?;

    let total = config.repos.len() * config.topics.len();
    println!();
    println!("🏷️  Topics:  {}", config.topics.join(", "));
    println!("📦 Repos:   {}", config.repos.len());
    println!("🔧 Actions: {total} topic applications");
    println!("⚡ Workers: {}", pool.workers());
    if !confirm_run(common.dry_run, "🧪 MODE:    DRY RUN", "Proceed? [y/N]: ", "y")? {
        return Ok(ExitCode::SUCCESS);
    }

    println!("  Applying topics...");
    print_progress(0, total);
    let report = repofleet_core::topics::run_topics(
        &runtime.gh,
        &config,
        &pool,
        common.dry_run,
        print_progress,
    )?;
    println!("\n");

    print_report(&report, common.verbose, FailureOrder::TargetThenOperation, None);
    print_totals(&report);
    Ok(ExitCode::from(report.exit_status(ExitPolicy::FailOnAnyFailure)))
}

fn run_download(runtime: &Runtime, args: DownloadArgs) -> Result<ExitCode> {
    let common = args.common;
    let config = load_fleet_config(&common.file, RequiredLists::Repos)?;
    preflight(&runtime.gh, common.dry_run)?;
    let pool = TaskPool::new(runtime.settings.workers(Tool::Download, common.workers))?;

    let content_types = if args.types.is_empty() {
        ContentType::ALL.to_vec()
    } else {
        dedupe(args.types)
    };
    let options = DownloadOptions {
        output_dir: runtime.settings.output_dir(args.output.as_deref()),
        stamp: RunStamp::now(),
        pagination: if args.auto_paginate {
            PaginationMode::AutoPaginate
        } else {
            PaginationMode::PageLoop
        },
        dry_run: common.dry_run,
    };

    let total = config.repos.len() * content_types.len();
    println!();
    println!("📦 Repos:       {}", config.repos.len());
    println!(
        "📄 Types:       {}",
        join_names(content_types.iter().map(|content_type| content_type.name()))
    );
    println!("🔧 Downloads:   {total}");
    println!("⚡ Workers:     {}", pool.workers());
    println!("📁 Output:      {}", display_dir(&options.output_dir));
    println!("🕐 Timestamp:   {}", options.stamp.as_str());
    if !confirm_run(common.dry_run, "🧪 MODE:        DRY RUN", "Proceed? [y/N]: ", "y")? {
        return Ok(ExitCode::SUCCESS);
    }

    println!("  Downloading...");
    print_progress(0, total);
    let report = run_downloads(
        &runtime.gh,
        &config.repos,
        &content_types,
        &options,
        &pool,
        print_progress,
    )?;
    println!("\n");

    print_report(&report, common.verbose, FailureOrder::OperationThenTarget, Some(12));
    print_totals(&report);
    if report.succeeded() > 0 && !report.dry_run {
        println!("\n📁 Files saved to: {}", display_dir(&options.output_dir));
    }
    Ok(ExitCode::from(report.exit_status(ExitPolicy::FailOnAnyFailure)))
}

fn run_ghas_enable(runtime: &Runtime, args: GhasArgs) -> Result<ExitCode> {
    let common = args.common;
    let config = load_fleet_config(&common.file, RequiredLists::Repos)?;
    preflight(&runtime.gh, common.dry_run)?;
    let pool = TaskPool::new(runtime.settings.workers(Tool::Ghas, common.workers))?;

    let selected = if args.features.is_empty() {
        Feature::ENABLE_ORDER.to_vec()
    } else {
        args.features
    };
    let features = Feature::in_enable_order(&selected);

    println!();
    println!("📦 Repos:       {}", config.repos.len());
    println!(
        "🔧 Features:    {}",
        join_names(features.iter().map(|feature| feature.name()))
    );
    println!("⚡ Workers:     {}", pool.workers());
    println!("\n🔓 Features to enable:");
    for feature in &features {
        println!("   • {:30} {}", feature.name(), feature.descriptor().description);
    }
    if !common.dry_run {
        println!();
        println!("⚠️  WARNING: Enabling GHAS consumes license seats!");
        println!("   Each active committer on a repo = 1 seat.");
    }
    if !confirm_run(
        common.dry_run,
        "\n🧪 MODE:        DRY RUN",
        "Type 'enable' to proceed: ",
        "enable",
    )? {
        return Ok(ExitCode::SUCCESS);
    }

    println!("  Enabling features...");
    print_progress(0, config.repos.len());
    let report = run_enable(
        &runtime.gh,
        &config.repos,
        &features,
        &pool,
        common.dry_run,
        print_progress,
    )?;
    println!("\n");

    print_report(&report, common.verbose, FailureOrder::OperationThenTarget, Some(28));
    print_totals(&report);
    Ok(ExitCode::from(report.exit_status(ExitPolicy::ReportOnly)))
}

fn run_ghas_check(runtime: &Runtime, args: GhasArgs) -> Result<ExitCode> {
    let common = args.common;
    let config = load_fleet_config(&common.file, RequiredLists::Repos)?;
    preflight(&runtime.gh, false)?;
    let pool = TaskPool::new(runtime.settings.workers(Tool::Ghas, common.workers))?;

    println!("\n🔍 Checking GHAS status for {} repos...\n", config.repos.len());
    let rows = run_check(&runtime.gh, &config.repos, &pool, |_, _| {})?;

    println!("  {:42} {:8} {:8} {:10} {:10}", "Repo", "GHAS", "CodeQL", "Secrets", "Push Prot");
    println!(
        "  {} {} {} {} {}",
        "─".repeat(42),
        "─".repeat(8),
        "─".repeat(8),
        "─".repeat(10),
        "─".repeat(10)
    );
    for (repo, status) in rows {
        match status {
            RepoStatus::Known(status) => println!(
                "  {repo:42} {:8} {:8} {:10} {:10}",
                mark(status.advanced_security),
                mark(status.codeql),
                mark(status.secret_scanning),
                mark(status.secret_push_protection)
            ),
            RepoStatus::Unknown => println!("  {repo:42} ⚠️  Could not check"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn preflight(gh: &GhCli, dry_run: bool) -> Result<()> {
    if dry_run {
        return Ok(());
    }
    gh.check_auth()?;
    Ok(())
}

/// Print the mode banner or ask for confirmation. Returns false when aborted.
fn confirm_run(dry_run: bool, dry_run_banner: &str, prompt: &str, expected: &str) -> Result<bool> {
    if dry_run {
        println!("{dry_run_banner}\n");
        return Ok(true);
    }
    println!();
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    if answer.trim().to_lowercase() != expected {
        println!("Aborted.");
        return Ok(false);
    }
    println!();
    Ok(true)
}

fn print_progress(done: usize, total: usize) {
    print!("\r  {}", render_progress(done, total, PROGRESS_WIDTH));
    let _ = io::stdout().flush();
}

fn print_report(
    report: &RunReport,
    verbose: bool,
    order: FailureOrder,
    summary_width: Option<usize>,
) {
    let width = summary_width.unwrap_or(25);
    if verbose {
        for result in report.sorted() {
            print_result(result, width);
        }
        println!();
    }

    if let Some(summary_width) = summary_width {
        for summary in report.summary_by_operation() {
            println!(
                "  {:summary_width$}  ✅ {}  ❌ {}",
                summary.operation, summary.succeeded, summary.failed
            );
        }
        println!();
    }

    let failures = report.failures(order);
    if !failures.is_empty() {
        println!("⚠️  Failures ({}):\n", failures.len());
        for result in failures {
            print_result(result, width);
        }
        println!();
    }
}

fn print_result(result: &OperationResult, width: usize) {
    println!(
        "  {:42} {:width$} {} {}",
        result.target,
        result.operation,
        outcome_marker(result.outcome),
        result.message
    );
}

fn print_totals(report: &RunReport) {
    info!(
        total = report.total(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        dry_run = report.dry_run,
        "run finished"
    );
    println!("✅ {}/{} succeeded", report.succeeded(), report.total());
    if report.has_failures() {
        println!("❌ {}/{} failed", report.failed(), report.total());
    }
}

fn outcome_marker(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Applied | Outcome::AlreadyApplied => "✅",
        Outcome::Planned => "🧪",
        Outcome::NotApplicable => "⚠️ ",
        Outcome::Failed => "❌",
        Outcome::Skipped => "⏭️ ",
    }
}

fn mark(enabled: bool) -> &'static str {
    if enabled { "✅" } else { "❌" }
}

fn dedupe<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

fn display_dir(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute.to_string_lossy().replace('\\', "/")
}
