use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;
use confmerge_core::{MergeStrategy, MergeSummary, ProcessReport};
use confmerge_db::{DatabaseError, RunSettings, SchemaDatabase};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "confmerge", version)]
#[command(about = "Merge configuration fragments and check symbol dependencies")]
struct Cli {
    /// Symbol schema file (.json, .yml or .yaml).
    schema: PathBuf,
    /// Configuration fragments, merged in the order given.
    #[arg(required = true)]
    conf: Vec<PathBuf>,
    /// Output file for the merged configuration.
    #[arg(short, long, default_value = "out.config")]
    output: PathBuf,
    /// Try to automatically fix unmet dependencies.
    #[arg(short = 'f', long)]
    try_fix_deps: bool,
    /// Maximum number of dependency repair rounds.
    #[arg(long)]
    max_rounds: Option<usize>,
    /// YAML run settings; flags given on the command line take precedence.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Let later fragments override earlier ones instead of the reverse.
    #[arg(long)]
    prefer_last: bool,
    /// Write a JSON report of merges and repairs to this path.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Per-fragment merge counts in the JSON report.
#[derive(Debug, Serialize)]
struct FragmentReport {
    path: PathBuf,
    #[serde(flatten)]
    summary: MergeSummary,
}

#[derive(Debug, Serialize)]
struct RunReport {
    schema: PathBuf,
    output: PathBuf,
    settings: RunSettings,
    fragments: Vec<FragmentReport>,
    dependencies: ProcessReport,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn print_banner(msg: &str) {
    println!("{:-<100}", format!("-- {msg} "));
}

fn resolve_settings(cli: &Cli) -> Result<RunSettings, String> {
    let mut settings = match &cli.settings {
        Some(path) => RunSettings::load(path)
            .map_err(|e| format!("failed to load settings '{}': {e}", path.display()))?,
        None => RunSettings::default(),
    };

    if cli.try_fix_deps {
        settings.fix_dependencies = true;
    }
    if let Some(rounds) = cli.max_rounds {
        settings.max_rounds = rounds;
    }
    if cli.prefer_last {
        settings.merge_strategy = MergeStrategy::PreferOverlay;
    }
    debug!(?settings, "resolved run settings");
    Ok(settings)
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = resolve_settings(&cli)?;

    print_banner(&format!("Loading '{}'", cli.schema.display()));
    let mut db = SchemaDatabase::from_file(&cli.schema)
        .and_then(|db| db.with_prefix(&settings.config_prefix))
        .map_err(|e| format!("failed to load schema '{}': {e}", cli.schema.display()))?
        .with_strategy(settings.merge_strategy);

    let mut fragments = Vec::with_capacity(cli.conf.len());
    for path in &cli.conf {
        print_banner(&format!("Loading '{}'", path.display()));
        let summary = db
            .load_config(path)
            .map_err(|e| format!("failed to load '{}': {e}", path.display()))?;
        fragments.push(FragmentReport {
            path: path.clone(),
            summary,
        });
    }

    print_banner("Checking dependencies");
    if settings.fix_dependencies {
        print_banner("Attempting to fix dependencies");
    }
    let dependencies = db
        .check(&settings.process_options())
        .map_err(describe_check_failure)?;

    print_banner(&format!("Generating '{}'", cli.output.display()));
    db.write_config(&cli.output)
        .map_err(|e| format!("failed to write '{}': {e}", cli.output.display()))?;

    summarize(&dependencies);

    if let Some(path) = &cli.report {
        let report = RunReport {
            schema: cli.schema.clone(),
            output: cli.output.clone(),
            settings,
            fragments,
            dependencies,
        };
        write_report(path, &report)?;
    }

    Ok(())
}

fn describe_check_failure(err: DatabaseError) -> String {
    match err {
        DatabaseError::Dependency(inner) => format!("{inner}, aborting"),
        other => other.to_string(),
    }
}

fn summarize(report: &ProcessReport) {
    if report.unmet.is_empty() {
        println!("All dependencies met.");
    } else if report.repaired {
        println!(
            "Fixed {} unmet dependencies with {} change(s) in {} round(s).",
            report.unmet.len(),
            report.changes.len(),
            report.rounds
        );
    } else {
        println!(
            "{} unmet dependencies left in place; rerun with --try-fix-deps to repair.",
            report.unmet.len()
        );
    }
}

fn write_report(path: &Path, report: &RunReport) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("failed to serialize report: {e}"))?;
    fs::write(path, json).map_err(|e| format!("failed to write '{}': {e}", path.display()))
}
