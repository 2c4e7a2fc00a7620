use std::path::PathBuf;

use appsheet_nav_analysis::{Pipeline, PipelineReport, Stage, StageOutcome};
use appsheet_nav_store::{ArtifactLayout, PipelineConfig};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "appsheet-nav")]
#[command(version = PACKAGE_VERSION)]
#[command(about = "Navigation reachability analysis for exported AppSheet apps")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Directory holding the exported CSV artifacts and stage outputs.
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,
    /// Pipeline configuration YAML (defaults apply when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse action navigation formulas into action_targets.csv.
    Targets,
    /// Expand targets into view-to-view navigation_edges.csv.
    Edges,
    /// Traverse edges from the root views and list orphaned views.
    Reachability,
    /// List references to views that do not exist.
    Phantoms,
    /// Detect orphan actions, format rules and virtual columns.
    Orphans,
    /// Run every enabled stage in order and write run_manifest.json.
    Run(RunArgs),
    /// Show how a view is reached from a root view.
    Path(PathArgs),
    /// Write the default pipeline configuration.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Print the run report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct PathArgs {
    /// View name (case and quote style are ignored).
    view: String,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Output YAML path.
    #[arg(long, default_value = "pipeline.yaml")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match cli.command {
        Command::Targets => run_stage(&cli.global, Stage::Targets),
        Command::Edges => run_stage(&cli.global, Stage::Edges),
        Command::Reachability => run_stage(&cli.global, Stage::Reachability),
        Command::Phantoms => run_stage(&cli.global, Stage::Phantoms),
        Command::Orphans => run_stage(&cli.global, Stage::Orphans),
        Command::Run(args) => run_pipeline(&cli.global, args),
        Command::Path(args) => run_path(&cli.global, args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn build_pipeline(global: &GlobalArgs) -> Result<Pipeline, String> {
    let config = match &global.config {
        Some(path) => PipelineConfig::load(path)
            .map_err(|e| format!("failed to load config '{}': {e}", path.display()))?,
        None => PipelineConfig::default(),
    };
    debug!(dir = %global.dir.display(), "using artifact directory");
    Ok(Pipeline::new(ArtifactLayout::new(&global.dir), config))
}

fn run_stage(global: &GlobalArgs, stage: Stage) -> Result<(), String> {
    let pipeline = build_pipeline(global)?;
    let report = pipeline.run_stage(stage).map_err(|e| e.to_string())?;
    print!("{report}");
    Ok(())
}

fn run_pipeline(global: &GlobalArgs, args: RunArgs) -> Result<(), String> {
    let pipeline = build_pipeline(global)?;
    info!(version = PACKAGE_VERSION, dir = %global.dir.display(), "starting pipeline run");
    let report = pipeline.run().map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("failed to serialize report: {e}"))?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    let incomplete = report
        .outcomes
        .iter()
        .filter(|outcome| matches!(outcome, StageOutcome::Failed { .. } | StageOutcome::Skipped { .. }))
        .count();
    if incomplete > 0 {
        return Err(format!("{incomplete} stage(s) did not complete"));
    }
    Ok(())
}

fn print_report(report: &PipelineReport) {
    for outcome in &report.outcomes {
        match outcome {
            StageOutcome::Completed(stage_report) => print!("{stage_report}"),
            StageOutcome::Failed { stage, error } => println!("[{stage}]\n  failed: {error}"),
            StageOutcome::Skipped { stage, reason } => println!("[{stage}]\n  skipped: {reason}"),
            StageOutcome::Disabled { stage } => println!("[{stage}]\n  disabled"),
        }
    }
    if report.changed_artifacts.is_empty() {
        println!("Unchanged since previous run");
    } else {
        println!("Changed: {}", report.changed_artifacts.join(", "));
    }
}

fn run_path(global: &GlobalArgs, args: PathArgs) -> Result<(), String> {
    let pipeline = build_pipeline(global)?;
    let reach = pipeline.reach_path(&args.view).map_err(|e| e.to_string())?;
    match reach.path {
        Some(path) => println!("{}: {}", reach.view, path.join(" -> ")),
        None => println!("{}: not reachable from any root view", reach.view),
    }
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.output.exists() {
        return Err(format!(
            "refusing to overwrite existing file '{}'",
            args.output.display()
        ));
    }
    PipelineConfig::default()
        .save(&args.output)
        .map_err(|e| format!("failed to write '{}': {e}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
