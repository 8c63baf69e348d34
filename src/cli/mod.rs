//! Command-line interface for the curve-cleaning pipeline.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::processors::batch::{self, OutputPaths};
use crate::processors::pipeline::CurveCleaner;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "indent-curves")]
#[command(about = "Clean and plot mechanical-testing instrument exports", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Defaults to `batch` on the current directory
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every matching export in a directory
    Batch(BatchArgs),

    /// Process a single export file
    Clean {
        /// Input spreadsheet or CSV export
        input: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Destination file
        #[arg(default_value = "indent-curves.yaml")]
        path: PathBuf,
    },
}

#[derive(Args, Default)]
struct BatchArgs {
    /// Directory containing exports
    directory: Option<PathBuf>,

    /// Wildcard pattern for input file names
    #[arg(short, long)]
    pattern: Option<String>,

    /// Abort on the first file that fails
    #[arg(long)]
    fail_fast: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Default)]
struct OutputArgs {
    /// Directory for outputs (defaults to next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only write the text export, skip PNG rendering
    #[arg(long)]
    no_plots: bool,
}

impl OutputArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.output_dir {
            config.batch.output_dir = Some(dir.clone());
        }
        if self.no_plots {
            config.plot.enabled = false;
        }
    }
}

/// Create a progress bar over input files
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            let head: String = value.chars().take(35).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<19}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    let succeeded = match cli.command.unwrap_or(Commands::Batch(BatchArgs::default())) {
        Commands::Batch(args) => cmd_batch(args, config),
        Commands::Clean { input, output } => cmd_clean(&input, &output, config),
        Commands::InitConfig { path } => cmd_init_config(&path, &config),
    };

    if !succeeded {
        std::process::exit(1);
    }
}

fn cmd_batch(args: BatchArgs, mut config: PipelineConfig) -> bool {
    let start = Instant::now();

    if let Some(pattern) = args.pattern {
        config.batch.pattern = pattern;
    }
    if args.fail_fast {
        config.batch.fail_fast = true;
    }
    args.output.apply(&mut config);

    let directory = args.directory.unwrap_or_else(|| PathBuf::from("."));

    println!(
        "Processing '{}' in {}",
        config.batch.pattern,
        directory.display()
    );

    let progress = create_progress_bar();
    let result = batch::run_batch(&directory, &config, &progress);
    progress.finish_and_clear();

    match result {
        Ok(report) => {
            for failed in &report.failed {
                println!("  FAILED {}: {}", failed.input.display(), failed.error);
            }

            print_summary(
                "Batch Complete",
                &[
                    ("Directory", directory.display().to_string()),
                    ("Pattern", config.batch.pattern.clone()),
                    ("Files found", report.found.to_string()),
                    ("Processed", report.processed.len().to_string()),
                    ("Failed", report.failed.len().to_string()),
                    ("Rows kept", report.rows_kept().to_string()),
                    ("Plots", config.plot.enabled.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
            report.is_success()
        }
        Err(e) => {
            error!("Batch failed: {:#}", e);
            false
        }
    }
}

fn cmd_clean(input: &Path, output: &OutputArgs, mut config: PipelineConfig) -> bool {
    let start = Instant::now();
    output.apply(&mut config);

    println!("Cleaning {}", input.display());

    let cleaner = CurveCleaner::new(&config.units, &config.layout);

    match batch::process_file(input, &cleaner, &config) {
        Ok(summary) => {
            let paths = OutputPaths::for_input(input, config.batch.output_dir.as_deref());
            print_summary(
                "Cleaning Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Rows read", summary.rows_read.to_string()),
                    ("Rows kept", summary.rows_kept.to_string()),
                    ("Invalid time rows", summary.invalid_rows.to_string()),
                    ("Out-of-order rows", summary.non_monotonic_rows.to_string()),
                    ("Data file", paths.data.display().to_string()),
                    ("Files written", summary.outputs.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
            true
        }
        Err(e) => {
            error!("Cleaning failed: {:#}", e);
            false
        }
    }
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) -> bool {
    match config.to_yaml(path) {
        Ok(()) => {
            println!("Wrote configuration to {}", path.display());
            true
        }
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            false
        }
    }
}
