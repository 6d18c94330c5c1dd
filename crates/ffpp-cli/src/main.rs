//! ffpp - FlashForge G-code post-processor
//!
//! Meant to be registered as a post-processing script in PrusaSlicer (or a
//! fork), which calls it with the path of the freshly sliced G-code.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ffpp_gcode::{PipelineMode, PostProcessSettings};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod env;
mod job;

use env::SlicerEnv;

#[derive(Parser)]
#[command(name = "ffpp", version)]
#[command(about = "Post-process slicer G-code for FlashForge printers", long_about = None)]
struct Cli {
    /// G-code file written by the slicer
    input: PathBuf,

    /// Destination the slicer reported (default: $SLIC3R_PP_OUTPUT_NAME, then the input path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rewrite passes to run
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// XY travel feed rate (mm/min), overrides the slicer's travel speed
    #[arg(long)]
    xy_travel_feed: Option<f64>,

    /// Z travel feed rate (mm/min), overrides the slicer's Z travel speed
    #[arg(long)]
    z_travel_feed: Option<f64>,

    /// Do not prepend the post-processing header
    #[arg(long)]
    no_header: bool,

    /// Exit without waiting for Enter
    #[arg(long)]
    no_wait: bool,

    /// Print the run report as JSON
    #[arg(long)]
    report: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Standard,
    LegacyStartCode,
    LegacyZFeed,
}

impl From<Mode> for PipelineMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Standard => PipelineMode::Standard,
            Mode::LegacyStartCode => PipelineMode::LegacyStartCode,
            Mode::LegacyZFeed => PipelineMode::LegacyZFeed,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Report before waiting so the message is on screen while the console stays open.
    let code = match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    };

    if !cli.no_wait {
        wait_for_enter();
    }
    code
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let slicer_env = SlicerEnv::from_env()?;
    let settings = resolve_settings(cli, &slicer_env)?;

    let destination = cli
        .output
        .clone()
        .or_else(|| slicer_env.output_name.clone())
        .unwrap_or_else(|| cli.input.clone());

    let outcome = job::run_job(&cli.input, &destination, settings)?;

    if outcome.passed() {
        println!("Post-processing completed and gcode passed validation checks!");
    } else {
        println!("Post-processing failed validation checks!");
        for issue in &outcome.report.issues {
            println!("  line {}: {:?}: {}", issue.line, issue.kind, issue.text);
        }
    }
    println!("File available at: {}", outcome.path.display());

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    }
    Ok(())
}

/// Defaults < settings file < slicer environment < command line.
fn resolve_settings(cli: &Cli, slicer_env: &SlicerEnv) -> Result<PostProcessSettings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PostProcessSettings::from_toml_str(&text)
                .with_context(|| format!("invalid settings file {}", path.display()))?
        }
        None => PostProcessSettings::default(),
    };

    slicer_env.apply(&mut settings);

    if let Some(mode) = cli.mode {
        settings.mode = mode.into();
    }
    if let Some(feed) = cli.xy_travel_feed {
        settings.feed_rates.xy_travel = feed;
    }
    if let Some(feed) = cli.z_travel_feed {
        settings.feed_rates.z_travel = feed;
    }
    if cli.no_header {
        settings.add_header = false;
    }

    settings.validate()?;
    Ok(settings)
}

fn wait_for_enter() {
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
