use clap::Parser;
use grinder_stats::{config, source, ScanMode};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse the final statistics table of a Grinder out log and report the
/// per-test and total metrics.
#[derive(Parser, Debug)]
#[command(name = "grinder-stats", version, about)]
pub struct Cli {
    /// Report file, or a workspace directory to search for one
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Config file path
    #[arg(short, long, default_value = "grinder-stats.toml")]
    config: PathBuf,

    /// Scan mode (overrides config)
    #[arg(short, long, value_enum)]
    mode: Option<ScanMode>,

    /// Report glob used when PATH is a directory (overrides config)
    #[arg(short, long)]
    pattern: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Extra logging (scan progress, layout decisions)
    #[arg(short, long)]
    verbose: bool,

    /// Only errors and the result
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "report failed");
            let mut next = e.source();
            while let Some(cause) = next {
                tracing::error!(cause = %cause, "caused by");
                next = cause.source();
            }
            eprintln!("report failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = config::load_config(&cli.config)?;
    if let Some(mode) = cli.mode {
        cfg.scan.mode = mode;
    }
    if let Some(pattern) = &cli.pattern {
        cfg.report.pattern = pattern.clone();
    }

    let report = source::resolve_report(&cli.path, &cfg.report.pattern)?;

    let result = grinder_stats::parse_file(&report, &cfg.scan)?;

    match cli.format {
        OutputFormat::Text => println!("{result}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}
