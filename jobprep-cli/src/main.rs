//! jobprep CLI: runs the job-posting pipeline stages.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Validate, transform and model job-posting datasets
#[derive(Parser, Debug)]
#[command(name = "jobprep", version, about, long_about = None)]
struct Cli {
    /// Workspace directory; relative artifact paths resolve against it
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Check the raw dataset and write the validation status
    Validate,
    /// Build train/test features (or apply fitted encoders to new data)
    Transform {
        /// CSV to transform with previously fitted encoders instead of fitting
        #[arg(long, requires = "output")]
        input: Option<PathBuf>,
        /// Fitted encoders to apply (defaults to the configured encoders file)
        #[arg(long, requires = "input")]
        encoders: Option<PathBuf>,
        /// Where to write the transformed features
        #[arg(long, requires = "input")]
        output: Option<PathBuf>,
    },
    /// Fit the regression model on the training split
    Train,
    /// Score the model on the test split
    Evaluate,
    /// Run every stage in order
    Run,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default configuration to .jobprep/config.toml
    Init,
    /// Print the merged configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "jobprep", "jobprep")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "jobprep.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let result = commands::handle_command(cli.command, &workspace, cli.config.as_deref());
    if let Err(e) = &result {
        tracing::error!(error = %e, "jobprep failed");
    }
    result
}
