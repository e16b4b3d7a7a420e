mod compare;
mod interactive;
mod logging;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "foodcmp-cli")]
#[command(about = "Compare food deals across delivery providers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Force debug logging regardless of RUST_LOG
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also append logs to this file (defaults to FOODCMP_LOG_FILE)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every enabled provider, pick the best deal, and add it to the cart
    Run(RunArgs),
    /// List providers from the providers file
    Providers {
        /// Providers file (defaults to FOODCMP_PROVIDERS_PATH)
        #[arg(long)]
        providers: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Comma-separated food items, e.g. "pizza,burger"
    #[arg(
        long,
        required_unless_present_any = ["request", "interactive"],
        conflicts_with_all = ["request", "interactive"]
    )]
    pub items: Option<String>,

    /// Prompt for the items and filters on the terminal
    #[arg(long, conflicts_with_all = ["request", "rating", "price_min", "price_max", "max_results", "location"])]
    pub interactive: bool,

    /// Load the whole search request from a JSON or YAML file
    #[arg(long, conflicts_with_all = ["rating", "price_min", "price_max", "max_results", "location"])]
    pub request: Option<PathBuf>,

    /// Minimum rating (defaults to FOODCMP_DEFAULT_MIN_RATING)
    #[arg(long)]
    pub rating: Option<f64>,

    #[arg(long)]
    pub price_min: Option<f64>,

    #[arg(long)]
    pub price_max: Option<f64>,

    /// Results kept per provider (defaults to FOODCMP_DEFAULT_MAX_RESULTS)
    #[arg(long)]
    pub max_results: Option<u32>,

    #[arg(long)]
    pub location: Option<String>,

    /// Providers file (defaults to FOODCMP_PROVIDERS_PATH)
    #[arg(long)]
    pub providers: Option<PathBuf>,

    /// Search and select only; never touch a cart
    #[arg(long)]
    pub dry_run: bool,

    /// Write the JSON report to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the JSON report to stdout instead of the summary
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = foodcmp_core::load_app_config()?;

    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    logging::init(cli.verbose, &config, log_file)?;

    match cli.command {
        Commands::Run(args) => compare::run_compare(&config, &args).await,
        Commands::Providers { providers } => {
            let path = providers.unwrap_or_else(|| config.providers_path.clone());
            compare::list_providers(&path)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
