mod commands;
mod config;
mod credentials;
mod display;
mod error;
mod github;
mod logging;
mod permission;
mod reconcile;
mod report;

use clap::{ArgGroup, CommandFactory, Parser};
use commands::RunOptions;
use error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chperm",
    version,
    about = "Bulk-rewrite GitHub repository collaborator and organization member permissions"
)]
#[command(group(ArgGroup::new("mode").args(["org", "repos", "init"])))]
pub struct Cli {
    /// Rewrite the roles of organization members
    #[arg(long)]
    org: bool,

    /// Rewrite collaborator permissions on every repository of the owner
    #[arg(long)]
    repos: bool,

    /// Create a config file template and exit
    #[arg(long)]
    init: bool,

    /// Config file (default: ~/.config/chperm/config.json)
    #[arg(long, env = "CHPERM_CONFIG")]
    config: Option<PathBuf>,

    /// File that receives the run log
    #[arg(long, default_value = "chperm.log")]
    log_file: PathBuf,

    /// Report the changes that would be made without making them
    #[arg(long)]
    dry_run: bool,

    /// Output the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Mirror the log to stderr and show rate limit status
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !(cli.org || cli.repos || cli.init) {
        display::error("Choose one of --org, --repos or --init.");
        eprintln!("\n{}", Cli::command().render_usage());
        std::process::exit(2);
    }

    if let Err(e) = run(&cli).await {
        display::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };

    if cli.init {
        return commands::init::run(&config_path);
    }

    let _guard = logging::init(&cli.log_file, cli.verbose)?;

    let opts = RunOptions {
        config_path,
        dry_run: cli.dry_run,
        json: cli.json,
        verbose: cli.verbose,
    };

    let result = if cli.org {
        commands::org::run(&opts).await
    } else {
        commands::repos::run(&opts).await
    };

    if let Err(e) = &result {
        report::log_run_failure(e);
    }
    result
}
