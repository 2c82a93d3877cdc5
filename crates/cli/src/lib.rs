mod check;
mod serve;

use clap::{Parser, Subcommand};
use prompthub_core::config::Settings;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "prompthub",
    version,
    about = "Serve a catalog of versioned prompt templates over HTTP",
    long_about = "PromptHub indexes a directory of prompt definition files (YAML or JSON), \
                  keeps the index fresh on demand, on a timer or on file changes, and serves \
                  it through a small JSON API."
)]
pub struct Cli {
    /// Log verbosity: 0 = errors only, 1 = info, 2 = debug
    #[arg(short, long, global = true, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbose: u8,

    /// Path to the configuration file (defaults to ./prompthub.yaml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the prompt index and serve it over HTTP (default)
    Serve,
    /// Validate a prompt directory once and print every diagnostic
    #[command(
        long_about = "Runs a single load, validate and build pass over the prompt directory. \
                      Exits with status 1 when any file was rejected."
    )]
    Check {
        /// Directory to check. Defaults to the configured prompts_path.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

/// Parse arguments, set up logging and run the chosen command.
///
/// The logging guard lives until this returns, so buffered file output is
/// flushed before the process exits with the returned code.
pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Some(Commands::Check { .. }) => "check",
        _ => "server",
    };
    let _guard = prompthub_core::logging::init_logging(component, cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    execute(cli.command.unwrap_or(Commands::Serve), settings)
}

fn execute(command: Commands, settings: Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Serve => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve::run(settings))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { path } => {
            let root = path.unwrap_or_else(|| settings.prompts_path.clone());
            let report = check::run(&root)?;
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
