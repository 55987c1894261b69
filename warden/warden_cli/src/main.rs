use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod fixture;

use commands::check::CheckArgs;
use commands::explain::ExplainArgs;
use commands::Verdict;

/// Exit code for a denied request
const EXIT_DENIED: u8 = 2;

/// Warden diagnostics
///
/// Decides permission requests against call chains described in TOML.
#[derive(Parser)]
#[clap(name = "warden", author, version, about)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. `warden::access=debug`)
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which domain of a chain would deny a request
    Explain(ExplainArgs),

    /// Decide a request with the gate, as a checked thread would
    Check(CheckArgs),
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match &cli.command {
        Commands::Explain(args) => commands::explain::execute(args),
        Commands::Check(args) => commands::check::execute(args),
    };

    match result {
        Ok(Verdict::Allowed) => ExitCode::SUCCESS,
        Ok(Verdict::Denied) => ExitCode::from(EXIT_DENIED),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
