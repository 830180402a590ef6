use clap::Parser;
use tracing_subscriber::EnvFilter;

use agentwallet::cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen => agentwallet::cli::commands::keygen::execute(),
        Commands::Reveal { ref blob } => agentwallet::cli::commands::reveal::execute(blob),
        Commands::Approve { ref message } => agentwallet::cli::commands::approve::execute(message),
    };

    if let Err(e) = result {
        agentwallet::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
