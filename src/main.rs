mod archive;
mod cli;
mod error;
mod fmt;
mod gemini;
mod models;
mod qa;
mod session;
mod settings;
mod summary;

use clap::Parser;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Summary { archive } => cli::summary::run(&archive),
        Commands::Report { archive } => cli::report::run(&archive),
        Commands::Ask {
            archive,
            question,
            structured,
        } => cli::ask::run(&archive, &question, structured),
        Commands::Shell { archive } => cli::shell::run(archive.as_deref()),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
