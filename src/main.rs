mod aggregator;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod registry;
mod reports;
mod settings;
mod sheet;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,oborot=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Status => cli::status::run(),
        Commands::Import { file } => cli::import::run(&file),
        Commands::Files => cli::files::run(),
        Commands::Report { file_id, json } => cli::report::run(file_id, json),
        Commands::Show { file_id } => cli::show::run(file_id),
        Commands::Accounts => cli::accounts::list(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "oborot", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
