mod allocator;
mod cli;
mod error;
mod extractor;
mod ledger;
mod llm;
mod models;
mod parser;
mod pdf;
mod pipeline;
mod settings;
mod vision;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { folder, spreadsheet } => cli::init::run(folder, spreadsheet),
        Commands::Run { folder } => cli::run::run(folder.as_deref()),
        Commands::Categories => cli::categories::run(),
        Commands::Log { lines } => cli::log::run(lines),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
