// IdeaJar - idea capture with an embedded category-suggestion brain
// Module declarations

use std::io::Write;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

pub mod brain;
pub mod cli;
pub mod commands;
pub mod config;
pub mod repository;
pub mod state;

pub use brain::{Brain, BrainError, CategoryId};
pub use config::{AppConfig, BrainConfig};
pub use repository::{IdeaRepository, RepositoryError};

/// CLI entry point; returns the process exit code
pub fn run() -> i32 {
    let args = cli::IdeaJarArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let config = match &args.data_dir {
        Some(dir) => AppConfig::load(dir),
        None => AppConfig::load_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let repo = match IdeaRepository::open(&config) {
        Ok(repo) => repo,
        Err(e) => {
            log::error!("Failed to initialize database: {}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match commands::execute(&repo, args.command) {
        Ok(output) => {
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            };
            match rendered {
                Ok(text) => {
                    println!("{}", text);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e.message());
            1
        }
    }
}
