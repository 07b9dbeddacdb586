//! dermsql CLI - ask an LLM SQL agent about the dermatologist directory

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dermsql")]
#[command(version)]
#[command(about = "Ask natural-language questions about a dermatologist directory")]
#[command(long_about = r#"
dermsql keeps a small SQLite directory of dermatologists and answers
questions about it through a Gemini-backed SQL agent.

Example usage:
  dermsql init
  dermsql serve --port 8501
  dermsql ask --question "Show all active dermatologists in New York"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print answers, warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Database location overrides shared by several commands
#[derive(Args, Debug, Default)]
pub struct DatabaseArgs {
    /// Persistent database path
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Bundled database copied on first run
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Fail instead of creating a sample database when no seed exists
    #[arg(long)]
    no_synthesize: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the question page and JSON API
    Serve {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Model name
        #[arg(short, long)]
        model: Option<String>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Make sure the database exists, then exit
    Provision {
        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Ask one question and print the answer
    Ask {
        /// Question in plain language
        #[arg(short, long)]
        question: String,

        #[command(flatten)]
        db: DatabaseArgs,

        /// Model name
        #[arg(short, long)]
        model: Option<String>,

        /// Also print the SQL that was run
        #[arg(long)]
        sql: bool,
    },

    /// List the dermatologists in the database
    Records {
        /// Persistent database path
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dermsql::output::set_quiet(cli.quiet);

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        dermsql::ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(dermsql::config::default_config_path);
    let mut config = dermsql::config::load_config(Some(config_path.as_path()))?;

    match cli.command {
        Commands::Serve { db, model, host, port } => {
            commands::apply_database_args(&mut config, &db);
            if let Some(model) = model {
                config.model.name = model;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::run_serve(&config).await?;
        }

        Commands::Provision { db } => {
            commands::apply_database_args(&mut config, &db);
            commands::run_provision(&config)?;
        }

        Commands::Ask { question, db, model, sql } => {
            commands::apply_database_args(&mut config, &db);
            if let Some(model) = model {
                config.model.name = model;
            }
            commands::run_ask(&config, &question, sql).await?;
        }

        Commands::Records { database, json } => {
            if let Some(path) = database {
                config.database.path = path;
            }
            commands::run_records(&config, json)?;
        }

        Commands::Init { force } => {
            commands::run_init(&config_path, force)?;
        }

        Commands::Version => commands::run_version(),
    }

    Ok(())
}
