use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dermsql::config::{self, DermsqlConfig};
use dermsql::secrets::{EnvSecrets, SecretChain, SecretsFile};
use dermsql::server::{self, AppState};
use dermsql::ui::{self, Icons};
use dermsql::{Credentials, DatabaseProvisioner, DermatologistStore, GeminiClient, ProvisionOutcome, SqlAgent};
use owo_colors::OwoColorize;
use tokio::sync::Mutex;

use crate::DatabaseArgs;

/// Fold command-line overrides into the loaded config
pub fn apply_database_args(config: &mut DermsqlConfig, args: &DatabaseArgs) {
    if let Some(path) = &args.database {
        config.database.path = path.clone();
    }
    if let Some(seed) = &args.seed {
        config.database.seed = Some(seed.clone());
    }
    if args.no_synthesize {
        config.database.synthesize = false;
    }
}

pub fn run_provision(config: &DermsqlConfig) -> anyhow::Result<ProvisionOutcome> {
    let provisioner = DatabaseProvisioner::new(config.database.seed.clone(), config.database.path.clone())
        .synthesize(config.database.synthesize);
    let outcome = provisioner.provision()?;
    if let (ProvisionOutcome::Seeded { .. }, Some(seed)) = (&outcome, &config.database.seed) {
        ui::warn(&format!("No seed database at {}, created sample data instead", seed.display()));
    }
    ui::status(Icons::DATABASE, "Database", &provisioner.target().display().to_string());
    ui::success(&format!("Database ready: {}", outcome));
    Ok(outcome)
}

/// Credentials, database and model client, in that order. Any failure is fatal.
pub fn build_agent(config: &DermsqlConfig) -> anyhow::Result<SqlAgent> {
    let mut chain = SecretChain::new().with(EnvSecrets);
    if let Some(file) = &config.secrets.file {
        chain = chain.with(SecretsFile::load(file)?);
    }
    let credentials = Credentials::load(&chain)
        .context("API key not found. Please configure it in your environment or secrets file")?;

    run_provision(config)?;
    let store = DermatologistStore::open(&config.database.path)
        .with_context(|| format!("Could not connect to the database at '{}'", config.database.path.display()))?;
    store.ensure_queryable()?;
    ui::success("Successfully connected to the database.");

    let client = GeminiClient::new(&config.model, &credentials)
        .context("Failed to initialize the language model. Check your API key and model name")?;
    tracing::info!("Using model {}", client.model());

    Ok(SqlAgent::new(
        Arc::new(client),
        Arc::new(Mutex::new(store)),
        config.agent.clone(),
    ))
}

pub async fn run_serve(config: &DermsqlConfig) -> anyhow::Result<()> {
    ui::header("Dermatologist SQL Agent");
    let agent = build_agent(config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    let state = Arc::new(AppState {
        agent,
        database_path: config.database.path.clone(),
        model: config.model.name.clone(),
    });
    server::start_server(addr, state).await
}

pub async fn run_ask(config: &DermsqlConfig, question: &str, show_sql: bool) -> anyhow::Result<()> {
    let agent = build_agent(config)?;

    let spinner = ui::Spinner::new("Generating answer...");
    let result = agent.answer(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            ui::section(&format!("{} Answer", Icons::ROBOT));
            println!("{}", answer.text.style(ui::theme().answer.clone()));
            if show_sql {
                println!();
                println!("{}", answer.sql.style(ui::theme().sql.clone()));
            }
            Ok(())
        }
        Err(e) => {
            tracing::debug!("Answer failed: {:?}", e);
            anyhow::bail!(e.user_message())
        }
    }
}

pub fn run_records(config: &DermsqlConfig, json: bool) -> anyhow::Result<()> {
    let store = DermatologistStore::open(&config.database.path)?;
    let records = store.all_records()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let stats = store.stats()?;
    let (total, active, cities) = (
        stats.records.to_string(),
        stats.active.to_string(),
        stats.cities.to_string(),
    );
    ui::section(&format!("{} Dermatologists ({})", Icons::STATS, config.database.path.display()));
    println!("{}", ui::records_table(&records));
    println!(
        "{}",
        ui::stats_table(&[
            ("Records", total.as_str()),
            ("Active", active.as_str()),
            ("Cities", cities.as_str()),
        ])
    );
    Ok(())
}

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    config::write_config(path, &DermsqlConfig::default(), force)?;
    ui::success(&format!("Wrote {}", path.display()));
    ui::info("Next", "set GOOGLE_API_KEY, then run `dermsql serve`");
    Ok(())
}

pub fn run_version() {
    println!(
        "{} {}",
        "dermsql".bold().style(ui::theme().info.clone()),
        env!("CARGO_PKG_VERSION")
    );
}
