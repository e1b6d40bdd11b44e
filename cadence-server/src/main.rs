mod api;
mod config;
mod db;
mod error;
mod models;
mod schema;
mod services;

use anyhow::Result;
use axum::Router;

use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::DbPool;
use crate::services::{captions, materializer::MaterializeService, rotation::AssetRotator};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub materializer: Arc<MaterializeService>,
}

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, author = "CADENCE AUTHORS", about = "Cadence Server\nLicensed under AGPLv3\nCreated by CADENCE AUTHORS", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Generate a default configuration template to stdout
    #[arg(long)]
    generate_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Materialize one month of posts for a brand and print the summary
    Materialize {
        /// Brand id
        #[arg(long)]
        brand: i32,
        /// First day of the target month, e.g. 2024-04-01
        #[arg(long)]
        month: String,
        /// Regenerate drafts for slots that already have post jobs
        #[arg(long)]
        force: bool,
    },
}

fn run_onboarding() -> Result<Config> {
    use dialoguer::{theme::ColorfulTheme, Input, Select};

    println!("Welcome to Cadence Server!");
    println!("It looks like you don't have a configuration file yet.");
    println!("Let's get you set up.\n");

    let host: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server Host")
        .default("0.0.0.0".to_string())
        .interact_text()?;

    let port: u16 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server Port")
        .default(8080)
        .interact_text()?;

    let db_url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Database URL")
        .default("sqlite://cadence.db".to_string())
        .interact_text()?;

    let default_timezone: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Timezone for brands without one")
        .default("UTC".to_string())
        .validate_with(|zone: &String| -> Result<(), String> {
            services::timezone::parse_zone(zone)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    let providers = ["template", "openai", "ollama", "anthropic"];
    let provider = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Caption generator")
        .items(&providers)
        .default(0)
        .interact()?;

    let config_content = format!(
        r#"[server]
host = "{}"
port = {}

[database]
url = "{}"

[logging]
level = "info"

[scheduler]
default_timezone = "{}"
rotation_history_cap = 50
require_assets = false
max_hashtags = 10

[generator]
provider_type = "{}"
"#,
        host, port, db_url, default_timezone, providers[provider]
    );

    println!("\nGenerating configuration file: server-config.toml");
    std::fs::write("server-config.toml", &config_content)?;
    println!("Configuration saved successfully!");
    if providers[provider] != "template" {
        println!("Add endpoint_url / model_name / api_key under [generator] before starting.");
    }
    println!("----------------------------------------\n");

    let config: Config = toml::from_str(&config_content)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::default_template());
        return Ok(());
    }

    // Determine config path
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| "server-config.toml".to_string());

    // Only offer onboarding when no path was given and someone is at the terminal.
    if std::fs::metadata(&config_path).is_err() && cli.config.is_none() && console::user_attended()
    {
        if let Err(e) = run_onboarding() {
            eprintln!("Onboarding failed: {}", e);
            std::process::exit(1);
        }
    }

    let effective_config_path = if std::fs::metadata(&config_path).is_ok() {
        config_path
    } else {
        eprintln!("Error: Configuration file '{}' not found.", config_path);
        eprintln!("Run with --generate-config to see a template.");
        std::process::exit(1);
    };

    // Load configuration
    let config = Config::load(&effective_config_path)?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cadence_server={},tower_http=debug", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Loaded configuration from {}", effective_config_path);

    // Setup database
    let db_pool = db::create_pool(&config.database.url)?;
    db::run_migrations(&mut db_pool.get()?)?;
    tracing::info!("Database initialized");

    let caption_generator = captions::generator_from_config(&config.generator)?;
    let rotator = Arc::new(AssetRotator::new(config.scheduler.rotation_history_cap));
    let materializer = Arc::new(MaterializeService::new(
        db_pool.clone(),
        rotator,
        caption_generator,
        config.scheduler.clone(),
    ));

    // Create app state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config),
        materializer,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Materialize {
            brand,
            month,
            force,
        } => {
            let summary = state
                .materializer
                .materialize_month(brand, &month, force)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !summary.errors.is_empty() {
                std::process::exit(2);
            }
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    // Build router
    let app = Router::new()
        .nest("/api", api::routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {} (HTTP)", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
