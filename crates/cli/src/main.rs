use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinematch_core::config::SanitizedConfig;
use cinematch_core::provider::{ReviewClient, StreamingCatalogClient, TmdbClient};
use cinematch_core::{
    load_config, validate_config, CanonicalMovie, Config, SearchOrchestrator, SqliteMovieStore,
};

#[derive(Parser)]
#[command(name = "cinematch")]
#[command(about = "Search movies across metadata, streaming and review providers")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "CINEMATCH_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search providers, reconcile and store the results
    Search {
        term: String,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,

        /// Print Prometheus metrics after the search
        #[arg(long)]
        metrics: bool,
    },
    /// Search stored movies by title without contacting providers
    Lookup {
        term: String,

        /// Treat the term as a regular expression
        #[arg(long)]
        regex: bool,
    },
    /// Show the loaded configuration with API keys redacted
    Config,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Commands::Search {
            term,
            json,
            metrics,
        } => {
            let orchestrator = build_orchestrator(&config)?;
            let outcome = orchestrator.search_with_outcome(&term).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_movies(&outcome.movies);
                info!(
                    path = outcome.path.as_str(),
                    duration_ms = outcome.duration_ms,
                    "Search finished"
                );
            }

            if metrics {
                eprintln!("{}", encode_metrics()?);
            }
        }
        Commands::Lookup { term, regex } => {
            let orchestrator = build_orchestrator(&config)?;
            let movies = orchestrator.search_pattern(&term, !regex)?;
            print_movies(&movies);
        }
        Commands::Config => {
            let sanitized = SanitizedConfig::from(&config);
            println!("{}", serde_json::to_string_pretty(&sanitized)?);
        }
    }

    Ok(())
}

fn build_orchestrator(config: &Config) -> Result<SearchOrchestrator> {
    info!("Database path: {:?}", config.database.path);
    let store = SqliteMovieStore::new(&config.database.path)
        .context("Failed to open movie store")?;

    let primary = TmdbClient::new(config.providers.tmdb.clone())
        .context("Failed to create TMDB client")?;
    let mut orchestrator =
        SearchOrchestrator::new(config.search.clone(), Arc::new(primary), Arc::new(store));

    if let Some(streaming) = &config.providers.streaming {
        let client = StreamingCatalogClient::new(streaming.clone())
            .context("Failed to create streaming catalog client")?;
        orchestrator = orchestrator.with_streaming(Arc::new(client));
        info!("Streaming catalog enabled");
    }

    if let Some(reviews) = &config.providers.reviews {
        let client = ReviewClient::new(reviews.clone()).context("Failed to create review client")?;
        orchestrator = orchestrator.with_reviews(Arc::new(client));
        info!("Review provider enabled");
    }

    Ok(orchestrator)
}

fn print_movies(movies: &[CanonicalMovie]) {
    if movies.is_empty() {
        println!("No movies found");
        return;
    }
    for movie in movies {
        match movie.review_score {
            Some(score) => println!("{}  [{}%]", movie.title_with_year(), score),
            None => println!("{}", movie.title_with_year()),
        }
    }
}

/// Encode core metrics as Prometheus text format.
fn encode_metrics() -> Result<String> {
    let registry = Registry::new();
    for metric in cinematch_core::metrics::all_metrics() {
        registry.register(metric)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
