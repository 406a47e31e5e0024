//! uno-sw entry point.
//!
//! Hosts one worker instance against the on-disk cache store and the real
//! network. Logging goes to stderr as JSON; command output goes to stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uno_client::{FetchClient, FetchConfig};
use uno_core::{CacheDb, CacheStore, Request, RequestMode, WorkerConfig};
use uno_worker::ServiceWorker;

/// Offline cache worker for the uno web app
#[derive(Parser, Debug)]
#[command(name = "uno-sw")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Precache the app shell into the current generation
    Install,

    /// Delete stale generations and take control
    Activate,

    /// Answer one request the way the worker would
    Fetch {
        /// URL, absolute or relative to the configured scope
        url: String,

        /// Treat the request as a top-level navigation
        #[arg(long)]
        navigate: bool,

        /// Request destination (image, script, document, ...)
        #[arg(long, default_value = "")]
        destination: String,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,
    },

    /// List cache generations and their entries
    Caches,
}

#[derive(Serialize)]
struct FetchOutput<'a> {
    url: &'a str,
    route: &'a str,
    status: u16,
    bytes: usize,
}

#[derive(Serialize)]
struct Generation {
    name: String,
    keys: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = WorkerConfig::load().context("loading configuration")?;
    tracing::info!(cache = %config.cache_version, images = %config.image_cache, db = %config.db_path.display(), "starting uno-sw");

    let store = Arc::new(
        CacheDb::open(&config.db_path)
            .await
            .with_context(|| format!("opening cache store at {}", config.db_path.display()))?,
    );
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = ServiceWorker::new(config, store.clone(), network)?;

    match cli.command {
        Commands::Install => {
            worker.install().await?;
            println!("installed {}", worker.config().cache_version);
        }
        Commands::Activate => {
            let deleted = worker.activate().await?;
            println!("{}", serde_json::to_string_pretty(&deleted)?);
        }
        Commands::Fetch { url, navigate, destination, method } => {
            let url = worker.config().scope_url()?.join(&url).with_context(|| format!("resolving {url}"))?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes()).context("parsing method")?;
            let mut request = Request::get(url).with_method(method).with_destination(destination.parse()?);
            if navigate {
                request = request.with_mode(RequestMode::Navigate);
            }

            let route = worker.route(&request);
            let response = worker.handle_fetch(&request).await?;
            let output = FetchOutput {
                url: request.url.as_str(),
                route: route.as_str(),
                status: response.status.as_u16(),
                bytes: response.body.len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Caches => {
            let mut generations = Vec::new();
            for name in store.cache_names().await? {
                let keys = store.keys(&name).await?;
                generations.push(Generation { name, keys });
            }
            println!("{}", serde_json::to_string_pretty(&generations)?);
        }
    }

    worker.settle().await;
    Ok(())
}
