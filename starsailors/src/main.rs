//! starsailors-server - Star Sailors deployment service
//!
//! Serves `/deploy` and `/health` over HTTP/1.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use starsailors::auth::HeaderAuthenticator;
use starsailors::http::HttpServer;
use starsailors_core::{Config, Database, DeployRules, DeploymentEngine};

#[derive(Parser, Debug)]
#[command(name = "starsailors-server")]
#[command(about = "Serve the Star Sailors deployment API")]
#[command(version)]
struct Args {
    /// Address to listen on (overrides `server.bind`)
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file (overrides `database.path`)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Config file to load instead of the XDG default
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard = starsailors_core::logging::init_server(&config.logging)
        .context("failed to initialize logging")?;

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", bind))?;

    let db_path = args.database.unwrap_or_else(|| config.database_path());
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let rules = DeployRules::from_config(&config.deploy).context("invalid [deploy] section")?;
    tracing::info!(
        week_start = ?rules.week_start,
        base_quota = rules.base_quota,
        upgraded_quota = rules.upgraded_quota,
        "Deployment rules loaded"
    );

    let engine = DeploymentEngine::new(Arc::new(db), rules);
    let server = Arc::new(HttpServer::new(engine, HeaderAuthenticator, bind_addr));

    tokio::select! {
        result = server.run() => result.context("HTTP server failed")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
    }

    tracing::info!("starsailors-server shutting down");
    Ok(())
}
