//! starsailors-status - Deployment status for one user
//!
//! Prints the current weekly window, eligibility verdict, streak breakdown,
//! visible content sets and skill progress.
//!
//! Usage:
//!   starsailors-status --user <uuid>
//!   starsailors-status --user <uuid> --automaton WeatherSatellite --mode stellar
//!   starsailors-status --user <uuid> --json

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use starsailors_core::{
    AutomatonKind, Config, Database, DeployRules, DeploymentEngine, DeploymentMode, Eligibility,
    UserId,
};

#[derive(Parser, Debug)]
#[command(name = "starsailors-status")]
#[command(about = "Show a user's deployment status for the current week")]
#[command(version)]
struct Args {
    /// User id (UUID)
    #[arg(long)]
    user: UserId,

    /// Automaton to check
    #[arg(long, default_value = "Telescope")]
    automaton: AutomatonKind,

    /// Deployment mode for the catalog listing
    #[arg(long, default_value = "planetary")]
    mode: DeploymentMode,

    /// SQLite database file (overrides `database.path`)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = starsailors_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    let db_path = args.database.unwrap_or_else(|| config.database_path());
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let rules = DeployRules::from_config(&config.deploy).context("invalid [deploy] section")?;
    let engine = DeploymentEngine::new(Arc::new(db), rules);

    let user = args.user;
    let now = Utc::now();
    let (report, sets, progress) = tokio::try_join!(
        engine.status(user, args.automaton, now),
        engine.visible_sets(user, args.mode),
        engine.skill_progress(user),
    )
    .context("failed to compute deployment status")?;

    tracing::info!(user_id = %user, automaton = %args.automaton, "Status printed");

    if args.json {
        let output = json!({
            "user": user,
            "report": report,
            "status": report.status(),
            "mode": args.mode,
            "visibleSets": sets,
            "skillProgress": progress,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let verdict = match report.eligibility {
        Eligibility::NeverDeployed => "may deploy (nothing deployed this week)",
        Eligibility::DeployedNoBonus => "already deployed",
        Eligibility::DeployedWithBonus => "may redeploy (bonus earned)",
    };
    let set_names: Vec<&str> = sets.iter().map(|s| s.as_str()).collect();

    println!("Deployment status");
    println!("=================");
    println!("User:       {}", user);
    println!("Automaton:  {}", report.automaton);
    println!(
        "Week:       {} .. {}",
        report.window.start.format("%Y-%m-%d %H:%M UTC"),
        report.window.end.format("%Y-%m-%d %H:%M UTC")
    );
    println!("Claims:     {} this week", report.baseline);
    println!(
        "Streak:     {} comments, {} upvotes -> bonus {}",
        report.streak.qualifying_comments, report.streak.qualifying_votes, report.streak.bonus
    );
    println!("Verdict:    {}", verdict);
    if let Some(message) = report.eligibility.message(report.automaton) {
        println!("Message:    {}", message);
    }
    println!("Catalog:    {} -> {}", args.mode, set_names.join(", "));
    println!(
        "Skill:      telescope {}, weather {}",
        progress.telescope, progress.weather
    );

    Ok(())
}
