//! # wiki_current_events
//!
//! Serves the daily Wikipedia "current events" portal as JSON and scores
//! text against a small sentiment lexicon.
//!
//! ## Features
//!
//! - Fetches `Portal:Current_events/<Year>_<Month>_<Day>` through the
//!   MediaWiki parse API and extracts its top-level bullets
//! - Exposes the events over HTTP with a 300 second public cache hint
//! - Scores texts by counting positive and negative keywords
//! - One-shot `events` and `sentiment` commands for scripting
//!
//! ## Usage
//!
//! ```sh
//! wiki_current_events serve --bind 0.0.0.0:3000
//! wiki_current_events events --date 2024-03-05 --limit 5
//! wiki_current_events sentiment "Ceasefire agreed" "Storm kills three"
//! ```

use clap::Parser;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod clock;
mod config;
mod error;
mod models;
mod outputs;
mod scrapers;
mod sentiment;
mod utils;

use api::AppState;
use cli::{Cli, Command};
use clock::{Clock, SystemClock};
use config::Settings;
use outputs::json as json_output;
use scrapers::wikipedia::PortalClient;
use utils::{ensure_writable_dir, parse_limit};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::load(&args).await?;
    info!(
        api_url = %settings.api_url,
        site_url = %settings.site_url,
        timeout_secs = settings.timeout_secs,
        "Settings resolved"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match args.command {
        Command::Serve { .. } => {
            let state = AppState {
                portal: PortalClient::new(&settings)?,
                clock,
            };
            api::serve(&settings, state).await?;
        }
        Command::Events {
            date,
            limit,
            json_output_dir,
        } => {
            run_events(
                &settings,
                clock.as_ref(),
                date.as_deref(),
                limit.as_deref(),
                json_output_dir.as_deref(),
            )
            .await?;
        }
        Command::Sentiment { texts } => {
            let results: Vec<_> = texts.iter().map(|t| sentiment::score(t)).collect();
            let aggregate = sentiment::analyze(&texts);
            let out = json!({ "results": results, "aggregate": aggregate });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}

/// Fetch one portal page, print it, and optionally save it.
#[instrument(level = "info", skip(settings, clock))]
async fn run_events(
    settings: &Settings,
    clock: &dyn Clock,
    date: Option<&str>,
    limit: Option<&str>,
    json_output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    // Fail on an unwritable directory before spending a request.
    if let Some(dir) = json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let portal = PortalClient::new(settings)?;
    let response = portal
        .current_events(date, parse_limit(limit), clock)
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(dir) = json_output_dir {
        let path = json_output::write_events(&response, dir).await?;
        info!(path = %path.display(), "Saved events");
    }
    Ok(())
}
