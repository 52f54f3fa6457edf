//! Command-line interface definitions for wiki_current_events.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Upstream options can be provided via command-line flags, environment
//! variables or the YAML file named by `--config`.

use clap::{Parser, Subcommand};

/// Command-line arguments for wiki_current_events.
///
/// # Examples
///
/// ```sh
/// # Serve the JSON API
/// wiki_current_events serve --bind 127.0.0.1:3000
///
/// # Print today's top five events
/// wiki_current_events events --limit 5
///
/// # Save a past day's events to disk
/// wiki_current_events events --date 2024-03-05 --json-output-dir ./json
///
/// # Score some headlines
/// wiki_current_events sentiment "Ceasefire agreed" "Storm kills three"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// MediaWiki api.php endpoint
    #[arg(long, env = "WIKI_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Site origin used to resolve article links
    #[arg(long, env = "WIKI_SITE_URL", global = true)]
    pub site_url: Option<String>,

    /// User-Agent header sent upstream
    #[arg(long, env = "WIKI_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "BIND_ADDR")]
        bind: Option<String>,
    },

    /// Fetch one portal page and print its events as JSON
    Events {
        /// Portal date (YYYY-MM-DD); defaults to today in UTC
        #[arg(short, long)]
        date: Option<String>,

        /// Maximum number of events; non-numeric values fall back to 10
        #[arg(short, long)]
        limit: Option<String>,

        /// Also write the JSON to this directory
        #[arg(short, long)]
        json_output_dir: Option<String>,
    },

    /// Score texts against the sentiment lexicons
    Sentiment {
        /// Texts to score
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

impl Command {
    /// Bind address override, only meaningful for `serve`.
    pub fn bind(&self) -> Option<&str> {
        match self {
            Command::Serve { bind } => bind.as_deref(),
            _ => None,
        }
    }
}
