//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! command-line flags and environment variables (see [`crate::cli`]).
//!
//! ```yaml
//! bind: 127.0.0.1:8080
//! api_url: https://de.wikipedia.org/w/api.php
//! site_url: https://de.wikipedia.org
//! user_agent: my-portal-mirror/1.0 (ops@example.com)
//! timeout_secs: 10
//! ```

use crate::cli::Cli;
use serde::Deserialize;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_SITE_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration shared by the server and the one-shot commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Socket address the HTTP server listens on.
    pub bind: String,
    /// MediaWiki `api.php` endpoint.
    pub api_url: String,
    /// Origin that relative article links are resolved against.
    pub site_url: String,
    /// `User-Agent` sent upstream; Wikimedia rejects requests without one.
    pub user_agent: String,
    /// Whole-request timeout for the upstream fetch.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            user_agent: format!(
                "{}/{} (+{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                DEFAULT_SITE_URL
            ),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Parse settings from YAML; missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Load the optional YAML file, then apply flag and environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid YAML for
    /// [`Settings`].
    #[instrument(level = "info", skip(cli), fields(config = ?cli.config))]
    pub async fn load(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let mut settings = match &cli.config {
            Some(path) => {
                let yaml = fs::read_to_string(path).await?;
                info!(path = %path, "Loaded configuration file");
                Self::from_yaml(&yaml)?
            }
            None => Self::default(),
        };
        settings.apply_cli(cli);
        Ok(settings)
    }

    /// Overwrite fields that were given on the command line or in the environment.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(site_url) = &cli.site_url {
            self.site_url = site_url.clone();
        }
        if let Some(user_agent) = &cli.user_agent {
            self.user_agent = user_agent.clone();
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(bind) = cli.command.bind() {
            self.bind = bind.to_string();
        }
    }
}
