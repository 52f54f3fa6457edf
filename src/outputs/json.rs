//! JSON file output for fetched portal pages.
//!
//! Files are named after the portal page suffix, so fetching the same day
//! twice overwrites the earlier snapshot.

use crate::models::EventsResponse;
use crate::utils::PORTAL_PREFIX;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write an [`EventsResponse`] as pretty JSON into `json_output_dir`.
///
/// # Returns
///
/// The path of the written file: `{json_output_dir}/{Year}_{Month}_{Day}.json`.
///
/// # Errors
///
/// Directory creation, serialization and write failures.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, page = %response.page))]
pub async fn write_events(
    response: &EventsResponse,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(response)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = Path::new(json_output_dir).join(format!("{}.json", file_stem(&response.page)));
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), count = response.count, "Wrote events JSON file");

    Ok(path)
}

/// `Portal:Current_events/2024_March_5` -> `2024_March_5`.
fn file_stem(page: &str) -> String {
    page.strip_prefix(PORTAL_PREFIX)
        .unwrap_or(page)
        .replace(['/', ':'], "_")
}
