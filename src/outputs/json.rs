//! JSON snapshot output.
//!
//! Each refresh round is written once, grouped by UTC date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── 08-00-00.json
//! ```

use crate::report::Dashboard;
use crate::utils::snapshot_stamp;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`Dashboard`] to `{json_output_dir}/{date}/{HH-MM-SS}.json`.
///
/// The date and time come from the dashboard's `generated_at`, so two
/// rounds within the same second overwrite each other.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_dashboard(
    dashboard: &Dashboard,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(dashboard)?;

    let (date, time) = snapshot_stamp(dashboard.generated_at);
    let full_json_dir = PathBuf::from(json_output_dir).join(date);

    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!("{time}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), feeds = dashboard.feeds.len(), "Wrote JSON snapshot");

    Ok(path)
}
