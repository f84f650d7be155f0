use crate::claim::ActivityClaim;
use crate::common::config::Config;
use crate::common::metrics;
use crate::common::nrc_client::ActivityApi;
use crate::track::{ActivityRecord, AlignError, TrackDocument, align_streams, gpx};
use anyhow::{Context, Result};
use function_timer::time;
use sanitize_filename::sanitize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Where the activity JSON to convert comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// The configured raw directory.
    Default,
    /// Explicit files and/or directories.
    Paths(Vec<PathBuf>),
}

/// Outcome of the remote phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSummary {
    pub listed: usize,
    pub pages: usize,
    pub listing_complete: bool,
    pub fetched: usize,
    pub fetch_skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// `None` when no credential was supplied.
    pub remote: Option<RemoteSummary>,
    pub discovered: usize,
    pub converted: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// The listing succeeded but returned nothing to claim.
    pub fn no_activities(&self) -> bool {
        self.remote
            .as_ref()
            .is_some_and(|remote| remote.listing_complete && remote.listed == 0)
    }

    /// The listing walk ended on a transient failure.
    pub fn fetch_failed(&self) -> bool {
        self.remote
            .as_ref()
            .is_some_and(|remote| !remote.listing_complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoMetrics,
    MissingGeodata,
    NoTrackPoints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Converted {
        activity_id: String,
        path: PathBuf,
        points: usize,
    },
    Skipped(SkipReason),
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn create_output_dirs(&self) -> Result<()> {
        for dir in [&self.config.raw_dir, &self.config.output_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Claim (when an API is given), discover, convert.
    ///
    /// Errors are limited to output directory creation and fatal credential
    /// failures during the listing walk (a
    /// [`crate::common::types::FetchError`] inside the `anyhow::Error`). Every
    /// per-activity and per-file failure is logged and counted in the summary.
    pub async fn run<A: ActivityApi>(
        &self,
        api: Option<A>,
        inputs: &InputSource,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        self.create_output_dirs()?;

        if let Some(api) = api {
            info!("Claiming NRC activities...");
            let remote = self.claim(api).await?;
            let nothing_listed = remote.listed == 0;
            summary.remote = Some(remote);

            if nothing_listed {
                if summary.fetch_failed() {
                    error!("The activity listing failed before any activity was found.");
                } else {
                    error!("No activities found!");
                }
                summary.elapsed = started.elapsed();
                return Ok(summary);
            }
        }

        let files = self.discover_inputs(inputs);
        summary.discovered = files.len();
        self.convert_all(&files, &mut summary);

        summary.elapsed = started.elapsed();
        info!(
            "Parsed {} out of {} total run activities.",
            summary.converted, summary.discovered
        );
        info!("Total time taken: {}.", format_elapsed(summary.elapsed));

        Ok(summary)
    }

    async fn claim<A: ActivityApi>(&self, api: A) -> Result<RemoteSummary> {
        let claim = ActivityClaim::new(api, &self.config.raw_dir);
        let listing = claim.list_run_activities().await?;

        let mut remote = RemoteSummary {
            listed: listing.activity_ids.len(),
            pages: listing.pages,
            listing_complete: listing.complete,
            ..Default::default()
        };
        if listing.activity_ids.is_empty() {
            return Ok(remote);
        }

        let details = claim.claim_details(&listing.activity_ids).await;
        remote.fetched = details.saved.len();
        remote.fetch_skipped = details.skipped;
        Ok(remote)
    }

    /// Expand the input source into the list of JSON files to convert.
    /// Directories contribute their `*.json` entries in name order; anything
    /// else is taken as a file.
    pub fn discover_inputs(&self, inputs: &InputSource) -> Vec<PathBuf> {
        let paths = match inputs {
            InputSource::Default => vec![self.config.raw_dir.clone()],
            InputSource::Paths(paths) => paths.clone(),
        };

        let mut files = Vec::new();
        let mut folders = Vec::new();
        for path in paths {
            if path.is_dir() {
                match json_files_in(&path) {
                    Ok(found) => files.extend(found),
                    Err(e) => error!("{e:#}"),
                }
                folders.push(path.display().to_string());
            } else {
                files.push(path);
            }
        }

        if !folders.is_empty() {
            info!(
                "Parsing activity JSON files from the {} folder(s).",
                folders.join(",")
            );
        }
        files
    }

    #[time("convert_activities_duration")]
    fn convert_all(&self, files: &[PathBuf], summary: &mut RunSummary) {
        for path in files {
            match self.convert_file(path) {
                Ok(Conversion::Converted { points, .. }) => {
                    summary.converted += 1;
                    metrics::increment_activities_converted(1);
                    metrics::set_track_points_last(points as u64);
                }
                Ok(Conversion::Skipped(_)) => {
                    summary.skipped += 1;
                    metrics::increment_activities_skipped(1);
                }
                Err(e) => {
                    error!(
                        "Error occurred while parsing file {}: {:#}",
                        path.display(),
                        e
                    );
                    summary.skipped += 1;
                    metrics::increment_activities_skipped(1);
                }
            }
        }
    }

    /// Parse one activity JSON file, align its streams and write
    /// `<output_dir>/<id>.gpx`.
    pub fn convert_file(&self, path: &Path) -> Result<Conversion> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let activity: ActivityRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse activity JSON in {}", path.display()))?;

        let streams = activity
            .streams()
            .with_context(|| format!("Invalid metric samples in {}", path.display()))?;
        let Some(streams) = streams else {
            warn!(
                "\tThe activity {} doesn't contain metrics information!",
                activity.id
            );
            return Ok(Conversion::Skipped(SkipReason::NoMetrics));
        };

        let points = match align_streams(&streams) {
            Ok(points) => points,
            Err(AlignError::MissingGeodata) => {
                warn!(
                    "\tThe activity {} doesn't contain latitude/longitude information!",
                    activity.id
                );
                return Ok(Conversion::Skipped(SkipReason::MissingGeodata));
            }
        };
        if points.is_empty() {
            warn!("\tThe activity {} has no track points!", activity.id);
            return Ok(Conversion::Skipped(SkipReason::NoTrackPoints));
        }

        let point_count = points.len();
        let document = TrackDocument::build(activity.title(), points);
        let output_path = self
            .config
            .output_dir
            .join(format!("{}.gpx", sanitize(&activity.id)));
        let xml = gpx::encode(&document)
            .with_context(|| format!("Failed to encode GPX for activity {}", activity.id))?;
        fs::write(&output_path, xml)
            .with_context(|| format!("Failed to write GPX to {}", output_path.display()))?;

        info!("Activity {} successfully parsed.", activity.id);
        Ok(Conversion::Converted {
            activity_id: activity.id,
            path: output_path,
            points: point_count,
        })
    }
}

fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
