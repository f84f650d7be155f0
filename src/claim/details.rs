use super::ActivityClaim;
use crate::common::metrics;
use crate::common::nrc_client::ActivityApi;
use anyhow::{Context, Result};
use function_timer::time;
use sanitize_filename::sanitize;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Raw detail payload as returned by the service.
#[derive(Debug, Clone)]
pub struct FetchedActivity {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetailSummary {
    pub saved: Vec<PathBuf>,
    pub skipped: usize,
}

impl<A: ActivityApi> ActivityClaim<A> {
    /// Fetch one activity's full metrics payload. Failures are logged and
    /// reported as `None` so the caller can move on to the next id.
    pub async fn fetch_activity(&self, activity_id: &str) -> Option<FetchedActivity> {
        info!("Getting activity details for {}...", activity_id);

        let body = match self.api.fetch_activity_detail(activity_id).await {
            Ok(body) => body,
            Err(e) => {
                error!("Error fetching activity details for {activity_id}: {e}");
                return None;
            }
        };

        let payload: serde_json::Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Activity {activity_id} details are not valid JSON: {e}");
                return None;
            }
        };

        let id = match payload.get("id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => {
                warn!("Activity {activity_id} details carry no id, using the listing id");
                activity_id.to_string()
            }
        };

        Some(FetchedActivity { id, body })
    }

    /// Write the payload verbatim to `<raw_dir>/<id>.json`.
    pub fn save_activity(&self, activity: &FetchedActivity) -> Result<PathBuf> {
        let path = self
            .raw_dir
            .join(format!("{}.json", sanitize(&activity.id)));
        fs::write(&path, &activity.body)
            .with_context(|| format!("Failed to write activity JSON to {}", path.display()))?;
        Ok(path)
    }

    /// Fetch and persist every listed activity, one at a time. A failure on
    /// one activity never stops the rest.
    #[time("claim_activity_details_duration")]
    pub async fn claim_details(&self, activity_ids: &[String]) -> DetailSummary {
        let mut summary = DetailSummary::default();

        for activity_id in activity_ids {
            let Some(activity) = self.fetch_activity(activity_id).await else {
                summary.skipped += 1;
                continue;
            };

            match self.save_activity(&activity) {
                Ok(path) => summary.saved.push(path),
                Err(e) => {
                    error!("{e:#}");
                    summary.skipped += 1;
                }
            }
        }

        metrics::increment_activities_fetched(summary.saved.len() as u64);
        metrics::increment_activities_fetch_skipped(summary.skipped as u64);
        info!(
            "Saved {} of {} activities to {}.",
            summary.saved.len(),
            activity_ids.len(),
            self.raw_dir.display()
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::test_support::ScriptedApi;
    use crate::common::types::FetchError;
    use tempdir::TempDir;

    #[tokio::test]
    async fn test_failed_detail_is_skipped() {
        let dir = TempDir::new("nrc_claim_details").unwrap();
        let api = ScriptedApi::default()
            .with_detail("a1", Ok(r#"{"id":"a1","metrics":[]}"#.to_string()))
            .with_detail("a2", Err(FetchError::Unauthorized))
            .with_detail("a3", Ok(r#"{"id":"a3-full","metrics":[]}"#.to_string()));
        let claim = ActivityClaim::new(&api, dir.path());

        let ids = vec!["a1".to_string(), "a2".to_string(), "a3".to_string()];
        let summary = claim.claim_details(&ids).await;

        assert_eq!(*api.detail_calls.borrow(), ids);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            summary.saved,
            vec![dir.path().join("a1.json"), dir.path().join("a3-full.json")]
        );
        let saved = fs::read_to_string(dir.path().join("a1.json")).unwrap();
        assert_eq!(saved, r#"{"id":"a1","metrics":[]}"#);
    }

    #[tokio::test]
    async fn test_invalid_json_detail_is_skipped() {
        let dir = TempDir::new("nrc_claim_details").unwrap();
        let api = ScriptedApi::default().with_detail("a1", Ok("<html>".to_string()));
        let claim = ActivityClaim::new(&api, dir.path());

        assert!(claim.fetch_activity("a1").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_id_falls_back_to_listing_id() {
        let dir = TempDir::new("nrc_claim_details").unwrap();
        let api = ScriptedApi::default().with_detail("a/1", Ok(r#"{"metrics":[]}"#.to_string()));
        let claim = ActivityClaim::new(&api, dir.path());

        let activity = claim.fetch_activity("a/1").await.unwrap();
        assert_eq!(activity.id, "a/1");

        let path = claim.save_activity(&activity).unwrap();
        assert_eq!(path, dir.path().join("a1.json"));
    }
}
