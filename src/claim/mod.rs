use crate::common::nrc_client::{ActivityApi, ActivitySummary, RUN_TYPE_TAG};
use std::path::{Path, PathBuf};

mod details;
mod listing;

pub use details::{DetailSummary, FetchedActivity};
pub use listing::ActivityListing;

/// Walks the remote activity listing and persists the raw JSON of every
/// claimable run under `raw_dir`.
pub struct ActivityClaim<A> {
    api: A,
    raw_dir: PathBuf,
}

impl<A: ActivityApi> ActivityClaim<A> {
    pub fn new(api: A, raw_dir: &Path) -> Self {
        Self {
            api,
            raw_dir: raw_dir.to_path_buf(),
        }
    }
}

/// A listing entry is claimed when it is a run that was recorded, not typed
/// in by hand. A missing run-type tag counts as recorded.
pub fn is_claimable_run(activity: &ActivitySummary) -> bool {
    activity.activity_type == "run" && activity.tag(RUN_TYPE_TAG) != Some("manual")
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::common::nrc_client::{ActivityApi, ActivityPage};
    use crate::common::types::FetchError;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    /// Serves scripted listing pages in order and canned detail bodies.
    #[derive(Default)]
    pub struct ScriptedApi {
        pub pages: RefCell<VecDeque<Result<ActivityPage, FetchError>>>,
        pub details: RefCell<HashMap<String, Result<String, FetchError>>>,
        pub cursors: RefCell<Vec<Option<String>>>,
        pub detail_calls: RefCell<Vec<String>>,
    }

    impl ScriptedApi {
        pub fn with_pages(pages: Vec<Result<ActivityPage, FetchError>>) -> Self {
            Self {
                pages: RefCell::new(pages.into()),
                ..Default::default()
            }
        }

        pub fn with_detail(self, id: &str, detail: Result<String, FetchError>) -> Self {
            self.details.borrow_mut().insert(id.to_string(), detail);
            self
        }

        pub fn page_calls(&self) -> usize {
            self.cursors.borrow().len()
        }
    }

    impl ActivityApi for ScriptedApi {
        async fn fetch_activity_page(
            &self,
            before_id: Option<&str>,
        ) -> Result<ActivityPage, FetchError> {
            self.cursors.borrow_mut().push(before_id.map(str::to_string));
            self.pages
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected page request for {before_id:?}"))
        }

        async fn fetch_activity_detail(&self, activity_id: &str) -> Result<String, FetchError> {
            self.detail_calls.borrow_mut().push(activity_id.to_string());
            self.details
                .borrow_mut()
                .remove(activity_id)
                .unwrap_or(Err(FetchError::Http(reqwest::StatusCode::NOT_FOUND)))
        }
    }

    pub fn page(body: serde_json::Value) -> Result<ActivityPage, FetchError> {
        Ok(serde_json::from_value(body).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(body: serde_json::Value) -> ActivitySummary {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_run_filter() {
        let recorded = summary(serde_json::json!({"id": "1", "type": "run"}));
        let manual = summary(serde_json::json!({
            "id": "2", "type": "run", "tags": {"com.nike.running.runtype": "manual"}
        }));
        let tagged = summary(serde_json::json!({
            "id": "3", "type": "run", "tags": {"com.nike.running.runtype": "indoor"}
        }));
        let walk = summary(serde_json::json!({"id": "4", "type": "walk"}));

        assert!(is_claimable_run(&recorded));
        assert!(!is_claimable_run(&manual));
        assert!(is_claimable_run(&tagged));
        assert!(!is_claimable_run(&walk));
    }
}
