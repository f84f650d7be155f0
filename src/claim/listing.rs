use super::{ActivityClaim, is_claimable_run};
use crate::common::metrics;
use crate::common::nrc_client::ActivityApi;
use crate::common::types::FetchError;
use function_timer::time;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityListing {
    pub activity_ids: Vec<String>,
    pub pages: usize,
    /// False when a transient failure ended the walk before the service
    /// stopped handing out cursors.
    pub complete: bool,
}

impl<A: ActivityApi> ActivityClaim<A> {
    /// Walk the cursor-paged listing and collect the ids of claimable runs.
    ///
    /// The walk ends when a page comes back without `paging.before_id`. There
    /// is no page limit: termination relies on the service eventually
    /// omitting the cursor.
    ///
    /// A 401 or an `error_id` body aborts the walk with a fatal error and no
    /// ids. Any other failure ends the walk early with what was collected so
    /// far and `complete == false`.
    #[time("list_run_activities_duration")]
    pub async fn list_run_activities(&self) -> Result<ActivityListing, FetchError> {
        info!("Getting activities list...");

        let mut listing = ActivityListing {
            activity_ids: Vec::new(),
            pages: 0,
            complete: true,
        };
        let mut cursor: Option<String> = None;

        loop {
            let page_num = listing.pages + 1;
            info!("Opening page {} of activities.", page_num);

            let page = match self.api.fetch_activity_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(FetchError::Unauthorized) => {
                    error!("Unauthorized access. Please check your access token!");
                    return Err(FetchError::Unauthorized);
                }
                Err(e) if e.is_fatal() => {
                    error!("Listing rejected: {e}. Please check your access token!");
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        "Error fetching activities page {}: {}. Please check your access token or network connection!",
                        page_num, e
                    );
                    listing.complete = false;
                    break;
                }
            };
            listing.pages = page_num;

            if let Some(error_id) = page.error_id {
                error!("Are you sure you provided the correct access token? (error_id {error_id})");
                return Err(FetchError::Api { error_id });
            }

            listing.activity_ids.extend(
                page.activities
                    .iter()
                    .filter(|activity| is_claimable_run(activity))
                    .map(|activity| activity.id.clone()),
            );

            match page.paging.and_then(|paging| paging.before_id) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        metrics::increment_activities_listed(listing.activity_ids.len() as u64);
        if listing.complete {
            info!(
                "Successfully extracted {} running activities from {} pages.",
                listing.activity_ids.len(),
                listing.pages
            );
        } else {
            error!(
                "Activity listing incomplete: extracted {} running activities from {} pages before failing.",
                listing.activity_ids.len(),
                listing.pages
            );
        }

        Ok(listing)
    }
}
