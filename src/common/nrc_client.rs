use crate::common::config::{Config, Endpoints};
use crate::common::metrics;
use crate::common::types::{FetchError, string_or_number};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use std::collections::HashMap;

pub const RUN_TYPE_TAG: &str = "com.nike.running.runtype";

/// One entry of the activity listing.
#[derive(Debug, Deserialize, Clone)]
pub struct ActivitySummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub tags: Option<HashMap<String, serde_json::Value>>,
}

impl ActivitySummary {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key)?.as_str()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Paging {
    #[serde(default)]
    pub before_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ActivityPage {
    #[serde(default)]
    pub activities: Vec<ActivitySummary>,
    #[serde(default)]
    pub paging: Option<Paging>,
    /// Set when the service rejects the request inside a 2xx response.
    #[serde(default)]
    pub error_id: Option<String>,
}

impl ActivityPage {
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging.as_ref()?.before_id.as_deref()
    }
}

/// The two remote calls the claim walk needs. Implemented over HTTP by
/// [`NrcClient`]; tests script their own.
#[allow(async_fn_in_trait)]
pub trait ActivityApi {
    /// Fetch one listing page. `None` requests the first page.
    async fn fetch_activity_page(&self, before_id: Option<&str>)
    -> Result<ActivityPage, FetchError>;

    /// Fetch the full metrics payload of one activity as the raw response body.
    async fn fetch_activity_detail(&self, activity_id: &str) -> Result<String, FetchError>;
}

impl<T: ActivityApi> ActivityApi for &T {
    async fn fetch_activity_page(
        &self,
        before_id: Option<&str>,
    ) -> Result<ActivityPage, FetchError> {
        (**self).fetch_activity_page(before_id).await
    }

    async fn fetch_activity_detail(&self, activity_id: &str) -> Result<String, FetchError> {
        (**self).fetch_activity_detail(activity_id).await
    }
}

pub struct NrcClient {
    client: ClientWithMiddleware,
    endpoints: Endpoints,
    auth_header: String,
}

impl NrcClient {
    pub fn new(access_token: &str, config: &Config) -> Result<Self, FetchError> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
            auth_header: format!("Bearer {access_token}"),
        })
    }

    async fn get_text(&self, url: String) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .inspect_err(|_e| metrics::increment_nrc_api_failure())?;

        check_status(response.status()).inspect_err(|_e| metrics::increment_nrc_api_failure())?;

        let body = response
            .text()
            .await
            .inspect_err(|_e| metrics::increment_nrc_api_failure())?;

        metrics::increment_nrc_api_success();
        Ok(body)
    }
}

/// 401 is a credential failure; any other non-2xx status is transient.
fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(FetchError::Unauthorized);
    }
    if !status.is_success() {
        return Err(FetchError::Http(status));
    }
    Ok(())
}

fn parse_page(body: &str) -> Result<ActivityPage, FetchError> {
    Ok(serde_json::from_str(body)?)
}

impl ActivityApi for NrcClient {
    async fn fetch_activity_page(
        &self,
        before_id: Option<&str>,
    ) -> Result<ActivityPage, FetchError> {
        let body = self.get_text(self.endpoints.page_url(before_id)).await?;
        parse_page(&body)
    }

    async fn fetch_activity_detail(&self, activity_id: &str) -> Result<String, FetchError> {
        self.get_text(self.endpoints.activity_url(activity_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialization() {
        let body = r#"{
            "activities": [
                {"id": "a1", "type": "run", "tags": {"com.nike.running.runtype": "manual", "location": 3}},
                {"id": 7, "type": "walk"}
            ],
            "paging": {"before_id": "cursor-2", "after_id": "x"}
        }"#;
        let page: ActivityPage = serde_json::from_str(body).unwrap();

        assert_eq!(page.activities.len(), 2);
        assert_eq!(page.activities[0].tag(RUN_TYPE_TAG), Some("manual"));
        assert_eq!(page.activities[0].tag("location"), None);
        assert_eq!(page.activities[1].id, "7");
        assert_eq!(page.activities[1].tag(RUN_TYPE_TAG), None);
        assert_eq!(page.next_cursor(), Some("cursor-2"));
        assert!(page.error_id.is_none());
    }

    #[test]
    fn test_last_page_and_error_page() {
        let last: ActivityPage = serde_json::from_str(r#"{"activities": [], "paging": {}}"#).unwrap();
        assert_eq!(last.next_cursor(), None);

        let error: ActivityPage = serde_json::from_str(r#"{"error_id": "abc-123"}"#).unwrap();
        assert_eq!(error.error_id.as_deref(), Some("abc-123"));
        assert!(error.activities.is_empty());
    }

    #[test]
    fn test_status_mapping() {
        let unauthorized = check_status(StatusCode::UNAUTHORIZED).unwrap_err();
        assert!(matches!(unauthorized, FetchError::Unauthorized));
        assert!(unauthorized.is_fatal());

        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::NOT_FOUND, StatusCode::FORBIDDEN] {
            match check_status(status) {
                Err(FetchError::Http(got)) => assert_eq!(got, status),
                other => panic!("unexpected result for {status}: {other:?}"),
            }
            assert!(!FetchError::Http(status).is_fatal());
        }

        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn test_parse_page_body() {
        let page = parse_page(r#"{"activities": [{"id": "a1", "type": "run"}], "paging": {"before_id": "c2"}}"#)
            .unwrap();
        assert_eq!(page.activities[0].id, "a1");
        assert_eq!(page.next_cursor(), Some("c2"));

        assert!(matches!(parse_page("<html>"), Err(FetchError::Decode(_))));
    }
}
