use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, de};
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    /// HTTP 401 from the service. The credential is unusable.
    Unauthorized,
    /// The service answered 2xx but the body carried an `error_id`.
    Api { error_id: String },
    Http(StatusCode),
    Network(reqwest_middleware::Error),
    Decode(serde_json::Error),
}

impl FetchError {
    /// Fatal errors abort the whole run; everything else is logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Unauthorized | FetchError::Api { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Unauthorized => write!(f, "Unauthorized (HTTP 401)"),
            FetchError::Api { error_id } => write!(f, "API error {error_id}"),
            FetchError::Http(status) => write!(f, "HTTP {status}"),
            FetchError::Network(e) => write!(f, "Network error: {e}"),
            FetchError::Decode(e) => write!(f, "Invalid response body: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest_middleware::Error> for FetchError {
    fn from(err: reqwest_middleware::Error) -> Self {
        FetchError::Network(err)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(reqwest_middleware::Error::Reqwest(err))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err)
    }
}

/// Activity ids show up both as strings and as bare numbers depending on the
/// endpoint, so accept either and normalize to a string.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct WithId {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
    }

    #[test]
    fn test_id_accepts_string_and_number() {
        let a: WithId = serde_json::from_str(r#"{"id":"abc-1"}"#).unwrap();
        let b: WithId = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(a.id, "abc-1");
        assert_eq!(b.id, "42");
        assert!(serde_json::from_str::<WithId>(r#"{"id":null}"#).is_err());
    }

    #[test]
    fn test_only_credential_errors_are_fatal() {
        assert!(FetchError::Unauthorized.is_fatal());
        assert!(
            FetchError::Api {
                error_id: "e-1".to_string()
            }
            .is_fatal()
        );
        assert!(!FetchError::Http(StatusCode::INTERNAL_SERVER_ERROR).is_fatal());
    }
}
