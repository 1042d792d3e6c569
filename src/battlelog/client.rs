//! Client for the upstream battle-log API.
//!
//! Base URL and bearer credential come from the environment. The battle log
//! is a rolling window of recent battles per player; responses are treated as
//! untrusted JSON and classified failures never panic the caller.

use crate::ingest::error::SyncError;
use crate::normalization::tag::encode_tag_for_path;
use crate::util::env as env_util;
use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.clashroyale.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct BattleLogClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl BattleLogClient {
    pub fn new(
        base_url: Option<&str>,
        token: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent("royale-tracker/0.1")
            .timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()?;

        Ok(Self {
            base_url,
            http,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Build from `CR_API_BASE_URL` / `CR_API_TOKEN` / `SYNC_HTTP_TIMEOUT_SECS`.
    /// A missing token is not an error here; it surfaces as an auth failure
    /// on the first fetch so the server can still boot for read-only use.
    pub fn from_env() -> Result<Self> {
        let base_url = env_util::env_opt("CR_API_BASE_URL");
        let token = env_util::env_opt("CR_API_TOKEN");
        let timeout = env_util::env_parse("SYNC_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(base_url.as_deref(), token, Some(timeout))
    }

    /// Fetch the recent battle list for one canonical player tag.
    pub async fn player_battle_log(&self, tag: &str) -> Result<Vec<Value>, SyncError> {
        let token = self.token.as_deref().ok_or(SyncError::UpstreamAuth)?;

        let url = format!(
            "{}/players/{}/battlelog",
            self.base_url,
            encode_tag_for_path(tag)
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SyncError::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        if let Some(err) = classify_status(status, tag) {
            tracing::warn!(%status, tag, "battle log fetch rejected upstream");
            return Err(err);
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| SyncError::UpstreamShape(e.to_string()))?;
        battles_from_body(body)
    }
}

/// Map a non-success upstream status to its error class. `None` means the
/// request succeeded.
fn classify_status(status: StatusCode, tag: &str) -> Option<SyncError> {
    match status {
        s if s.is_success() => None,
        StatusCode::UNAUTHORIZED => Some(SyncError::UpstreamAuth),
        // The upstream uses 403 both for bad credentials and for IP blocks;
        // either way the caller must fix access before retrying.
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Some(SyncError::UpstreamRateLimited)
        }
        StatusCode::NOT_FOUND => Some(SyncError::InvalidTag(tag.to_string())),
        s if s.is_server_error() => Some(SyncError::UpstreamUnavailable(format!(
            "upstream returned {s}"
        ))),
        s => Some(SyncError::UpstreamShape(format!("unexpected status {s}"))),
    }
}

/// The battle log is documented as a bare JSON array; some API revisions wrap
/// it as `{"items": [...]}`. Anything else is an unexpected shape.
fn battles_from_body(body: Value) -> Result<Vec<Value>, SyncError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(SyncError::UpstreamShape(
                "expected battle array or {items: [...]}".into(),
            )),
        },
        _ => Err(SyncError::UpstreamShape("expected battle array".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn client_initialization_defaults() {
        let client = BattleLogClient::new(None, Some("secret".into()), None).unwrap();
        assert!(client.base_url.contains("clashroyale"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let client = BattleLogClient::new(None, Some("   ".into()), None).unwrap();
        assert!(client.token.is_none());
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::OK, "#A").is_none());
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "#A"),
            Some(SyncError::UpstreamAuth)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "#A"),
            Some(SyncError::UpstreamRateLimited)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "#A"),
            Some(SyncError::UpstreamRateLimited)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "#A"),
            Some(SyncError::InvalidTag(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "#A"),
            Some(SyncError::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn accepts_bare_array_and_items_wrapper() {
        let bare = json!([{"type": "PvP"}]);
        assert_eq!(battles_from_body(bare).unwrap().len(), 1);

        let wrapped = json!({"items": [{"type": "PvP"}, {"type": "2v2"}]});
        assert_eq!(battles_from_body(wrapped).unwrap().len(), 2);

        assert!(battles_from_body(json!("nope")).is_err());
        assert!(battles_from_body(json!({"data": []})).is_err());
    }
}
