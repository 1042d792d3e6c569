// API request/response models (DTOs)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

/// Player registration request. The linked external tag is optional; when
/// present it is canonicalized before storage.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerCreateRequest {
    pub display_name: String,
    #[serde(default)]
    pub player_tag: Option<String>,
}

/// Optional query parameters for the match listing
#[derive(Debug, Deserialize)]
pub struct MatchListQuery {
    pub limit: Option<i64>,
}

/// Result of a sync call
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncSummary {
    pub status: String,
    pub new_matches_synced: u64,
    pub fetched: usize,
    pub accepted: usize,
    pub skipped: usize,
}
