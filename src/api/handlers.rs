// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::battlelog::BattleLogClient;
use crate::database_ops::{matches, players};
use crate::ingest::error::SyncError;
use crate::ingest::sync::sync_player as run_sync;
use crate::normalization::tag::normalize_tag;
use crate::util::db::Db;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Result};
use std::time::SystemTime;

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> Result<HttpResponse> {
    // Quick database connectivity check
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let uptime = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let response = ApiResponse::success(HealthResponse {
        status: "online".to_string(),
        database: db_status.to_string(),
        uptime_seconds: uptime,
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Register a player. If the tag is already registered, returns the existing
/// record; never errors on re-registration, never duplicates.
pub async fn create_player(
    payload: web::Json<PlayerCreateRequest>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let tag = match payload.player_tag.as_deref() {
        Some(raw) => match normalize_tag(raw) {
            Some(tag) => Some(tag),
            None => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                    "invalid player tag: {raw:?}"
                ))));
            }
        },
        None => None,
    };

    let display_name = payload.display_name.trim();
    if display_name.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("display_name must not be empty")));
    }

    match players::create_or_get_player(&db, display_name, tag.as_deref()).await {
        Ok(player) => Ok(HttpResponse::Ok().json(ApiResponse::success(player))),
        Err(e) => {
            tracing::error!(error = %e, ?tag, "player registration failed");
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("player registration failed")))
        }
    }
}

/// Match history where the player appears on either side, newest first.
pub async fn get_player_matches(
    path: web::Path<String>,
    query: web::Query<MatchListQuery>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let raw_tag = path.into_inner();
    let Some(tag) = normalize_tag(&raw_tag) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
            "invalid player tag: {raw_tag:?}"
        ))));
    };

    match matches::matches_for_player(&db, &tag, query.limit).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(ApiResponse::success(rows))),
        Err(e) => {
            tracing::error!(error = %e, %tag, "match listing failed");
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("match listing failed")))
        }
    }
}

/// Trigger a battle-log sync for the given player tag.
pub async fn sync_player(
    path: web::Path<String>,
    db: web::Data<Db>,
    client: web::Data<BattleLogClient>,
) -> Result<HttpResponse> {
    let raw_tag = path.into_inner();

    match run_sync(&db, &client, &raw_tag).await {
        Ok(report) => {
            let summary = SyncSummary {
                status: "success".to_string(),
                new_matches_synced: report.new_matches,
                fetched: report.fetched,
                accepted: report.accepted,
                skipped: report.skipped,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
        }
        Err(err) => {
            tracing::warn!(error = %err, tag = %raw_tag, "sync failed");
            let status = sync_error_status(&err);
            Ok(HttpResponse::build(status).json(ApiResponse::<()>::error(err.to_string())))
        }
    }
}

/// One status per error class so callers can tell input mistakes,
/// retryable upstream conditions, and hard failures apart.
fn sync_error_status(err: &SyncError) -> StatusCode {
    match err {
        SyncError::InvalidTag(_) => StatusCode::BAD_REQUEST,
        SyncError::UpstreamAuth | SyncError::UpstreamShape(_) => StatusCode::BAD_GATEWAY,
        SyncError::UpstreamRateLimited | SyncError::UpstreamUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SyncError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_map_to_distinct_statuses() {
        assert_eq!(
            sync_error_status(&SyncError::InvalidTag("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            sync_error_status(&SyncError::UpstreamAuth),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            sync_error_status(&SyncError::UpstreamRateLimited),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            sync_error_status(&SyncError::UpstreamUnavailable("t".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            sync_error_status(&SyncError::Storage("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
