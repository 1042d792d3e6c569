//! Match store: conflict-tolerant bulk insert plus participant queries.

use crate::util::db::Db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::QueryBuilder;
use tracing::{info, instrument};

/// Hard cap on a single match listing; also the default page size.
pub const DEFAULT_MATCH_LIMIT: i64 = 50;

/// One canonical match ready for insertion. Produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub identity_key: String,
    pub participant_a: String,
    pub participant_b: String,
    pub winner: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub mode: String,
    pub score_a: i32,
    pub score_b: i32,
}

/// A match row as stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredMatch {
    pub id: i64,
    pub identity_key: String,
    pub participant_a: String,
    pub participant_b: String,
    pub winner: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub mode: String,
    pub score_a: i32,
    pub score_b: i32,
}

/// Bulk insert, ignoring rows whose `identity_key` already exists
/// (first writer wins, no update). Returns the number of rows actually
/// inserted, so callers never count a pre-existing match as new.
#[instrument(skip(db, rows))]
pub async fn insert_new_matches(db: &Db, rows: &[MatchRecord]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
        "INSERT INTO matches (identity_key, participant_a, participant_b, winner, occurred_at, mode, score_a, score_b) ",
    );
    qb.push_values(rows, |mut b, r| {
        b.push_bind(&r.identity_key)
            .push_bind(&r.participant_a)
            .push_bind(&r.participant_b)
            .push_bind(r.winner.as_ref())
            .push_bind(r.occurred_at)
            .push_bind(&r.mode)
            .push_bind(r.score_a)
            .push_bind(r.score_b);
    });
    qb.push(" ON CONFLICT (identity_key) DO NOTHING");

    let result = qb.build().execute(&db.pool).await?;
    let inserted = result.rows_affected();
    info!(
        submitted = rows.len(),
        inserted, "match batch written (duplicates ignored)"
    );
    Ok(inserted)
}

/// Matches where the given canonical tag appears on either side, newest
/// first. `limit` is clamped to `1..=DEFAULT_MATCH_LIMIT`.
pub async fn matches_for_player(
    db: &Db,
    tag: &str,
    limit: Option<i64>,
) -> Result<Vec<StoredMatch>> {
    let limit = limit
        .unwrap_or(DEFAULT_MATCH_LIMIT)
        .clamp(1, DEFAULT_MATCH_LIMIT);

    let rows = sqlx::query_as::<_, StoredMatch>(
        "SELECT id, identity_key, participant_a, participant_b, winner, occurred_at, mode, score_a, score_b
         FROM matches
         WHERE participant_a = $1 OR participant_b = $1
         ORDER BY occurred_at DESC
         LIMIT $2",
    )
    .bind(tag)
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

pub async fn match_by_identity_key(db: &Db, key: &str) -> Result<Option<StoredMatch>> {
    let row = sqlx::query_as::<_, StoredMatch>(
        "SELECT id, identity_key, participant_a, participant_b, winner, occurred_at, mode, score_a, score_b
         FROM matches
         WHERE identity_key = $1",
    )
    .bind(key)
    .fetch_optional(&db.pool)
    .await?;
    Ok(row)
}
