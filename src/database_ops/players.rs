//! Registered players. Creation is idempotent on the canonical tag.

use crate::util::db::Db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Player {
    pub id: i64,
    pub display_name: String,
    pub player_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert-or-return keyed on the canonical tag. Registering an existing tag
/// returns the existing row untouched; the display name of the first
/// registration wins. A registration without a tag has nothing to collide on
/// and always creates a fresh row.
#[instrument(skip(db))]
pub async fn create_or_get_player(
    db: &Db,
    display_name: &str,
    tag: Option<&str>,
) -> Result<Player> {
    let Some(tag) = tag else {
        let player = sqlx::query_as::<_, Player>(
            "INSERT INTO players (display_name)
             VALUES ($1)
             RETURNING id, display_name, player_tag, created_at",
        )
        .bind(display_name)
        .fetch_one(&db.pool)
        .await?;
        return Ok(player);
    };

    let inserted = sqlx::query_as::<_, Player>(
        "INSERT INTO players (display_name, player_tag)
         VALUES ($1, $2)
         ON CONFLICT (player_tag) DO NOTHING
         RETURNING id, display_name, player_tag, created_at",
    )
    .bind(display_name)
    .bind(tag)
    .fetch_optional(&db.pool)
    .await?;

    if let Some(player) = inserted {
        return Ok(player);
    }

    // Conflict path: somebody (possibly a concurrent request) holds the tag.
    let existing = sqlx::query_as::<_, Player>(
        "SELECT id, display_name, player_tag, created_at FROM players WHERE player_tag = $1",
    )
    .bind(tag)
    .fetch_one(&db.pool)
    .await?;
    Ok(existing)
}
