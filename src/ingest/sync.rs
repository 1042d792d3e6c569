//! Ingestion coordinator: fetch -> normalize -> dedupe -> bulk persist for
//! one player's sync request.

use crate::battlelog::BattleLogClient;
use crate::database_ops::matches::{insert_new_matches, MatchRecord};
use crate::ingest::error::SyncError;
use crate::normalization::battle::normalize_battle;
use crate::normalization::tag::normalize_tag;
use crate::util::db::Db;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Outcome of one sync call.
///
/// `accepted` counts records that normalized cleanly; `new_matches` counts
/// rows the store actually inserted. The two differ whenever a battle was
/// already present from an earlier sync (or from the other participant's
/// sync), which is expected and benign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub new_matches: u64,
}

/// Sync the recent battle log for `raw_tag` into the match store.
///
/// Per-record failures are counted and skipped, never fatal; only upstream
/// fetch failures and storage failures abort the batch. Re-running after a
/// partial failure is safe: committed rows are deduplicated by identity key.
#[instrument(skip(db, client))]
pub async fn sync_player(
    db: &Db,
    client: &BattleLogClient,
    raw_tag: &str,
) -> Result<SyncReport, SyncError> {
    let tag = normalize_tag(raw_tag).ok_or_else(|| SyncError::InvalidTag(raw_tag.to_string()))?;

    let battles = client.player_battle_log(&tag).await?;
    let (records, skipped) = collect_batch(&battles);
    let accepted = records.len();

    let new_matches = insert_new_matches(db, &records)
        .await
        .map_err(|e| SyncError::Storage(e.to_string()))?;

    let report = SyncReport {
        fetched: battles.len(),
        accepted,
        skipped,
        new_matches,
    };
    info!(
        %tag,
        fetched = report.fetched,
        accepted = report.accepted,
        skipped = report.skipped,
        new_matches = report.new_matches,
        "sync complete"
    );
    Ok(report)
}

/// Normalize every raw battle, dropping malformed ones and collapsing
/// identity-key duplicates within the batch. Returns the accepted records and
/// the skip count.
pub fn collect_batch(raw_battles: &[Value]) -> (Vec<MatchRecord>, usize) {
    let mut records: Vec<MatchRecord> = Vec::with_capacity(raw_battles.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(raw_battles.len());
    let mut skipped = 0usize;

    for battle in raw_battles {
        match normalize_battle(battle) {
            Ok(record) => {
                if seen.insert(record.identity_key.clone()) {
                    records.push(record);
                } else {
                    debug!(identity_key = %record.identity_key, "duplicate within batch; collapsed");
                }
            }
            Err(reason) => {
                debug!(%reason, "skipping malformed battle");
                skipped += 1;
            }
        }
    }

    (records, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn battle(time: &str, opponent_tag: &str) -> Value {
        json!({
            "type": "PvP",
            "battleTime": time,
            "team": [{"tag": "#AAA111", "crowns": 2}],
            "opponent": [{"tag": opponent_tag, "crowns": 1}]
        })
    }

    #[test]
    fn malformed_record_is_counted_not_fatal() {
        let good = battle("20240215T120000.000Z", "#BBB222");
        let mut bad = battle("20240215T130000.000Z", "#CCC333");
        bad["team"][0].as_object_mut().unwrap().remove("crowns");

        let (records, skipped) = collect_batch(&[good, bad]);
        assert_eq!(records.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(records[0].participant_b, "#BBB222");
    }

    #[test]
    fn in_batch_duplicates_collapse_to_one_record() {
        let first = battle("20240215T120000.000Z", "#BBB222");
        // Same battle seen from the opponent's perspective.
        let mirrored = json!({
            "type": "PvP",
            "battleTime": "20240215T120000.000Z",
            "team": [{"tag": "#BBB222", "crowns": 1}],
            "opponent": [{"tag": "#AAA111", "crowns": 2}]
        });

        let (records, skipped) = collect_batch(&[first, mirrored]);
        assert_eq!(records.len(), 1);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn distinct_battles_all_accepted() {
        let battles = vec![
            battle("20240215T120000.000Z", "#BBB222"),
            battle("20240215T121500.000Z", "#BBB222"),
            battle("20240215T123000.000Z", "#CCC333"),
        ];
        let (records, skipped) = collect_batch(&battles);
        assert_eq!(records.len(), 3);
        assert_eq!(skipped, 0);
        // Keys all distinct.
        let keys: std::collections::HashSet<_> =
            records.iter().map(|r| r.identity_key.as_str()).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn empty_log_yields_empty_batch() {
        let (records, skipped) = collect_batch(&[]);
        assert!(records.is_empty());
        assert_eq!(skipped, 0);
    }
}
