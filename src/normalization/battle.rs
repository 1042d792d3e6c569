//! Battle normalization: one raw upstream battle object in, one canonical
//! `MatchRecord` or an explicit skip out.
//!
//! The upstream battle log is untrusted, partially-structured JSON: field
//! presence varies by game mode and has changed across API revisions. Nothing
//! in here assumes a field exists, and a malformed record is always an
//! isolated skip, never a batch failure.

use crate::database_ops::matches::MatchRecord;
use crate::ingest::identity::battle_identity_key;
use crate::normalization::tag::normalize_tag;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt;

/// Battle variants the store is designed to hold. Anything else is silently
/// skipped, not an error.
pub const SUPPORTED_MODES: [&str; 3] = ["PvP", "2v2", "ClanWar"];

/// Upstream timestamp layout: compact date-time, millisecond suffix, UTC
/// marker. Example: `20240215T120000.000Z`.
const BATTLE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

/// Why a single raw battle was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedMode,
    MissingField(&'static str),
    BadTag(&'static str),
    BadTimestamp,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedMode => write!(f, "unsupported battle mode"),
            SkipReason::MissingField(field) => write!(f, "missing field {field}"),
            SkipReason::BadTag(field) => write!(f, "malformed tag in {field}"),
            SkipReason::BadTimestamp => write!(f, "unparseable battleTime"),
        }
    }
}

/// Validate one raw battle and map it into the canonical match shape.
///
/// The `team` slot is the requesting player's side and `opponent` the other;
/// which side lands in `participant_a` therefore depends on who synced first,
/// but the identity key does not (tags are sorted before hashing), so two
/// players syncing the same battle converge on one stored row.
pub fn normalize_battle(raw: &Value) -> Result<MatchRecord, SkipReason> {
    let mode = battle_mode(raw).ok_or(SkipReason::MissingField("type"))?;
    if !SUPPORTED_MODES.contains(&mode) {
        return Err(SkipReason::UnsupportedMode);
    }

    let battle_time_raw = raw
        .get("battleTime")
        .and_then(|v| v.as_str())
        .ok_or(SkipReason::MissingField("battleTime"))?;
    let occurred_at = parse_battle_time(battle_time_raw).ok_or(SkipReason::BadTimestamp)?;

    let team = first_element(raw, "team").ok_or(SkipReason::MissingField("team"))?;
    let opponent = first_element(raw, "opponent").ok_or(SkipReason::MissingField("opponent"))?;

    let team_tag = team
        .get("tag")
        .and_then(|v| v.as_str())
        .ok_or(SkipReason::MissingField("team.tag"))?;
    let opponent_tag = opponent
        .get("tag")
        .and_then(|v| v.as_str())
        .ok_or(SkipReason::MissingField("opponent.tag"))?;

    let participant_a = normalize_tag(team_tag).ok_or(SkipReason::BadTag("team.tag"))?;
    let participant_b = normalize_tag(opponent_tag).ok_or(SkipReason::BadTag("opponent.tag"))?;

    let score_a = crowns(team).ok_or(SkipReason::MissingField("team.crowns"))?;
    let score_b = crowns(opponent).ok_or(SkipReason::MissingField("opponent.crowns"))?;

    let winner = match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => Some(participant_a.clone()),
        std::cmp::Ordering::Less => Some(participant_b.clone()),
        std::cmp::Ordering::Equal => None,
    };

    let identity_key = battle_identity_key(battle_time_raw, &participant_a, &participant_b);

    Ok(MatchRecord {
        identity_key,
        participant_a,
        participant_b,
        winner,
        occurred_at,
        mode: mode.to_string(),
        score_a,
        score_b,
    })
}

/// Mode label: `type` on current payloads, `gameMode.name` on some older
/// revisions.
fn battle_mode(raw: &Value) -> Option<&str> {
    raw.get("type")
        .and_then(|v| v.as_str())
        .or_else(|| {
            raw.get("gameMode")
                .and_then(|m| m.get("name"))
                .and_then(|v| v.as_str())
        })
        .filter(|s| !s.is_empty())
}

fn first_element<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key).and_then(|v| v.as_array()).and_then(|a| a.first())
}

fn crowns(side: &Value) -> Option<i32> {
    side.get("crowns")
        .and_then(|v| v.as_i64())
        .filter(|c| (0..=i64::from(i32::MAX)).contains(c))
        .map(|c| c as i32)
}

fn parse_battle_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, BATTLE_TIME_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn pvp_battle(team_crowns: i64, opponent_crowns: i64) -> Value {
        json!({
            "type": "PvP",
            "battleTime": "20240215T120000.000Z",
            "team": [{"tag": "#AAA111", "crowns": team_crowns}],
            "opponent": [{"tag": "#BBB222", "crowns": opponent_crowns}]
        })
    }

    #[test]
    fn happy_path_produces_canonical_record() {
        let record = normalize_battle(&pvp_battle(3, 1)).unwrap();
        assert_eq!(record.participant_a, "#AAA111");
        assert_eq!(record.participant_b, "#BBB222");
        assert_eq!(record.mode, "PvP");
        assert_eq!((record.score_a, record.score_b), (3, 1));
        assert_eq!(record.occurred_at.hour(), 12);
        assert_eq!(record.identity_key.len(), 64);
    }

    #[test]
    fn higher_score_wins_equal_scores_draw() {
        assert_eq!(
            normalize_battle(&pvp_battle(3, 1)).unwrap().winner.as_deref(),
            Some("#AAA111")
        );
        assert_eq!(
            normalize_battle(&pvp_battle(0, 2)).unwrap().winner.as_deref(),
            Some("#BBB222")
        );
        assert_eq!(normalize_battle(&pvp_battle(2, 2)).unwrap().winner, None);
    }

    #[test]
    fn both_viewpoints_converge_on_one_identity() {
        // The same battle as seen by the other participant: team/opponent
        // slots swapped.
        let mirrored = json!({
            "type": "PvP",
            "battleTime": "20240215T120000.000Z",
            "team": [{"tag": "#BBB222", "crowns": 1}],
            "opponent": [{"tag": "#AAA111", "crowns": 3}]
        });
        let a = normalize_battle(&pvp_battle(3, 1)).unwrap();
        let b = normalize_battle(&mirrored).unwrap();
        assert_eq!(a.identity_key, b.identity_key);
    }

    #[test]
    fn unsupported_mode_is_skipped() {
        let mut battle = pvp_battle(1, 0);
        battle["type"] = json!("Challenge");
        assert_eq!(normalize_battle(&battle), Err(SkipReason::UnsupportedMode));
    }

    #[test]
    fn falls_back_to_game_mode_name() {
        let mut battle = pvp_battle(1, 0);
        battle.as_object_mut().unwrap().remove("type");
        battle["gameMode"] = json!({"name": "ClanWar"});
        assert_eq!(normalize_battle(&battle).unwrap().mode, "ClanWar");
    }

    #[test]
    fn missing_crowns_is_an_isolated_skip() {
        let mut battle = pvp_battle(1, 0);
        battle["team"][0].as_object_mut().unwrap().remove("crowns");
        assert_eq!(
            normalize_battle(&battle),
            Err(SkipReason::MissingField("team.crowns"))
        );
    }

    #[test]
    fn negative_crowns_rejected() {
        assert_eq!(
            normalize_battle(&pvp_battle(-1, 0)),
            Err(SkipReason::MissingField("team.crowns"))
        );
    }

    #[test]
    fn empty_team_array_rejected() {
        let mut battle = pvp_battle(1, 0);
        battle["team"] = json!([]);
        assert_eq!(
            normalize_battle(&battle),
            Err(SkipReason::MissingField("team"))
        );
    }

    #[test]
    fn garbled_timestamp_rejected() {
        let mut battle = pvp_battle(1, 0);
        battle["battleTime"] = json!("2024-02-15 12:00:00");
        assert_eq!(normalize_battle(&battle), Err(SkipReason::BadTimestamp));
    }

    #[test]
    fn tags_are_case_normalized() {
        let mut battle = pvp_battle(1, 0);
        battle["team"][0]["tag"] = json!("aaa111");
        let record = normalize_battle(&battle).unwrap();
        assert_eq!(record.participant_a, "#AAA111");
    }
}
