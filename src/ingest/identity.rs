//! Deduplication identity for battles.

use sha2::{Digest, Sha256};

/// Deterministic identity key for one battle.
///
/// The two participant tags are sorted lexicographically before hashing, so
/// the same battle observed from either side yields the same key. The raw
/// upstream timestamp string is hashed as-is: it is stable across fetches,
/// whereas a re-rendered parsed instant might not round-trip the fractional
/// seconds.
pub fn battle_identity_key(battle_time: &str, tag_a: &str, tag_b: &str) -> String {
    let (first, second) = if tag_a <= tag_b {
        (tag_a, tag_b)
    } else {
        (tag_b, tag_a)
    };

    let mut hasher = Sha256::new();
    hasher.update(battle_time.as_bytes());
    hasher.update(b"-");
    hasher.update(first.as_bytes());
    hasher.update(b"-");
    hasher.update(second.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: &str = "20240215T120000.000Z";

    #[test]
    fn deterministic() {
        let a = battle_identity_key(T, "#AAA", "#BBB");
        let b = battle_identity_key(T, "#AAA", "#BBB");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn order_independent() {
        let ab = battle_identity_key(T, "#AAA", "#BBB");
        let ba = battle_identity_key(T, "#BBB", "#AAA");
        assert_eq!(ab, ba);
    }

    #[test]
    fn distinct_battles_get_distinct_keys() {
        let k1 = battle_identity_key(T, "#AAA", "#BBB");
        let k2 = battle_identity_key("20240215T120100.000Z", "#AAA", "#BBB");
        let k3 = battle_identity_key(T, "#AAA", "#CCC");
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
    }
}
