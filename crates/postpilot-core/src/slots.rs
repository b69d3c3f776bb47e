//! Publish-slot helpers.
//!
//! A slot is a zero-padded `HH:MM` time-of-day string. The zero padding
//! makes lexicographic comparison equivalent to chronological comparison,
//! which is what the dispatcher's catch-up filter relies on: a slot is due
//! whenever `slot <= now`, no matter how many ticks ago it became due.

use chrono::NaiveTime;
use thiserror::Error;

/// Fallback slot sequence used to pad a publish-time list that is shorter
/// than the subscribed daily quota.
pub const FALLBACK_PUBLISH_TIMES: [&str; 5] = ["09:00", "12:00", "15:00", "18:00", "21:00"];

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("invalid slot time '{0}': expected zero-padded HH:MM")]
    Invalid(String),
}

/// Parse and validate a `HH:MM` slot string.
///
/// # Errors
///
/// Returns [`SlotError::Invalid`] unless the input is exactly five
/// characters of zero-padded `HH:MM` with `HH < 24` and `MM < 60`.
pub fn parse_slot(s: &str) -> Result<(u8, u8), SlotError> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(SlotError::Invalid(s.to_string()));
    }
    let digits = |hi: u8, lo: u8| -> Option<u8> {
        if hi.is_ascii_digit() && lo.is_ascii_digit() {
            Some((hi - b'0') * 10 + (lo - b'0'))
        } else {
            None
        }
    };
    let hour = digits(bytes[0], bytes[1]).ok_or_else(|| SlotError::Invalid(s.to_string()))?;
    let minute = digits(bytes[3], bytes[4]).ok_or_else(|| SlotError::Invalid(s.to_string()))?;
    if hour >= 24 || minute >= 60 {
        return Err(SlotError::Invalid(s.to_string()));
    }
    Ok((hour, minute))
}

/// Format a wall-clock time as a zero-padded `HH:MM` slot string.
#[must_use]
pub fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Returns `true` when `slot` is at or before `now`.
///
/// Both arguments must be zero-padded `HH:MM`; the comparison is plain
/// lexicographic byte order, which implements catch-up publishing: a slot
/// missed by several ticks stays due until it is dispatched.
#[must_use]
pub fn is_due(slot: &str, now: &str) -> bool {
    slot <= now
}

/// Repair a publish-time list to match the subscribed daily quota.
///
/// Returns `None` when the list already has exactly `quota` entries.
/// A longer list is truncated; a shorter list is padded from
/// [`FALLBACK_PUBLISH_TIMES`], skipping times already present. If every
/// fallback is taken and the list is still short, remaining fallbacks are
/// appended in order regardless of duplicates so the length invariant
/// always holds.
#[must_use]
pub fn repair_publish_times(times: &[String], quota: usize) -> Option<Vec<String>> {
    if times.len() == quota {
        return None;
    }
    if times.len() > quota {
        return Some(times[..quota].to_vec());
    }

    let mut repaired = times.to_vec();
    for fallback in FALLBACK_PUBLISH_TIMES {
        if repaired.len() == quota {
            break;
        }
        if !repaired.iter().any(|t| t == fallback) {
            repaired.push(fallback.to_string());
        }
    }
    let mut fallbacks = FALLBACK_PUBLISH_TIMES.iter().cycle();
    while repaired.len() < quota {
        // Unreachable for quotas within the subscription range (1-5), but
        // the invariant len == quota must hold regardless of input.
        if let Some(f) = fallbacks.next() {
            repaired.push((*f).to_string());
        }
    }
    Some(repaired)
}

/// Slots from `configured` whose time is not in `used`, preserving
/// configured order.
///
/// This is a set difference, not a count difference: after a partially
/// failed batch, only the slot times that have no post yet are returned,
/// so a retry can never double-book a slot.
#[must_use]
pub fn remaining_slots(configured: &[String], used: &[String]) -> Vec<String> {
    configured
        .iter()
        .filter(|slot| !used.contains(slot))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn parse_slot_accepts_valid_times() {
        assert_eq!(parse_slot("00:00").unwrap(), (0, 0));
        assert_eq!(parse_slot("09:30").unwrap(), (9, 30));
        assert_eq!(parse_slot("23:59").unwrap(), (23, 59));
    }

    #[test]
    fn parse_slot_rejects_malformed_input() {
        for bad in ["9:30", "24:00", "12:60", "12-30", "12:3", "", "ab:cd"] {
            assert!(parse_slot(bad).is_err(), "expected '{bad}' to be rejected");
        }
    }

    #[test]
    fn is_due_implements_catch_up() {
        // Due at the exact minute, shortly after, and much later in the day.
        assert!(is_due("09:00", "09:00"));
        assert!(is_due("09:00", "09:07"));
        assert!(is_due("09:00", "14:00"));
        assert!(!is_due("09:00", "08:59"));
    }

    #[test]
    fn repair_leaves_correct_length_untouched() {
        let times = strings(&["08:00", "13:00", "19:00"]);
        assert!(repair_publish_times(&times, 3).is_none());
    }

    #[test]
    fn repair_truncates_excess_slots() {
        let times = strings(&["08:00", "13:00", "19:00"]);
        let repaired = repair_publish_times(&times, 2).unwrap();
        assert_eq!(repaired, strings(&["08:00", "13:00"]));
    }

    #[test]
    fn repair_pads_from_fallback_sequence() {
        let times = strings(&["08:00", "13:00"]);
        let repaired = repair_publish_times(&times, 3).unwrap();
        assert_eq!(repaired, strings(&["08:00", "13:00", "09:00"]));
    }

    #[test]
    fn repair_skips_fallbacks_already_configured() {
        let times = strings(&["09:00"]);
        let repaired = repair_publish_times(&times, 3).unwrap();
        assert_eq!(repaired, strings(&["09:00", "12:00", "15:00"]));
    }

    #[test]
    fn repair_pads_empty_list() {
        let repaired = repair_publish_times(&[], 5).unwrap();
        assert_eq!(
            repaired,
            strings(&["09:00", "12:00", "15:00", "18:00", "21:00"])
        );
    }

    #[test]
    fn remaining_slots_is_a_set_difference() {
        let configured = strings(&["09:00", "12:00", "15:00"]);
        let used = strings(&["12:00"]);
        assert_eq!(
            remaining_slots(&configured, &used),
            strings(&["09:00", "15:00"])
        );
    }

    #[test]
    fn remaining_slots_empty_when_all_used() {
        let configured = strings(&["09:00", "12:00"]);
        let used = strings(&["12:00", "09:00"]);
        assert!(remaining_slots(&configured, &used).is_empty());
    }

    #[test]
    fn remaining_slots_preserves_configured_order() {
        let configured = strings(&["21:00", "09:00", "15:00"]);
        let used = strings(&["09:00"]);
        assert_eq!(
            remaining_slots(&configured, &used),
            strings(&["21:00", "15:00"])
        );
    }
}
