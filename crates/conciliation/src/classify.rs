use crate::model::ConciliationStatus;

/// Largest encounter/sale gap, in minutes, still counted as a perfect match.
pub const PERFECT_MATCH_MAX_MINUTES: i64 = 3 * 60;

/// Classify a matched encounter/sale pair by the gap between them.
///
/// Unmatched records never reach this function: their status follows
/// directly from which side is present (see `RecordSides::status`).
pub fn classify_pair(time_difference_minutes: i64) -> ConciliationStatus {
    if time_difference_minutes <= PERFECT_MATCH_MAX_MINUTES {
        ConciliationStatus::PerfectMatch
    } else {
        ConciliationStatus::LikelyMatch
    }
}
