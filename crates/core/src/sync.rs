use crate::{format::parse_timestamp, types::ExplanationRecord};

/// Index of the explanation whose interval contains `current_time`.
///
/// `records` must be in ascending time order (as kept by the store). The scan
/// is linear and is meant to be recomputed on every playback tick.
pub fn active_index(current_time: f64, records: &[ExplanationRecord]) -> Option<usize> {
    for (i, record) in records.iter().enumerate() {
        let start = parse_timestamp(&record.timestamp) as f64;
        let next = records
            .get(i + 1)
            .map(|r| parse_timestamp(&r.timestamp) as f64)
            .unwrap_or(f64::INFINITY);

        if start <= current_time && current_time < next {
            return Some(i);
        }
    }
    None
}

pub fn active_explanation(current_time: f64, records: &[ExplanationRecord]) -> Option<&ExplanationRecord> {
    active_index(current_time, records).map(|i| &records[i])
}
