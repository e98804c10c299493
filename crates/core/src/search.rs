use crate::types::ExplanationRecord;

/// Case-insensitive substring search over title, explanation, key point and
/// concepts. Results keep the input order. A blank query matches nothing;
/// any other query is matched as given, surrounding spaces included.
pub fn search<'a>(query: &str, records: &'a [ExplanationRecord]) -> Vec<&'a ExplanationRecord> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|record| matches(record, &needle))
        .collect()
}

fn matches(record: &ExplanationRecord, needle: &str) -> bool {
    [&record.title, &record.whats_happening, &record.key_point]
        .into_iter()
        .chain(record.concepts.iter())
        .any(|field| field.to_lowercase().contains(needle))
}
