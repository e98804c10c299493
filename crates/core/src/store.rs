use crate::{format::parse_timestamp, types::ExplanationRecord};

/// Explanations of one video, kept unique by timestamp and sorted by time.
#[derive(Debug, Clone, Default)]
pub struct ExplanationStore {
    records: Vec<ExplanationRecord>,
}

impl ExplanationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any record with the same timestamp, then restore time order.
    pub fn insert(&mut self, record: ExplanationRecord) {
        self.records.retain(|r| r.timestamp != record.timestamp);
        self.records.push(record);
        self.records.sort_by_key(|r| parse_timestamp(&r.timestamp));
    }

    pub fn all(&self) -> &[ExplanationRecord] {
        &self.records
    }

    pub fn contains(&self, timestamp: &str) -> bool {
        self.get(timestamp).is_some()
    }

    pub fn get(&self, timestamp: &str) -> Option<&ExplanationRecord> {
        self.records.iter().find(|r| r.timestamp == timestamp)
    }

    /// Titles of the last `limit` records strictly before `seconds`, oldest first.
    pub fn titles_before(&self, seconds: u64, limit: usize) -> Vec<String> {
        let earlier: Vec<&ExplanationRecord> = self
            .records
            .iter()
            .filter(|r| parse_timestamp(&r.timestamp) < seconds)
            .collect();
        earlier[earlier.len().saturating_sub(limit)..]
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_vec(self) -> Vec<ExplanationRecord> {
        self.records
    }
}

impl FromIterator<ExplanationRecord> for ExplanationStore {
    fn from_iter<I: IntoIterator<Item = ExplanationRecord>>(iter: I) -> Self {
        let mut store = ExplanationStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}
