use crate::kt::bkt;
use crate::kt::config::ModelConfig;
use crate::kt::types::{HistoryPoint, MasteryRecord, MasterySnapshot, Topic};

/// Per-topic mastery. Exactly one record per topic for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct MasteryStore {
    records: [MasteryRecord; Topic::COUNT],
}

impl MasteryStore {
    pub fn new(initial_mastery: f64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let initial = bkt::clamp_mastery(initial_mastery);
        Self {
            records: Topic::ALL.map(|topic| MasteryRecord::new(topic, initial, now)),
        }
    }

    pub fn get(&self, topic: Topic) -> &MasteryRecord {
        &self.records[topic.index()]
    }

    pub fn records(&self) -> &[MasteryRecord] {
        &self.records
    }

    pub fn apply_update(
        &mut self,
        topic: Topic,
        is_correct: bool,
        config: &ModelConfig,
    ) -> &MasteryRecord {
        let record = &mut self.records[topic.index()];
        let posterior = bkt::update(record.mastery_level, is_correct, config);
        record.mastery_level = posterior;
        record.history.push(HistoryPoint {
            timestamp: chrono::Utc::now().timestamp_millis(),
            value: posterior,
        });
        record
    }

    pub fn snapshot_all(&self) -> MasterySnapshot {
        self.records
            .iter()
            .map(|r| (r.topic, r.mastery_level))
            .collect()
    }
}
