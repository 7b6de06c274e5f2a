use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::evaluation::{EvaluationContext, EvaluationReason};

const MIN_CAPACITY: usize = 100;
const MAX_CAPACITY: usize = 100_000;

/// Analytics record for one single-flag evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEvent {
    pub kind: &'static str,
    pub creation_date: i64,
    pub key: String,
    pub context_keys: BTreeMap<String, String>,
    pub value: Value,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EvaluationReason>,
}

impl FeatureEvent {
    pub fn new(
        key: &str,
        context: &EvaluationContext,
        value: Value,
        default: Value,
        reason: Option<EvaluationReason>,
    ) -> Self {
        FeatureEvent {
            kind: "feature",
            creation_date: Utc::now().timestamp_millis(),
            key: key.to_string(),
            context_keys: BTreeMap::from([(context.kind.clone(), context.key.clone())]),
            value,
            default,
            reason,
        }
    }
}

/// Bounded queue of events waiting for the next flush. When full, the oldest
/// event is dropped to make room.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    capacity: usize,
    queue: Arc<Mutex<VecDeque<FeatureEvent>>>,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        EventBuffer {
            capacity: capacity.clamp(MIN_CAPACITY, MAX_CAPACITY),
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, event: FeatureEvent) {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            tracing::warn!(capacity = self.capacity, "event buffer full, dropping oldest event");
        }
        queue.push_back(event);
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<FeatureEvent> {
        self.lock().drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FeatureEvent>> {
        // a panic while holding the lock cannot leave the queue half-written
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
