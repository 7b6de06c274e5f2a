//! In-memory flag backend for tests.
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{BackendError, FlagBackend, Result};
use crate::evaluation::{EvaluationContext, FlagsState};

#[derive(Default)]
pub struct FakeFlagBackend {
    snapshot: FlagsState,
    init_delay: Duration,
    failing_inits: AtomicUsize,
    failing_keys: HashSet<String>,
    initializations: AtomicUsize,
    evaluated: Mutex<Vec<String>>,
    pending: AtomicUsize,
    flushed: AtomicUsize,
    snapshot_contexts: Mutex<Vec<EvaluationContext>>,
    snapshot_with_reasons: Mutex<Vec<bool>>,
    variation_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    flush_delay: Duration,
}

impl FakeFlagBackend {
    pub fn with_snapshot(snapshot: FlagsState) -> Self {
        FakeFlagBackend {
            snapshot,
            ..Default::default()
        }
    }

    pub fn with_init_delay_ms(mut self, millis: u64) -> Self {
        self.init_delay = Duration::from_millis(millis);
        self
    }

    pub fn with_variation_delay_ms(mut self, millis: u64) -> Self {
        self.variation_delay = Duration::from_millis(millis);
        self
    }

    pub fn with_flush_delay_ms(mut self, millis: u64) -> Self {
        self.flush_delay = Duration::from_millis(millis);
        self
    }

    /// The first `count` initializations fail.
    pub fn with_failing_inits(self, count: usize) -> Self {
        self.failing_inits.store(count, Ordering::SeqCst);
        self
    }

    /// Single-flag evaluations of `key` fail.
    pub fn with_failing_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    /// Keys passed to `variation`, sorted.
    pub fn evaluated_keys(&self) -> Vec<String> {
        let mut keys = self.evaluated.lock().unwrap().clone();
        keys.sort();
        keys
    }

    pub fn flushed(&self) -> usize {
        self.flushed.load(Ordering::SeqCst)
    }

    pub fn snapshot_contexts(&self) -> Vec<EvaluationContext> {
        self.snapshot_contexts.lock().unwrap().clone()
    }

    /// `with_reasons` argument of every snapshot request.
    pub fn snapshot_with_reasons(&self) -> Vec<bool> {
        self.snapshot_with_reasons.lock().unwrap().clone()
    }

    /// Most `variation` calls seen running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn unavailable(endpoint: &str) -> BackendError {
    BackendError::Status {
        endpoint: endpoint.to_string(),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[async_trait]
impl FlagBackend for FakeFlagBackend {
    async fn wait_for_initialization(&self) -> Result<()> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.init_delay).await;

        let remaining = self.failing_inits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_inits.store(remaining - 1, Ordering::SeqCst);
            return Err(unavailable("/status"));
        }
        Ok(())
    }

    async fn all_flags_state(
        &self,
        context: &EvaluationContext,
        with_reasons: bool,
    ) -> Result<FlagsState> {
        self.snapshot_contexts.lock().unwrap().push(context.clone());
        self.snapshot_with_reasons.lock().unwrap().push(with_reasons);
        Ok(self.snapshot.clone())
    }

    async fn variation(
        &self,
        flag_key: &str,
        _context: &EvaluationContext,
        default: Value,
    ) -> Result<Value> {
        self.evaluated.lock().unwrap().push(flag_key.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(self.variation_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_keys.contains(flag_key) {
            return Err(unavailable(flag_key));
        }

        self.pending.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .snapshot
            .flags
            .get(flag_key)
            .map(|state| state.value.clone())
            .filter(|value| !value.is_null())
            .unwrap_or(default))
    }

    async fn flush(&self) -> Result<usize> {
        tokio::time::sleep(self.flush_delay).await;
        let sent = self.pending.swap(0, Ordering::SeqCst);
        self.flushed.fetch_add(sent, Ordering::SeqCst);
        Ok(sent)
    }
}
