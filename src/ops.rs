use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub type OperationId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Completed,
    Canceled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    JunkScan,
    JunkClean,
    LargeFileScan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpState {
    pub id: OperationId,
    pub kind: OperationKind,
    pub started_at_ms: u128,
    pub stage: String,
    pub progress: f32,
    pub eta_ms: Option<u32>,
    pub details: Option<String>,
    pub cancellable: bool,
    pub status: OperationStatus,
}

/// Live operations keyed by id, plus the guards that keep scans and cleanups
/// from overlapping.
#[derive(Clone)]
pub struct OperationRegistry {
    inner: Arc<DashMap<OperationId, (OpState, CancellationToken)>>,
    pub scan_sem: Arc<Semaphore>,
    pub clean_sem: Arc<Semaphore>,
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl OperationRegistry {
    pub fn new(scan_permits: usize, clean_permits: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            scan_sem: Arc::new(Semaphore::new(scan_permits.max(1))),
            clean_sem: Arc::new(Semaphore::new(clean_permits.max(1))),
        }
    }

    pub fn register(
        &self,
        kind: OperationKind,
        cancellable: bool,
    ) -> (OperationId, CancellationToken) {
        let id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        let state = OpState {
            id: id.clone(),
            kind,
            started_at_ms: now_ms(),
            stage: "pending".into(),
            progress: 0.0,
            eta_ms: None,
            details: None,
            cancellable,
            status: OperationStatus::Pending,
        };
        self.inner.insert(id.clone(), (state, token.clone()));
        (id, token)
    }

    pub fn update(&self, id: &str, mut f: impl FnMut(&mut OpState)) {
        if let Some(mut entry) = self.inner.get_mut(id) {
            f(&mut entry.0);
        }
    }

    pub fn get(&self, id: &str) -> Option<OpState> {
        self.inner.get(id).map(|e| e.0.clone())
    }

    /// States of every live operation, for progress displays.
    pub fn list(&self) -> Vec<OpState> {
        self.inner.iter().map(|e| e.value().0.clone()).collect()
    }

    /// Ids of live operations of the given kind.
    pub fn active(&self, kind: &OperationKind) -> Vec<OperationId> {
        self.inner
            .iter()
            .filter(|e| &e.value().0.kind == kind)
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn cancel(&self, id: &str) -> bool {
        if let Some(entry) = self.inner.get(id) {
            if !entry.0.cancellable {
                return false;
            }
            entry.1.cancel();
            true
        } else {
            false
        }
    }

    pub fn finish_success(&self, id: &str) {
        self.update(id, |s| {
            s.status = OperationStatus::Completed;
            s.progress = 100.0;
            s.stage = "complete".into();
        });
        // finished operations are not kept; callers read the final state
        // from the value the operation returned
        let _ = self.inner.remove(id);
    }

    pub fn finish_canceled(&self, id: &str) {
        self.update(id, |s| {
            s.status = OperationStatus::Canceled;
        });
        let _ = self.inner.remove(id);
    }

    pub fn finish_failed(&self, id: &str, msg: &str) {
        self.update(id, |s| {
            s.status = OperationStatus::Failed;
            s.details = Some(msg.to_string());
        });
        log::debug!("Operation {} failed: {}", id, msg);
        let _ = self.inner.remove(id);
    }
}

/// Retires an operation whose future is dropped before it reports an outcome.
///
/// Call [`OpGuard::disarm`] once the operation has finished through the
/// registry itself; otherwise dropping the guard cancels the token and removes
/// the entry as canceled.
pub struct OpGuard {
    registry: OperationRegistry,
    id: OperationId,
    token: CancellationToken,
    armed: bool,
}

impl OpGuard {
    pub fn new(registry: &OperationRegistry, id: &str, token: &CancellationToken) -> Self {
        OpGuard {
            registry: registry.clone(),
            id: id.to_string(),
            token: token.clone(),
            armed: true,
        }
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Cancel and remove the operation now; `false` if already disarmed.
    pub fn retire(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        self.token.cancel();
        self.registry.finish_canceled(&self.id);
        log::debug!("Operation {} dropped before completion", self.id);
        true
    }
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.retire();
    }
}

fn now_ms() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

// Simple throughput helper to compute per-tick metrics
#[derive(Default, Clone)]
pub struct ThroughputTracker {
    last_tick: Option<Instant>,
    last_files: u64,
    last_bytes: u64,
}

impl ThroughputTracker {
    /// Returns `(eta_ms, files_per_s, mb_per_s)`; the first tick only primes the tracker.
    pub fn tick(
        &mut self,
        files_done: u64,
        bytes_done: u64,
        total_files: u64,
    ) -> (Option<u32>, Option<f32>, Option<f32>) {
        let now = Instant::now();
        if let Some(prev) = self.last_tick {
            let dt = now.duration_since(prev).as_secs_f32().max(0.001);
            let df = (files_done.saturating_sub(self.last_files)) as f32;
            let db = (bytes_done.saturating_sub(self.last_bytes)) as f32;
            let files_per_s = df / dt;
            let mb_per_s = (db / 1_048_576.0) / dt;
            let eta_ms = if files_per_s > 0.0 {
                let rem = (total_files.saturating_sub(files_done)) as f32;
                Some(((rem / files_per_s) * 1000.0) as u32)
            } else {
                None
            };
            self.last_tick = Some(now);
            self.last_files = files_done;
            self.last_bytes = bytes_done;
            (eta_ms, Some(files_per_s), Some(mb_per_s))
        } else {
            self.last_tick = Some(now);
            self.last_files = files_done;
            self.last_bytes = bytes_done;
            (None, None, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_reaches_registered_token() {
        let registry = OperationRegistry::default();
        let (id, token) = registry.register(OperationKind::JunkScan, true);
        assert_eq!(registry.active(&OperationKind::JunkScan), vec![id.clone()]);
        assert!(registry.cancel(&id));
        assert!(token.is_cancelled());
        registry.finish_canceled(&id);
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn non_cancellable_operation_ignores_cancel() {
        let registry = OperationRegistry::default();
        let (id, token) = registry.register(OperationKind::JunkClean, false);
        assert!(!registry.cancel(&id));
        assert!(!token.is_cancelled());
        assert!(!registry.cancel("missing"));
    }

    #[test]
    fn single_permit_guards() {
        let registry = OperationRegistry::default();
        let first = registry.scan_sem.clone().try_acquire_owned();
        assert!(first.is_ok());
        assert!(registry.scan_sem.clone().try_acquire_owned().is_err());
        drop(first);
        assert!(registry.scan_sem.clone().try_acquire_owned().is_ok());
    }

    #[test]
    fn dropped_guard_cancels_and_removes() {
        let registry = OperationRegistry::default();
        let (id, token) = registry.register(OperationKind::LargeFileScan, true);
        {
            let _guard = OpGuard::new(&registry, &id, &token);
            assert_eq!(registry.list().len(), 1);
        }
        assert!(token.is_cancelled());
        assert!(registry.get(&id).is_none());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn disarmed_guard_leaves_operation_alone() {
        let registry = OperationRegistry::default();
        let (id, token) = registry.register(OperationKind::JunkClean, false);
        let mut guard = OpGuard::new(&registry, &id, &token);
        guard.disarm();
        assert!(!guard.retire());
        drop(guard);
        assert!(!token.is_cancelled());
        assert_eq!(registry.get(&id).map(|s| s.kind), Some(OperationKind::JunkClean));
    }

    #[test]
    fn throughput_first_tick_primes() {
        let mut tracker = ThroughputTracker::default();
        assert_eq!(tracker.tick(0, 0, 10), (None, None, None));
        let (_, files_per_s, _) = tracker.tick(5, 5_000, 10);
        assert!(files_per_s.is_some());
    }
}
