// src/junk_cleaner/session.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch, Mutex};

use super::classifier::Category;
use super::executor::delete_files;
use super::format::format_size;
use super::patterns::compiled_pattern_count;
use super::roots::resolve_roots;
use super::types::{
    CategoryBucket, CleanProgress, CleanReport, JunkFile, ScanState, SessionSnapshot,
};
use super::walker::{JunkWalk, WalkEvent, WalkLimits};
use crate::config::{load_config, OperationMetrics, ScanConfig};
use crate::error::{CleanerError, Result};
use crate::ops::{OpGuard, OperationKind, OperationRegistry, OperationStatus};

const EVENT_BUFFER: usize = 1024;

/// Authoritative scan state. Only the session mutates it, one writer at a time.
pub(crate) struct SessionCore {
    state: ScanState,
    label: String,
    total_garbage_size: u64,
    directories_visited: usize,
    buckets: Vec<Arc<CategoryBucket>>,
}

impl SessionCore {
    pub(crate) fn new() -> Self {
        SessionCore {
            state: ScanState::Idle,
            label: String::new(),
            total_garbage_size: 0,
            directories_visited: 0,
            buckets: empty_buckets(),
        }
    }

    pub(crate) fn state(&self) -> ScanState {
        self.state
    }

    pub(crate) fn begin_scan(&mut self) {
        self.state = ScanState::Scanning;
        self.label.clear();
        self.total_garbage_size = 0;
        self.directories_visited = 0;
        self.buckets = empty_buckets();
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    /// Add a discovered file to its bucket; `false` when the path was already there.
    pub(crate) fn record(&mut self, category: Category, file: JunkFile) -> bool {
        Arc::make_mut(&mut self.buckets[category.index()]).insert(file)
    }

    pub(crate) fn complete_scan(&mut self, directories_visited: usize) {
        self.directories_visited = directories_visited;
        self.recompute_total();
        self.label = "Scan completed".to_string();
        self.state = ScanState::Completed;
    }

    /// Cancelled scan: keep what was found so far, go back to idle.
    pub(crate) fn interrupt_scan(&mut self, directories_visited: usize) {
        self.directories_visited = directories_visited;
        self.recompute_total();
        self.label = "Scan cancelled".to_string();
        self.state = ScanState::Idle;
    }

    /// Failed scan: partial results are not trusted.
    pub(crate) fn abandon_scan(&mut self) {
        self.buckets = empty_buckets();
        self.total_garbage_size = 0;
        self.directories_visited = 0;
        self.label.clear();
        self.state = ScanState::Idle;
    }

    pub(crate) fn toggle_file_selection(&mut self, category: Category, path: &str) -> bool {
        let bucket = &mut self.buckets[category.index()];
        if bucket.get(path).is_none() {
            return false;
        }
        Arc::make_mut(bucket).toggle_file(path)
    }

    pub(crate) fn toggle_category_selection(&mut self, category: Category) {
        Arc::make_mut(&mut self.buckets[category.index()]).toggle_all();
    }

    pub(crate) fn toggle_category_expansion(&mut self, category: Category) {
        let bucket = Arc::make_mut(&mut self.buckets[category.index()]);
        bucket.expanded = !bucket.expanded;
    }

    pub(crate) fn has_any_selected(&self) -> bool {
        self.buckets.iter().any(|b| b.has_selected_files())
    }

    /// Selected files in bucket order, then discovery order.
    pub(crate) fn selected_files(&self) -> Vec<JunkFile> {
        self.buckets
            .iter()
            .flat_map(|b| b.files().iter().filter(|f| f.selected).cloned())
            .collect()
    }

    /// Drop every selected entry, whether or not its deletion succeeded.
    pub(crate) fn finish_cleanup(&mut self) {
        for bucket in &mut self.buckets {
            let bucket = Arc::make_mut(bucket);
            bucket.retain_unselected();
            bucket.expanded = false;
        }
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total_garbage_size = self.buckets.iter().map(|b| b.total_size()).sum();
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            current_path_label: self.label.clone(),
            total_garbage_size: self.total_garbage_size,
            directories_visited: self.directories_visited,
            buckets: self.buckets.clone(),
        }
    }
}

fn empty_buckets() -> Vec<Arc<CategoryBucket>> {
    Category::ALL
        .iter()
        .map(|&c| Arc::new(CategoryBucket::new(c)))
        .collect()
}

/// Puts the session back to idle when a scan future is dropped mid-run.
struct ScanReset {
    session: ScanSession,
    op: OpGuard,
}

impl ScanReset {
    fn disarm(&mut self) {
        self.op.disarm();
    }
}

impl Drop for ScanReset {
    fn drop(&mut self) {
        if !self.op.retire() {
            return;
        }
        let session = self.session.clone();
        if let Ok(mut core) = session.core.try_lock() {
            session.reset_dropped_scan(&mut core);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut core = session.core.lock().await;
                    session.reset_dropped_scan(&mut core);
                });
            }
            Err(_) => log::warn!("Dropped junk scan left the session busy"),
        }
    }
}

/// Handle to a junk scan session.
///
/// Clones share the same state. Observers read immutable snapshots through
/// [`ScanSession::subscribe`] or [`ScanSession::snapshot`].
#[derive(Clone)]
pub struct ScanSession {
    pub(crate) core: Arc<Mutex<SessionCore>>,
    snapshots: Arc<watch::Sender<Arc<SessionSnapshot>>>,
    pub(crate) registry: OperationRegistry,
    config: Arc<ScanConfig>,
}

impl Default for ScanSession {
    fn default() -> Self {
        ScanSession::new(load_config())
    }
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_registry(config, OperationRegistry::default())
    }

    /// Share an operation registry (and its scan/clean guards) with other components.
    pub fn with_registry(config: ScanConfig, registry: OperationRegistry) -> Self {
        log::debug!("Loaded {} junk patterns", compiled_pattern_count());
        let core = SessionCore::new();
        let (tx, _rx) = watch::channel(Arc::new(core.snapshot()));
        ScanSession {
            core: Arc::new(Mutex::new(core)),
            snapshots: Arc::new(tx),
            registry,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshots.borrow().clone()
    }

    fn publish(&self, core: &SessionCore) -> Arc<SessionSnapshot> {
        let snapshot = Arc::new(core.snapshot());
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn reset_dropped_scan(&self, core: &mut SessionCore) {
        // a newer scan may already own the state
        if core.state() != ScanState::Scanning
            || !self.registry.active(&OperationKind::JunkScan).is_empty()
        {
            return;
        }
        core.interrupt_scan(0);
        self.publish(core);
        log::info!("Junk scan dropped before completion");
    }

    /// Scan the roots derived from the session config.
    pub async fn start_scan(&self) -> Result<Arc<SessionSnapshot>> {
        let roots = resolve_roots(&self.config);
        self.start_scan_with_roots(roots).await
    }

    /// Reset the session and scan `roots` in order.
    ///
    /// Fails fast with `ScanInProgress` when another scan holds the guard.
    /// Returns `Cancelled` after [`ScanSession::cancel_scan`]; found files are
    /// kept in that case. A crashed walk returns `ScanFailed` and clears them.
    pub async fn start_scan_with_roots(&self, roots: Vec<PathBuf>) -> Result<Arc<SessionSnapshot>> {
        let _permit = self
            .registry
            .scan_sem
            .clone()
            .try_acquire_owned()
            .map_err(|_| CleanerError::ScanInProgress)?;

        let (op_id, token) = self.registry.register(OperationKind::JunkScan, true);
        let mut reset = ScanReset {
            session: self.clone(),
            op: OpGuard::new(&self.registry, &op_id, &token),
        };
        let mut metrics = OperationMetrics::new("junk_scan");

        {
            let mut core = self.core.lock().await;
            core.begin_scan();
            self.publish(&core);
        }
        self.registry.update(&op_id, |s| {
            s.status = OperationStatus::Running;
            s.stage = "scanning".into();
        });
        log::info!("Starting junk scan over {} roots", roots.len());

        let (tx, mut rx) = mpsc::channel::<WalkEvent>(EVENT_BUFFER);
        let limits = WalkLimits::from(self.config.as_ref());
        let walk_token = token.clone();
        let walker = tokio::task::spawn_blocking(move || {
            let mut walk = JunkWalk::new(roots, limits).with_cancel(walk_token);
            for event in walk.by_ref() {
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
            walk.summary()
        });

        let interval = self.config.progress_interval();
        let mut last_publish = Instant::now();
        let mut found = 0usize;
        while let Some(event) = rx.recv().await {
            let mut core = self.core.lock().await;
            // checked under the lock so nothing lands after a cancel
            if token.is_cancelled() {
                break;
            }
            match event {
                WalkEvent::RootStarted(root) => {
                    let name = root
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| root.display().to_string());
                    core.set_label(format!("Scanning: {}...", name));
                }
                WalkEvent::Visiting(name) => core.set_label(format!("Scanning: {}", name)),
                WalkEvent::Found { category, file } => {
                    if core.record(category, file) {
                        found += 1;
                    }
                }
            }
            if last_publish.elapsed() >= interval {
                self.publish(&core);
                self.registry
                    .update(&op_id, |s| s.details = Some(core.label.clone()));
                last_publish = Instant::now();
            }
        }
        // unblock the walker if we stopped reading early
        drop(rx);
        metrics.checkpoint("walk");

        let summary = match walker.await {
            Ok(summary) => summary,
            Err(join_err) => {
                let mut core = self.core.lock().await;
                reset.disarm();
                core.abandon_scan();
                self.publish(&core);
                let msg = join_err.to_string();
                log::warn!("Junk scan failed: {}", msg);
                self.registry.finish_failed(&op_id, &msg);
                return Err(CleanerError::ScanFailed(msg));
            }
        };

        let mut core = self.core.lock().await;
        reset.disarm();
        if token.is_cancelled() || summary.cancelled {
            core.interrupt_scan(summary.directories_visited);
            self.publish(&core);
            self.registry.finish_canceled(&op_id);
            log::info!("Junk scan cancelled after {} files", found);
            return Err(CleanerError::Cancelled);
        }

        core.complete_scan(summary.directories_visited);
        let snapshot = self.publish(&core);
        drop(core);
        metrics.checkpoint("aggregate");
        self.registry.finish_success(&op_id);

        log::info!(
            "Junk scan finished: {} files, {} in {} directories ({} roots skipped)",
            found,
            format_size(snapshot.total_garbage_size),
            summary.directories_visited,
            summary.roots_skipped
        );
        log::debug!("{:?}", metrics.complete());
        Ok(snapshot)
    }

    /// Cancel the running scan, if any. It stops after the current entry.
    pub fn cancel_scan(&self) -> bool {
        self.registry
            .active(&OperationKind::JunkScan)
            .iter()
            .fold(false, |any, id| self.registry.cancel(id) || any)
    }

    pub async fn toggle_file_selection(&self, category: Category, path: &str) -> bool {
        let mut core = self.core.lock().await;
        let changed = core.toggle_file_selection(category, path);
        if changed {
            self.publish(&core);
        }
        changed
    }

    /// Deselect the whole bucket when any file in it is selected, else select all.
    pub async fn toggle_category_selection(&self, category: Category) {
        let mut core = self.core.lock().await;
        core.toggle_category_selection(category);
        self.publish(&core);
    }

    pub async fn toggle_category_expansion(&self, category: Category) {
        let mut core = self.core.lock().await;
        core.toggle_category_expansion(category);
        self.publish(&core);
    }

    pub async fn has_any_selected(&self) -> bool {
        self.core.lock().await.has_any_selected()
    }

    /// Delete every selected file and drop all selected entries from the buckets.
    pub async fn clean_selected(&self) -> Result<CleanReport> {
        self.clean_selected_with_progress(|_| {}).await
    }

    /// [`ScanSession::clean_selected`] with a callback after each file.
    ///
    /// Holds the session lock for the whole run, so toggles wait until the
    /// buckets are rebuilt. Rejected while a scan is running.
    pub async fn clean_selected_with_progress<F>(&self, mut on_progress: F) -> Result<CleanReport>
    where
        F: FnMut(&CleanProgress) + Send + 'static,
    {
        let _permit = self
            .registry
            .clean_sem
            .clone()
            .try_acquire_owned()
            .map_err(|_| CleanerError::CleanupInProgress)?;

        let mut core = self.core.lock().await;
        if core.state() == ScanState::Scanning {
            return Err(CleanerError::ScanInProgress);
        }

        let files = core.selected_files();
        let (op_id, token) = self.registry.register(OperationKind::JunkClean, false);
        let mut op = OpGuard::new(&self.registry, &op_id, &token);
        self.registry.update(&op_id, |s| {
            s.status = OperationStatus::Running;
            s.stage = "deleting".into();
        });

        let registry = self.registry.clone();
        let progress_id = op_id.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            delete_files(&files, |progress| {
                registry.update(&progress_id, |s| {
                    s.progress = progress.percent() as f32;
                    s.eta_ms = progress.eta_ms;
                    s.details = Some(progress.current_path.clone());
                });
                on_progress(progress);
            })
        })
        .await;

        let report = match outcome {
            Ok(report) => report,
            Err(join_err) => {
                op.disarm();
                self.registry.finish_failed(&op_id, &join_err.to_string());
                return Err(join_err.into());
            }
        };

        op.disarm();
        core.finish_cleanup();
        self.publish(&core);
        self.registry.finish_success(&op_id);

        log::info!(
            "Cleanup removed {} of {} files, {} reclaimed",
            report.deleted_count,
            report.attempted,
            format_size(report.deleted_bytes)
        );
        Ok(report)
    }
}
