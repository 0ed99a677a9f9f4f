// src/junk_cleaner/walker.rs

use std::collections::{HashSet, VecDeque};
use std::fs::{self, DirEntry, ReadDir};
use std::iter::Take;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::classifier::{classify, Category};
use super::patterns::is_junk;
use super::types::JunkFile;
use crate::config::ScanConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    /// Deepest directory entered; the root is depth 0.
    pub max_depth: usize,
    /// Entries read from each directory listing, directories and files alike.
    pub max_entries_per_dir: usize,
    /// Files smaller than this are never junk.
    pub min_junk_size: u64,
}

impl Default for WalkLimits {
    fn default() -> Self {
        WalkLimits::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for WalkLimits {
    fn from(config: &ScanConfig) -> Self {
        WalkLimits {
            max_depth: config.max_depth,
            max_entries_per_dir: config.max_entries_per_dir,
            min_junk_size: config.min_junk_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A root passed the readability check and is being traversed.
    RootStarted(PathBuf),
    /// Display label for the entry being looked at.
    Visiting(String),
    /// A classified junk file.
    Found { category: Category, file: JunkFile },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    pub roots_scanned: usize,
    pub roots_skipped: usize,
    pub directories_visited: usize,
    pub files_examined: usize,
    pub junk_found: usize,
    pub cancelled: bool,
}

struct DirFrame {
    entries: Take<ReadDir>,
    depth: usize,
}

/// Depth-first junk walk over a list of roots.
///
/// Yields events lazily and cannot be restarted; build a new walk for a new
/// scan. The visited set spans all roots of the walk, so overlapping roots and
/// symlink loops contribute each directory once.
pub struct JunkWalk {
    limits: WalkLimits,
    roots: std::vec::IntoIter<PathBuf>,
    stack: Vec<DirFrame>,
    visited: HashSet<PathBuf>,
    pending: VecDeque<WalkEvent>,
    cancel: Option<CancellationToken>,
    summary: WalkSummary,
    finished: bool,
}

impl JunkWalk {
    pub fn new(roots: Vec<PathBuf>, limits: WalkLimits) -> Self {
        JunkWalk {
            limits,
            roots: roots.into_iter(),
            stack: Vec::new(),
            visited: HashSet::new(),
            pending: VecDeque::new(),
            cancel: None,
            summary: WalkSummary::default(),
            finished: false,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn summary(&self) -> WalkSummary {
        WalkSummary {
            directories_visited: self.visited.len(),
            ..self.summary
        }
    }

    pub fn visited(&self) -> &HashSet<PathBuf> {
        &self.visited
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    fn step(&mut self) {
        if self.stack.is_empty() {
            self.start_next_root();
            return;
        }
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        let depth = frame.depth;
        match frame.entries.next() {
            None => {
                self.stack.pop();
            }
            Some(Err(err)) => {
                log::debug!("Skipping unreadable directory entry: {}", err);
            }
            Some(Ok(entry)) => self.visit_entry(entry, depth),
        }
    }

    fn start_next_root(&mut self) {
        let Some(root) = self.roots.next() else {
            self.finished = true;
            return;
        };
        let root = std::path::absolute(&root).unwrap_or(root);
        match self.enter_dir(&root, 0) {
            Some(frame) => {
                self.summary.roots_scanned += 1;
                self.stack.push(frame);
                self.pending.push_back(WalkEvent::RootStarted(root));
            }
            None => {
                self.summary.roots_skipped += 1;
                log::debug!("Skipping root {}", root.display());
            }
        }
    }

    fn visit_entry(&mut self, entry: DirEntry, depth: usize) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        self.pending.push_back(WalkEvent::Visiting(name.clone()));

        // follows symlinks; the visited set breaks directory loops
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(err) => {
                log::debug!("Cannot stat {}: {}", path.display(), err);
                return;
            }
        };

        if metadata.is_dir() {
            if depth >= self.limits.max_depth {
                return;
            }
            if let Some(frame) = self.enter_dir(&path, depth + 1) {
                self.stack.push(frame);
            }
        } else if metadata.is_file() {
            self.summary.files_examined += 1;
            if let Some(event) = self.evaluate_file(&path, name, metadata.len()) {
                self.summary.junk_found += 1;
                self.pending.push_back(event);
            }
        }
    }

    fn evaluate_file(&self, path: &Path, name: String, size: u64) -> Option<WalkEvent> {
        if size < self.limits.min_junk_size {
            return None;
        }
        let path_str = path.to_string_lossy().into_owned();
        if !is_junk(&path_str, &name) {
            return None;
        }
        let category = classify(&path_str, &name);
        Some(WalkEvent::Found {
            category,
            file: JunkFile::new(name, path_str, size),
        })
    }

    /// Mark a directory visited and open its listing. `None` when it was
    /// already visited or cannot be read.
    fn enter_dir(&mut self, path: &Path, depth: usize) -> Option<DirFrame> {
        let canonical = match fs::canonicalize(path) {
            Ok(p) => p,
            Err(err) => {
                log::debug!("Cannot resolve {}: {}", path.display(), err);
                return None;
            }
        };
        if !self.visited.insert(canonical) {
            return None;
        }
        match fs::read_dir(path) {
            Ok(entries) => Some(DirFrame {
                entries: entries.take(self.limits.max_entries_per_dir),
                depth,
            }),
            Err(err) => {
                log::debug!("Cannot list {}: {}", path.display(), err);
                None
            }
        }
    }
}

impl Iterator for JunkWalk {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            if self.finished {
                return None;
            }
            if self.is_cancelled() {
                self.summary.cancelled = true;
                self.pending.clear();
                self.stack.clear();
                self.finished = true;
                return None;
            }
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            self.step();
        }
    }
}

/// Walk `roots` to completion and return the junk files found, in discovery order.
pub fn collect_junk(roots: Vec<PathBuf>, limits: WalkLimits) -> Vec<(Category, JunkFile)> {
    JunkWalk::new(roots, limits)
        .filter_map(|event| match event {
            WalkEvent::Found { category, file } => Some((category, file)),
            _ => None,
        })
        .collect()
}
