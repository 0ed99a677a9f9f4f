use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::classifier::Category;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JunkFile {
    pub name: String,
    pub path: String, // absolute, unique key
    pub size: u64,
    pub selected: bool,
}

impl JunkFile {
    /// A freshly discovered file; selected by default.
    pub fn new(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        JunkFile {
            name: name.into(),
            path: path.into(),
            size,
            selected: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
}

/// Files of one category, unique by path, in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket {
    pub category: Category,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub expanded: bool,
    files: Vec<JunkFile>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CategoryBucket {
    pub fn new(category: Category) -> Self {
        CategoryBucket {
            category,
            display_name: category.display_name(),
            icon: category.icon(),
            expanded: false,
            files: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn files(&self) -> &[JunkFile] {
        &self.files
    }

    pub fn get(&self, path: &str) -> Option<&JunkFile> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Insert a file; a path already present is left untouched.
    /// Returns `true` when the file was added.
    pub(crate) fn insert(&mut self, file: JunkFile) -> bool {
        if self.index.contains_key(&file.path) {
            return false;
        }
        self.index.insert(file.path.clone(), self.files.len());
        self.files.push(file);
        true
    }

    /// Flip one file's selection; `false` when the path is unknown.
    pub(crate) fn toggle_file(&mut self, path: &str) -> bool {
        match self.index.get(path) {
            Some(&i) => {
                let file = &mut self.files[i];
                file.selected = !file.selected;
                true
            }
            None => false,
        }
    }

    /// Any selection present deselects everything; otherwise select everything.
    pub(crate) fn toggle_all(&mut self) {
        let new_state = !self.has_selected_files();
        for file in &mut self.files {
            file.selected = new_state;
        }
    }

    /// Keep only unselected files.
    pub(crate) fn retain_unselected(&mut self) {
        self.files.retain(|f| !f.selected);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.path.clone(), i))
            .collect();
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn selected_size(&self) -> u64 {
        self.files.iter().filter(|f| f.selected).map(|f| f.size).sum()
    }

    pub fn selected_count(&self) -> usize {
        self.files.iter().filter(|f| f.selected).count()
    }

    pub fn has_selected_files(&self) -> bool {
        self.files.iter().any(|f| f.selected)
    }

    pub fn has_unselected_files(&self) -> bool {
        self.files.iter().any(|f| !f.selected)
    }

    pub fn is_partially_selected(&self) -> bool {
        self.has_selected_files() && self.has_unselected_files()
    }

    /// Non-empty and every file selected.
    pub fn all_selected(&self) -> bool {
        !self.files.is_empty() && !self.has_unselected_files()
    }

    pub fn summary(&self) -> BucketSummary {
        BucketSummary {
            category: self.category,
            display_name: self.display_name,
            file_count: self.files.len(),
            total_size: self.total_size(),
            selected_size: self.selected_size(),
            selected_count: self.selected_count(),
            all_selected: self.all_selected(),
            partially_selected: self.is_partially_selected(),
            expanded: self.expanded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub category: Category,
    pub display_name: &'static str,
    pub file_count: usize,
    pub total_size: u64,
    pub selected_size: u64,
    pub selected_count: usize,
    pub all_selected: bool,
    pub partially_selected: bool,
    pub expanded: bool,
}

/// Immutable view of a session published to observers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: ScanState,
    pub current_path_label: String,
    pub total_garbage_size: u64,
    pub directories_visited: usize,
    pub buckets: Vec<Arc<CategoryBucket>>,
}

impl SessionSnapshot {
    pub fn bucket(&self, category: Category) -> &CategoryBucket {
        &self.buckets[category.index()]
    }

    pub fn summaries(&self) -> Vec<BucketSummary> {
        self.buckets.iter().map(|b| b.summary()).collect()
    }

    pub fn has_any_selected(&self) -> bool {
        self.buckets.iter().any(|b| b.has_selected_files())
    }

    pub fn selected_size(&self) -> u64 {
        self.buckets.iter().map(|b| b.selected_size()).sum()
    }

    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    pub attempted: usize,
    pub deleted_count: usize,
    pub deleted_bytes: u64,
}

impl CleanReport {
    /// Files that were selected but could not be removed.
    pub fn failed_count(&self) -> usize {
        self.attempted.saturating_sub(self.deleted_count)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanProgress {
    pub processed: usize,
    pub total: usize,
    pub deleted_bytes: u64,
    pub current_path: String,
    pub eta_ms: Option<u32>,
    pub files_per_s: Option<f32>,
    pub mb_per_s: Option<f32>,
}

impl CleanProgress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total) as u32
    }
}
