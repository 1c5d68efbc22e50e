//! Active file selection and the snapshot readers query.
//!
//! The manager holds one [`Snapshot`] behind an [`ArcSwap`]. `select` builds
//! a complete replacement (store, fresh cache, metadata) before swapping it
//! in, so a failed load never disturbs the installed snapshot and a reader
//! that already holds a snapshot finishes against consistent data.
//!
//! ```no_run
//! use chatlens_core::{AnalyticsConfig, SelectionManager, ViewKey};
//!
//! let manager = SelectionManager::new("/srv/chat/processed", AnalyticsConfig::default());
//! manager.select(&["2024-01.ndjson", "2024-02.ndjson"])?;
//! let summary = manager.view(&ViewKey::Summary);
//! println!("{:?}", summary.summary());
//! # Ok::<(), chatlens_core::Error>(())
//! ```

use crate::analytics::{self, AggregateResult, Report, ViewKey};
use crate::cache::AggregateCache;
use crate::config::{AnalyticsConfig, Config};
use crate::error::{Error, Result};
use crate::store::{LoadReport, RecordStore};
use arc_swap::ArcSwap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Archive extensions listed by [`SelectionManager::available_files`].
const ARCHIVE_PATTERNS: &[&str] = &["*.ndjson", "*.jsonl"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    /// Nothing selected yet
    Empty,
    Loaded,
}

/// One store generation together with its cache.
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    files: Vec<String>,
    selection_id: Option<String>,
    store: RecordStore,
    cache: AggregateCache,
    config: AnalyticsConfig,
    load_report: Option<LoadReport>,
}

impl Snapshot {
    fn empty(config: AnalyticsConfig) -> Self {
        Self {
            generation: 0,
            files: Vec::new(),
            selection_id: None,
            store: RecordStore::empty(),
            cache: AggregateCache::new(),
            config,
            load_report: None,
        }
    }

    pub fn state(&self) -> SelectionState {
        if self.generation == 0 {
            SelectionState::Empty
        } else {
            SelectionState::Loaded
        }
    }

    /// 0 before the first successful select, then +1 per select.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// File names as selected, duplicates removed.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn selection_id(&self) -> Option<&str> {
        self.selection_id.as_deref()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn cache(&self) -> &AggregateCache {
        &self.cache
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.load_report.as_ref()
    }

    /// Result of one view, computed at most once per snapshot.
    pub fn view(&self, key: &ViewKey) -> Arc<AggregateResult> {
        self.cache
            .get_or_compute(key, || analytics::compute(key, &self.store, &self.config))
    }

    /// Every dashboard view, rankings cut to the configured top-N.
    pub fn report(&self) -> Report {
        let top_n = Some(self.config.top_n);

        Report {
            generation: self.generation,
            files: self.files.clone(),
            summary: self.typed_view(ViewKey::Summary, AggregateResult::summary),
            daily_trend: self.typed_view(ViewKey::DailyTrend, AggregateResult::daily_trend),
            heatmap: self.typed_view(ViewKey::Heatmap, AggregateResult::heatmap),
            top_users: self.typed_view(
                ViewKey::TopUsers { limit: top_n },
                AggregateResult::top_users,
            ),
            message_types: self.typed_view(ViewKey::MessageTypes, AggregateResult::message_types),
            length_histograms: self.typed_view(
                ViewKey::LengthHistograms,
                AggregateResult::length_histograms,
            ),
            payments: self.typed_view(ViewKey::Payments, AggregateResult::payments),
            user_payment_ranking: self.typed_view(
                ViewKey::UserPaymentRanking { limit: top_n },
                AggregateResult::user_payment_ranking,
            ),
            source_ratio: self.typed_view(ViewKey::SourceRatio, AggregateResult::source_ratio),
        }
    }

    /// Cached view unwrapped to its concrete type.
    ///
    /// [`analytics::compute`] always returns the variant named by the key.
    fn typed_view<T: Clone>(
        &self,
        key: ViewKey,
        pick: fn(&AggregateResult) -> Option<&T>,
    ) -> T {
        let result = self.view(&key);
        match pick(&*result) {
            Some(value) => value.clone(),
            None => unreachable!("view {} returned a {} result", key, result.view_name()),
        }
    }
}

/// Owns the current selection of archive files.
///
/// One writer at a time; any number of concurrent readers.
#[derive(Debug)]
pub struct SelectionManager {
    data_dir: PathBuf,
    config: AnalyticsConfig,
    current: ArcSwap<Snapshot>,
    select_lock: Mutex<()>,
}

impl SelectionManager {
    pub fn new(data_dir: impl Into<PathBuf>, config: AnalyticsConfig) -> Self {
        let current = ArcSwap::from_pointee(Snapshot::empty(config.clone()));
        Self {
            data_dir: data_dir.into(),
            config,
            current,
            select_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir(), config.analytics.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Replace the active selection with `file_names`, relative to the data
    /// directory.
    ///
    /// On any error the previous snapshot stays installed.
    pub fn select<S: AsRef<str>>(&self, file_names: &[S]) -> Result<LoadReport> {
        let _guard = self
            .select_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if file_names.is_empty() {
            return Err(Error::Input("no files selected".to_string()));
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(file_names.len());
        for name in file_names {
            let name = name.as_ref();
            if seen.insert(name) {
                names.push(name.to_string());
            } else {
                tracing::info!(file = name, "File selected more than once, loading it once");
            }
        }

        let paths = names
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<Vec<_>>>()?;

        self.config.validate()?;
        let offset = self.config.utc_offset()?;
        let (store, report) = RecordStore::load_with_offset(&paths, offset)?;

        let previous = self.current.load();
        let snapshot = Snapshot {
            generation: previous.generation + 1,
            selection_id: Some(selection_fingerprint(&names)),
            files: names,
            store,
            cache: AggregateCache::new(),
            config: self.config.clone(),
            load_report: Some(report.clone()),
        };

        tracing::info!(
            generation = snapshot.generation,
            files = ?snapshot.files,
            records = report.total_records,
            skipped_lines = report.skipped_lines,
            previous_records = previous.store.len(),
            "Selection replaced"
        );

        self.current.store(Arc::new(snapshot));
        Ok(report)
    }

    /// Map a user-supplied name to a file inside the data directory.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            return Err(Error::Input("empty file name".to_string()));
        }

        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::Input(format!(
                "file name must be relative to the data directory: {}",
                name
            )));
        }

        let candidate = self.data_dir.join(relative);
        if !candidate.is_file() {
            return Err(Error::Input(format!(
                "file not found in {}: {}",
                self.data_dir.display(),
                name
            )));
        }

        let root = self.data_dir.canonicalize().map_err(|e| {
            Error::Input(format!(
                "data directory {} is not accessible: {}",
                self.data_dir.display(),
                e
            ))
        })?;
        let resolved = candidate
            .canonicalize()
            .map_err(|e| Error::Input(format!("cannot resolve {}: {}", name, e)))?;
        if !resolved.starts_with(&root) {
            return Err(Error::Input(format!(
                "file resolves outside the data directory: {}",
                name
            )));
        }

        Ok(resolved)
    }

    /// Archive file names in the data directory, sorted.
    ///
    /// A missing data directory lists nothing.
    pub fn available_files(&self) -> Result<Vec<String>> {
        let root = glob::Pattern::escape(&self.data_dir.to_string_lossy());
        let mut names = Vec::new();

        for pattern in ARCHIVE_PATTERNS {
            let full_pattern = format!("{}/{}", root, pattern);
            let entries = glob::glob(&full_pattern)
                .map_err(|e| Error::Input(format!("invalid data directory pattern: {}", e)))?;

            for entry in entries.flatten() {
                if !entry.is_file() {
                    continue;
                }
                if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// The installed snapshot. Holding it pins that generation.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn state(&self) -> SelectionState {
        self.current.load().state()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    /// Files of the active selection; empty before the first select.
    pub fn current_files(&self) -> Vec<String> {
        self.current.load().files.clone()
    }

    pub fn selection_id(&self) -> Option<String> {
        self.current.load().selection_id.clone()
    }

    pub fn last_load_report(&self) -> Option<LoadReport> {
        self.current.load().load_report.clone()
    }

    /// Run one view against the installed snapshot.
    pub fn view(&self, key: &ViewKey) -> Arc<AggregateResult> {
        self.current.load().view(key)
    }

    pub fn report(&self) -> Report {
        self.current.load().report()
    }
}

/// Hex SHA-256 over the ordered file names.
fn selection_fingerprint(names: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
