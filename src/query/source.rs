//! The narrow read interface to the persistence collaborator.
//!
//! A source may hold precomputed labels (fast path), raw records only
//! (fallback path), or both. The engine probes the fast path first and
//! streams raw records through the analysis pipeline when the source
//! declines. Label write-back is optional; sources that cannot persist
//! labels report [SourceError::Unsupported].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::analysis::categorizer::{CategorizedBuild, CategoryLabels};
use crate::analysis::ehp::EhpResult;
use crate::data::record::{load_snapshot, RawBuildRecord, RecordKey};
use crate::query::filter::QueryFilter;

#[derive(Debug)]
pub enum SourceError {
    /// The source cannot be reached; the engine falls back, never the caller.
    Unavailable(String),
    /// This source does not implement the requested capability.
    Unsupported,
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(detail) => write!(f, "data source unavailable: {detail}"),
            Self::Unsupported => write!(f, "data source does not support this operation"),
            Self::Io(err) => write!(f, "data source I/O failure: {err}"),
            Self::Parse(err) => write!(f, "data source returned malformed data: {err}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Read access to stored builds, with an optional precomputed-label fast
/// path and optional label write-back.
pub trait BuildSource: Send + Sync {
    /// Fast path: return builds with stored labels, pre-filtered as well as
    /// the store can manage. `Ok(None)` means this source holds no
    /// categorized data for the requested scope and the caller must fall
    /// back. The engine re-applies the shared predicate to whatever is
    /// returned, so a source may over-return but must never fabricate.
    fn find_categorized(
        &self,
        filter: &QueryFilter,
    ) -> Result<Option<Vec<CategorizedBuild>>, SourceError>;

    /// Fallback source: every raw record in scope, unfiltered.
    fn list_raw_records(&self, league: Option<&str>) -> Result<Vec<RawBuildRecord>, SourceError>;

    /// Persist derived labels for a record so later queries can take the
    /// fast path. Optional; used by the batch categorization job.
    fn update_labels(
        &self,
        _key: &RecordKey,
        _labels: &CategoryLabels,
        _ehp: &EhpResult,
    ) -> Result<(), SourceError> {
        Err(SourceError::Unsupported)
    }
}

/// In-memory source over raw records with an optional precomputed-label
/// side table. Backs tests and acts as the reference implementation of the
/// fast/fallback contract.
#[derive(Debug, Default)]
pub struct InMemorySource {
    records: Vec<RawBuildRecord>,
    categorized: Mutex<HashMap<RecordKey, CategorizedBuild>>,
    fast_path_enabled: bool,
}

impl InMemorySource {
    /// Raw-only source: every query takes the fallback path.
    pub fn raw_only(records: Vec<RawBuildRecord>) -> Self {
        Self {
            records,
            categorized: Mutex::new(HashMap::new()),
            fast_path_enabled: false,
        }
    }

    /// Source with stored labels: queries take the fast path.
    pub fn with_categorized(records: Vec<RawBuildRecord>, builds: Vec<CategorizedBuild>) -> Self {
        let categorized = builds
            .into_iter()
            .map(|build| (build.record.key(), build))
            .collect();
        Self {
            records,
            categorized: Mutex::new(categorized),
            fast_path_enabled: true,
        }
    }

    pub fn stored_labels(&self, key: &RecordKey) -> Option<CategoryLabels> {
        self.categorized
            .lock()
            .ok()
            .and_then(|map| map.get(key).map(|build| build.labels))
    }
}

impl BuildSource for InMemorySource {
    fn find_categorized(
        &self,
        filter: &QueryFilter,
    ) -> Result<Option<Vec<CategorizedBuild>>, SourceError> {
        if !self.fast_path_enabled {
            return Ok(None);
        }
        let map = self
            .categorized
            .lock()
            .map_err(|_| SourceError::Unavailable("label table poisoned".to_string()))?;
        // An unprimed label table is "no categorized data yet", not "no
        // matches": decline so the engine streams the raw records instead.
        if map.is_empty() && !self.records.is_empty() {
            return Ok(None);
        }
        // Store-side filtering mirrors an indexed column scan; the engine
        // re-checks with the same predicate anyway.
        Ok(Some(
            map.values().filter(|b| filter.matches(b)).cloned().collect(),
        ))
    }

    fn list_raw_records(&self, league: Option<&str>) -> Result<Vec<RawBuildRecord>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|record| league.map_or(true, |l| record.league == l))
            .cloned()
            .collect())
    }

    fn update_labels(
        &self,
        key: &RecordKey,
        labels: &CategoryLabels,
        ehp: &EhpResult,
    ) -> Result<(), SourceError> {
        let record = self
            .records
            .iter()
            .find(|record| &record.key() == key)
            .ok_or_else(|| SourceError::Unavailable(format!("no record for {}", key.name)))?;
        let mut map = self
            .categorized
            .lock()
            .map_err(|_| SourceError::Unavailable("label table poisoned".to_string()))?;
        map.insert(
            key.clone(),
            CategorizedBuild {
                record: record.clone(),
                ehp: ehp.clone(),
                labels: *labels,
            },
        );
        Ok(())
    }
}

/// Raw-record source reading snapshot JSON files from disk; what the CLI
/// runs against. Never offers the fast path.
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BuildSource for SnapshotFileSource {
    fn find_categorized(
        &self,
        _filter: &QueryFilter,
    ) -> Result<Option<Vec<CategorizedBuild>>, SourceError> {
        Ok(None)
    }

    fn list_raw_records(&self, league: Option<&str>) -> Result<Vec<RawBuildRecord>, SourceError> {
        let snapshot = load_snapshot(&self.path).map_err(|err| match err {
            crate::data::record::SnapshotError::Read(io) => SourceError::Io(io),
            crate::data::record::SnapshotError::Parse(parse) => SourceError::Parse(parse),
        })?;
        Ok(snapshot
            .records
            .into_iter()
            .filter(|record| league.map_or(true, |l| record.league == l))
            .collect())
    }
}
