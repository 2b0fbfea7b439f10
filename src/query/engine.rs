//! Two-path query resolution.
//!
//! The engine probes the source's precomputed-label fast path first and
//! falls back to streaming raw records through the analysis pipeline when
//! the source declines or fails. Both paths feed the same predicate,
//! ordering, and popularity code, so their observable semantics are
//! identical by construction.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::categorizer::{BuildCategorizer, CategorizedBuild};
use crate::data::record::RawBuildRecord;
use crate::data::registry::RulesRegistry;
use crate::parallel::{batch_count_for, batch_ranges, WorkerPool};
use crate::query::cache::CategorizationCache;
use crate::query::filter::{FilterError, QueryFilter};
use crate::query::popularity::PopularityStats;
use crate::query::source::{BuildSource, SourceError};

/// Which resolution strategy produced a query outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Store-held labels, filtered against stored columns.
    Fast,
    /// Raw records streamed through aggregate -> EHP -> categorize.
    Fallback,
}

/// Caller-supplied execution limits for one query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Wall-clock cutoff for the fallback scan. When reached, the scan
    /// stops between records and the outcome is flagged truncated.
    pub deadline: Option<Instant>,
    /// Cooperative cancellation signal, checked between records.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Worker threads for the parallel fallback scan.
    pub pool: WorkerPool,
}

/// An ordered result set plus its popularity aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub builds: Vec<CategorizedBuild>,
    pub popularity: PopularityStats,
    /// True when a deadline/cancellation cut the scan short; the result is
    /// a valid partial answer, not an error.
    pub truncated: bool,
    pub path: ResolutionPath,
}

#[derive(Debug)]
pub enum QueryError {
    /// Rejected before any scan begins; the only caller-visible failure.
    InvalidFilter(FilterError),
    /// Both resolution paths failed.
    Source(SourceError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter(err) => write!(f, "{err}"),
            Self::Source(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<FilterError> for QueryError {
    fn from(err: FilterError) -> Self {
        Self::InvalidFilter(err)
    }
}

/// Orchestrates the aggregator, EHP calculator, and categorizer over a
/// [BuildSource]. Holds no mutable state beyond the compute-once memo.
pub struct QueryEngine<S: BuildSource> {
    source: S,
    categorizer: BuildCategorizer,
    rule_version: String,
    cache: CategorizationCache,
}

impl<S: BuildSource> QueryEngine<S> {
    pub fn new(source: S, registry: Arc<RulesRegistry>) -> Self {
        let rule_version = registry.rule_version();
        Self {
            source,
            categorizer: BuildCategorizer::new(registry),
            rule_version,
            cache: CategorizationCache::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve a filter to an ordered result set and popularity aggregate.
    pub fn query(
        &self,
        filter: &QueryFilter,
        options: &QueryOptions,
    ) -> Result<QueryOutcome, QueryError> {
        filter.validate()?;

        match self.source.find_categorized(filter) {
            Ok(Some(builds)) => Ok(self.finish(builds, filter, false, ResolutionPath::Fast)),
            Ok(None) => self.query_fallback(filter, options),
            Err(err) => {
                // Fast-path trouble is an operational event, not a caller
                // failure; the streaming path answers instead.
                eprintln!("query: fast path unavailable ({err}); streaming raw records");
                self.query_fallback(filter, options)
            }
        }
    }

    /// Stream every raw record in scope through the pipeline and offer the
    /// labels back to the store. Returns the categorized builds and how
    /// many write-backs the source accepted.
    pub fn categorize_all(
        &self,
        league: Option<&str>,
        options: &QueryOptions,
    ) -> Result<(Vec<CategorizedBuild>, usize), QueryError> {
        let records = self
            .source
            .list_raw_records(league)
            .map_err(QueryError::Source)?;
        let (builds, _) = self.categorize_records(&records, options);

        let mut written = 0;
        for build in &builds {
            match self
                .source
                .update_labels(&build.record.key(), &build.labels, &build.ehp)
            {
                Ok(()) => written += 1,
                Err(SourceError::Unsupported) => break,
                Err(err) => {
                    eprintln!(
                        "categorize: write-back failed for '{}': {err}",
                        build.record.name
                    );
                }
            }
        }
        Ok((builds, written))
    }

    fn query_fallback(
        &self,
        filter: &QueryFilter,
        options: &QueryOptions,
    ) -> Result<QueryOutcome, QueryError> {
        let records = self
            .source
            .list_raw_records(filter.league.as_deref())
            .map_err(QueryError::Source)?;

        let (categorized, truncated) = self.categorize_records(&records, options);
        let matching: Vec<CategorizedBuild> = categorized
            .into_iter()
            .filter(|build| filter.matches(build))
            .collect();

        Ok(self.finish(matching, filter, truncated, ResolutionPath::Fallback))
    }

    /// Parallel per-record categorization with cooperative cancellation.
    /// Records are scanned in batches; each batch fans out across the
    /// worker pool and the stop signal is checked at batch boundaries.
    /// Already-processed batches are kept and the caller learns the scan
    /// was cut short.
    fn categorize_records(
        &self,
        records: &[RawBuildRecord],
        options: &QueryOptions,
    ) -> (Vec<CategorizedBuild>, bool) {
        const TARGET_BATCH_SIZE: usize = 64;

        let mut builds = Vec::with_capacity(records.len());
        let mut truncated = false;
        options.pool.install(|| {
            for (start, end) in
                batch_ranges(records.len(), batch_count_for(records.len(), TARGET_BATCH_SIZE))
            {
                if should_stop(options) {
                    truncated = true;
                    break;
                }
                builds.par_extend(records[start..end].par_iter().map(|record| {
                    self.cache.get_or_compute(&record.key(), &self.rule_version, || {
                        self.categorizer.categorize_record(record)
                    })
                }));
            }
        });
        (builds, truncated)
    }

    /// Shared tail of both paths: predicate re-check, deterministic
    /// ordering, popularity over the full filtered set, then limit.
    fn finish(
        &self,
        builds: Vec<CategorizedBuild>,
        filter: &QueryFilter,
        truncated: bool,
        path: ResolutionPath,
    ) -> QueryOutcome {
        let mut matching: Vec<CategorizedBuild> =
            builds.into_iter().filter(|b| filter.matches(b)).collect();

        matching.sort_by(|left, right| {
            filter
                .sort_ehp(right)
                .total_cmp(&filter.sort_ehp(left))
                .then_with(|| right.record.level.cmp(&left.record.level))
                .then_with(|| left.record.name.cmp(&right.record.name))
        });

        // Popularity covers the whole filtered set; limit only trims what
        // the caller pages through.
        let popularity = PopularityStats::from_builds(&matching);
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }

        QueryOutcome {
            builds: matching,
            popularity,
            truncated,
            path,
        }
    }
}

fn should_stop(options: &QueryOptions) -> bool {
    if let Some(cancel) = &options.cancel {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
    }
    if let Some(deadline) = options.deadline {
        if Instant::now() >= deadline {
            return true;
        }
    }
    false
}
