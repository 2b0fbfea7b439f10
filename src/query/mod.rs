pub mod cache;
pub mod engine;
pub mod export_csv;
pub mod filter;
pub mod popularity;
pub mod source;

pub use cache::CategorizationCache;
pub use engine::{QueryEngine, QueryError, QueryOptions, QueryOutcome, ResolutionPath};
pub use export_csv::{write_builds_csv, ExportError};
pub use filter::{FilterError, QueryFilter};
pub use popularity::{PopularityShift, PopularityStats};
pub use source::{BuildSource, InMemorySource, SnapshotFileSource, SourceError};
