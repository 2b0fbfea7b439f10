//! ZANA: build analysis engine for ladder character snapshots.
//!
//! Turns raw per-character build records (stats, equipped uniques, active
//! skills) into categorized, queryable summaries: a damage-type label, a
//! defense-style rating, a cost tier, a skill-delivery mechanism, and a
//! derived effective-health-pool (EHP) metric per damage type.
//!
//! The pipeline is strictly one-directional:
//! raw record -> [analysis::aggregator] -> [analysis::ehp] ->
//! [analysis::categorizer] -> [query] result.

pub mod analysis;
pub mod cli;
pub mod data;
pub mod parallel;
pub mod query;
